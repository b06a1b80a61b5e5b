use decoct_syntax::{SyntaxNode, SyntaxTree};

use crate::context::PatchContext;
use crate::error::{PatchError, Stage};
use crate::patcher::{NodePatch, Patcher};
use crate::scope::Scopes;

pub(crate) mod main;
pub(crate) mod normalize;

/// Builds the patcher tree for `tree`, runs it and renders the result.
pub(crate) fn run<K: NodePatch<K>>(
    tree: &SyntaxTree,
    stage: Stage,
    build: impl FnOnce(SyntaxNode<'_>, &Scopes) -> Result<Patcher<K>, PatchError>,
) -> Result<String, PatchError> {
    let mut cx = PatchContext::new(tree, stage);

    if cx.stage() == Stage::Main {
        main::rewrite_comments(&mut cx)?;
    }

    let mut root = build(tree.root(), &cx.scopes)?;
    root.initialize(&mut cx)?;
    root.patch(&mut cx)?;

    tracing::debug!(edits = cx.editor.edit_count(), "rendering");
    Ok(cx.editor.render()?)
}
