use decoct_syntax::SyntaxKind::{self, *};
use decoct_syntax::{SyntaxNode, TextRange};

use super::{Node, build};
use crate::context::PatchContext;
use crate::error::PatchError;
use crate::patcher::{NodeInfo, NodePatch, Patcher};
use crate::scope::Scopes;

/// Constructs whose children are all expressions and whose own tokens at
/// most change spelling: operators, calls, member access, literals.
#[derive(Debug)]
pub(crate) struct Expression {
    children: Vec<Patcher<Node>>,
    rewrites: Vec<(TextRange, &'static str)>,
}

impl Expression {
    pub(super) fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        let children =
            node.children().map(|child| build(child, scopes)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { children, rewrites: rewrites(node) })
    }
}

fn operator(kind: SyntaxKind, text: &str) -> Option<&'static str> {
    let replacement = match kind {
        AND_KW => "&&",
        OR_KW => "||",
        IS_KW => "===",
        ISNT_KW => "!==",
        OPERATOR if text == "==" => "===",
        OPERATOR if text == "!=" => "!==",
        _ => return None,
    };
    Some(replacement)
}

fn rewrites(node: SyntaxNode<'_>) -> Vec<(TextRange, &'static str)> {
    let text = node.tree().text();
    let this = |replacement| node.child_token(AT).map(|(_, at)| (at.range, replacement));

    match node.kind() {
        BINARY_EXPR => node
            .child_tokens()
            .filter_map(|(_, token)| {
                let replacement = operator(token.kind, &text[token.range])?;
                Some((token.range, replacement))
            })
            .collect(),
        // `not a` becomes `!a`, so the space goes too.
        PREFIX_EXPR => {
            let Some((_, not)) = node.child_token(NOT_KW) else {
                return Vec::new();
            };
            let end = node
                .children()
                .next()
                .map_or(not.range.end(), |operand| operand.range().start());
            vec![(TextRange::new(not.range.start(), end), "!")]
        }
        THIS_MEMBER => this("this.").into_iter().collect(),
        THIS => this("this").into_iter().collect(),
        _ => Vec::new(),
    }
}

impl NodePatch<Node> for Expression {
    fn initialize(
        &mut self,
        _info: &NodeInfo,
        _cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        for child in &mut self.children {
            child.set_requires_expression();
        }
        Ok(())
    }

    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        self.children.iter_mut().collect()
    }

    fn patch_as_expression(
        &mut self,
        _info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        for &(range, replacement) in &self.rewrites {
            cx.editor.overwrite(range, replacement)?;
        }
        for child in &mut self.children {
            child.patch(cx)?;
        }
        Ok(())
    }
}
