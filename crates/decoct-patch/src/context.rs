use decoct_syntax::{NodeId, SyntaxNode, SyntaxTree, TextRange, TextSize, Token, TokenIndex};
use line_index::LineIndex;
use rustc_hash::FxHashSet;

use crate::editor::Editor;
use crate::error::{PatchError, Stage};
use crate::scope::{Scope, Scopes, count_usages};

#[derive(Debug, Default)]
struct FunctionFrame {
    explicit_return: bool,
}

/// Names to declare in front of one statement.
#[derive(Debug)]
struct DeclarationFrame {
    names: Vec<String>,
    /// The statement sits directly in a program or function body.
    scope_body: bool,
}

/// Shared state of one stage run: the tree being patched, the edits made
/// so far and the scopes names are claimed in.
pub struct PatchContext<'s> {
    tree: &'s SyntaxTree,
    pub editor: Editor<'s>,
    pub scopes: Scopes,
    stage: Stage,
    line_index: LineIndex,
    functions: Vec<FunctionFrame>,
    declarations: Vec<DeclarationFrame>,
    /// Start offsets of comments already moved by a closing brace.
    moved_comments: FxHashSet<TextSize>,
}

impl<'s> PatchContext<'s> {
    pub fn new(tree: &'s SyntaxTree, stage: Stage) -> Self {
        let text = tree.text();
        Self {
            tree,
            editor: Editor::new(text),
            scopes: Scopes::build(tree),
            stage,
            line_index: LineIndex::new(text),
            functions: Vec::new(),
            declarations: Vec::new(),
            moved_comments: FxHashSet::default(),
        }
    }

    pub fn tree(&self) -> &'s SyntaxTree {
        self.tree
    }

    pub fn node(&self, id: NodeId) -> SyntaxNode<'s> {
        self.tree.node(id)
    }

    pub fn token(&self, index: TokenIndex) -> Option<Token> {
        self.tree.token(index).copied()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Separator after a statement added in front of another one on the
    /// same line.
    pub fn inline_separator(&self) -> &'static str {
        match self.stage {
            Stage::Normalize => "; ",
            Stage::Main => " ",
        }
    }

    /// Original text, without edits.
    pub fn slice(&self, range: TextRange) -> &'s str {
        self.tree.text().get(range.start().into()..range.end().into()).unwrap_or_default()
    }

    pub fn render_range(&self, range: TextRange) -> Result<String, PatchError> {
        Ok(self.editor.render_range(range)?)
    }

    fn line_start(&self, offset: TextSize) -> TextSize {
        let col = self.line_index.line_col(offset).col;
        offset - TextSize::from(col)
    }

    /// The whitespace before `offset` if nothing else precedes it on its
    /// line.
    pub fn line_indent(&self, offset: TextSize) -> Option<&'s str> {
        let prefix = self.slice(TextRange::new(self.line_start(offset), offset));
        prefix.chars().all(|c| c == ' ' || c == '\t').then_some(prefix)
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn indent_of_line(&self, offset: TextSize) -> &'s str {
        let rest = &self.tree.text()[usize::from(self.line_start(offset))..];
        let len = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        &rest[..len]
    }

    /// Claims a fresh name for a temporary introduced by the construct at
    /// `range`.
    pub fn claim_free_binding(
        &mut self,
        scope: Scope,
        hint: &str,
        range: TextRange,
    ) -> Result<String, PatchError> {
        self.scopes
            .claim_free_binding(scope, hint)
            .map_err(|error| PatchError::Binding { error, range })
    }

    pub fn count_usages(&self, node: NodeId, name: &str) -> usize {
        count_usages(self.node(node), name)
    }

    pub fn enter_function(&mut self) {
        self.functions.push(FunctionFrame::default());
    }

    pub fn mark_explicit_return(&mut self) {
        if let Some(frame) = self.functions.last_mut() {
            frame.explicit_return = true;
        }
    }

    /// Leaves the innermost function and tells whether it returns
    /// explicitly anywhere.
    pub fn exit_function(&mut self) -> bool {
        self.functions.pop().is_some_and(|frame| frame.explicit_return)
    }

    pub fn begin_declarations(&mut self, scope_body: bool) {
        self.declarations.push(DeclarationFrame { names: Vec::new(), scope_body });
    }

    /// Records a name that needs a declaration before the current statement,
    /// or with `hoist`, before the statement of the enclosing program or
    /// function body that contains it.
    pub fn declare(&mut self, name: &str, hoist: bool) {
        let hoisted =
            hoist.then(|| self.declarations.iter().rposition(|frame| frame.scope_body)).flatten();
        let frame = match hoisted {
            Some(index) => self.declarations.get_mut(index),
            None => self.declarations.last_mut(),
        };
        if let Some(frame) = frame
            && !frame.names.iter().any(|declared| declared == name)
        {
            frame.names.push(name.to_owned());
        }
    }

    pub fn end_declarations(&mut self) -> Vec<String> {
        self.declarations.pop().map(|frame| frame.names).unwrap_or_default()
    }

    /// Marks the comment starting at `start` as moved. Returns false if it
    /// already was.
    pub fn move_comment(&mut self, start: TextSize) -> bool {
        self.moved_comments.insert(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_bindings_point_at_the_construct() {
        let parse = decoct_parse::parse("for @a in list then f()\n");
        let mut cx = PatchContext::new(parse.tree(), Stage::Normalize);
        let root = cx.scopes.root();
        cx.scopes.exhaust(root, "value");

        let range = TextRange::new(TextSize::new(4), TextSize::new(6));
        let error = cx.claim_free_binding(root, "value", range).unwrap_err();
        assert!(matches!(error, PatchError::Binding { .. }), "{error:?}");
        assert_eq!(error.to_string(), "cannot find a free binding for 'value'");
        assert_eq!(error.range(), range);
        assert_eq!(error.to_diagnostic().label(), "needs a temporary name");
    }

    #[test]
    fn hoisted_declarations_go_to_the_scope_body_statement() {
        let parse = decoct_parse::parse("a\n");
        let mut cx = PatchContext::new(parse.tree(), Stage::Main);

        cx.begin_declarations(true);
        cx.begin_declarations(false);
        cx.declare("inner", false);
        cx.declare("outer", true);
        cx.declare("outer", true);
        assert_eq!(cx.end_declarations(), ["inner"]);
        assert_eq!(cx.end_declarations(), ["outer"]);
        assert!(cx.end_declarations().is_empty());
    }
}
