use decoct_syntax::SyntaxKind::*;
use decoct_syntax::SyntaxNode;

use super::{Node, build};
use crate::context::PatchContext;
use crate::error::PatchError;
use crate::patcher::{NodeInfo, NodePatch, Patcher};
use crate::scope::{Scopes, is_scope_body};

/// A sequence of statements. Function bodies return their last statement.
#[derive(Debug)]
pub(crate) struct Block {
    statements: Vec<Patcher<Node>>,
    /// Body of the program or of a function, where hoisted declarations go.
    scope_body: bool,
    pub(super) implicit_return: bool,
    returns_last: bool,
}

impl Block {
    pub(super) fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        let statements =
            node.children().map(|child| build(child, scopes)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            statements,
            scope_body: is_scope_body(node),
            implicit_return: false,
            returns_last: false,
        })
    }

    pub(super) fn first_statement(&self) -> Option<&Patcher<Node>> {
        self.statements.first()
    }

    /// Prepares the last statement to be returned. Returns whether `return`
    /// still has to go in front of it.
    fn return_last(&mut self) -> bool {
        let Some(last) = self.statements.last_mut() else { return false };
        match &mut last.kind {
            Node::Return(_) | Node::For(_) => false,
            Node::Conditional(conditional) if !last.info.requires_expression => {
                conditional.return_from_branches();
                false
            }
            _ => {
                last.info.requires_expression = true;
                true
            }
        }
    }
}

/// `(if a then b)` on its own reads as a value, so it becomes a ternary.
fn is_parenthesized_value(statement: &Patcher<Node>) -> bool {
    statement.info.is_parenthesized()
        && matches!(statement.kind, Node::Conditional(_))
        && statement.can_patch_as_expression()
}

fn needs_semicolon(statement: &Patcher<Node>, cx: &PatchContext<'_>) -> bool {
    if !statement.info.requires_expression && statement.kind.is_block_statement() {
        return false;
    }
    let next = statement.info.outer_tokens.and_then(|(_, last)| cx.token(last.next()));
    !next.is_some_and(|token| token.kind == SEMICOLON)
}

impl NodePatch<Node> for Block {
    fn initialize(
        &mut self,
        info: &NodeInfo,
        _cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        if info.requires_expression {
            for statement in &mut self.statements {
                statement.set_requires_expression();
            }
            return Ok(());
        }

        for statement in &mut self.statements {
            if is_parenthesized_value(statement) {
                statement.set_requires_expression();
            }
        }
        self.returns_last = self.implicit_return && self.return_last();
        Ok(())
    }

    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        self.statements.iter_mut().collect()
    }

    fn can_patch_as_expression(&self, _info: &NodeInfo) -> bool {
        matches!(self.statements.as_slice(), [statement] if statement.can_patch_as_expression())
    }

    fn patch_as_expression(
        &mut self,
        _info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        for statement in &mut self.statements {
            statement.patch(cx)?;
        }
        Ok(())
    }

    fn patch_as_statement(
        &mut self,
        _info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        let count = self.statements.len();
        for (i, statement) in self.statements.iter_mut().enumerate() {
            cx.begin_declarations(self.scope_body);
            statement.patch(cx)?;
            let declared = cx.end_declarations();

            if self.returns_last && i + 1 == count {
                cx.editor.prepend(statement.info.outer.start(), "return ")?;
            }
            if needs_semicolon(statement, cx) {
                cx.editor.insert(statement.info.outer.end(), ";")?;
            }
            if !declared.is_empty() {
                statement.prepend_line_before(cx, &format!("let {};", declared.join(", ")))?;
            }
        }
        Ok(())
    }
}
