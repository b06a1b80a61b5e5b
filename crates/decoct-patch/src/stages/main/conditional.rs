use decoct_syntax::SyntaxKind::{self, *};
use decoct_syntax::ast::IfExpr;
use decoct_syntax::{SyntaxNode, TextRange, Token};

use super::{Node, build, build_child, closing_brace, unsupported};
use crate::context::PatchContext;
use crate::error::PatchError;
use crate::navigate::index_of_token_between;
use crate::patcher::{NodeInfo, NodePatch, Patcher, present};
use crate::scope::Scopes;

/// `if` as a statement, or as a ternary where a value is needed.
#[derive(Debug)]
pub(crate) struct Conditional {
    condition: Box<Patcher<Node>>,
    consequent: Box<Patcher<Node>>,
    /// A block, or the next conditional of an `else if` chain.
    alternate: Option<Box<Patcher<Node>>>,
}

impl Conditional {
    pub(super) fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        let view = IfExpr::cast(node).ok_or_else(|| unsupported(node, "expected a conditional"))?;
        if view.is_postfix {
            return Err(unsupported(node, "postfix conditional was not normalized"));
        }
        let condition =
            view.condition.ok_or_else(|| unsupported(node, "conditional has no condition"))?;
        let consequent =
            view.consequent.ok_or_else(|| unsupported(node, "conditional has no body"))?;

        Ok(Self {
            condition: Box::new(build(condition, scopes)?),
            consequent: Box::new(build(consequent, scopes)?),
            alternate: build_child(view.alternate, scopes)?,
        })
    }

    /// Makes every branch return its last statement.
    pub(super) fn return_from_branches(&mut self) {
        for branch in [Some(&mut self.consequent), self.alternate.as_mut()].into_iter().flatten() {
            match &mut branch.kind {
                Node::Block(block) => block.implicit_return = true,
                Node::Conditional(conditional) => conditional.return_from_branches(),
                _ => {}
            }
        }
    }

    fn patch_as_ternary(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        let condition = self.condition.info.outer;
        let consequent = self.consequent.info.outer;

        cx.editor.remove(TextRange::new(info.content.start(), condition.start()))?;
        cx.editor.overwrite(TextRange::new(condition.end(), consequent.start()), " ? ")?;
        if let Some(alternate) = &self.alternate {
            let range = TextRange::new(consequent.end(), alternate.info.outer.start());
            cx.editor.overwrite(range, " : ")?;
        }

        for child in self.children_mut() {
            child.patch(cx)?;
        }
        if self.alternate.is_none() {
            cx.editor.insert(consequent.end(), " : undefined")?;
        }
        Ok(())
    }
}

impl NodePatch<Node> for Conditional {
    fn initialize(
        &mut self,
        info: &NodeInfo,
        _cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        if info.requires_expression {
            for child in self.children_mut() {
                child.set_requires_expression();
            }
        } else {
            self.condition.set_requires_expression();
        }
        Ok(())
    }

    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        present([Some(&mut self.condition), Some(&mut self.consequent), self.alternate.as_mut()])
    }

    fn can_patch_as_expression(&self, _info: &NodeInfo) -> bool {
        self.consequent.can_patch_as_expression()
            && self.alternate.as_ref().is_none_or(|alternate| alternate.can_patch_as_expression())
    }

    fn patch_as_expression(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        self.patch_as_ternary(info, cx)
    }

    fn patch_as_statement(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        let condition = self.condition.info;
        let consequent = self.consequent.info;

        // A statement takes no parentheses of its own.
        cx.editor.remove(TextRange::new(info.outer.start(), info.content.start()))?;
        cx.editor.remove(TextRange::new(info.content.end(), info.outer.end()))?;

        self.condition.patch(cx)?;
        self.condition.surround_in_parens(cx)?;

        match keyword_between(cx, &condition, &consequent, THEN_KW) {
            Some(then) => {
                let range = TextRange::new(condition.outer.end(), then.range.end());
                cx.editor.overwrite(range, " {")?;
            }
            None => cx.editor.insert(condition.outer.end(), " {")?,
        }
        self.consequent.patch(cx)?;

        let close = closing_brace(info, &consequent, cx)?;
        let Some(alternate) = &mut self.alternate else {
            cx.editor.insert(consequent.outer.end(), close)?;
            return Ok(());
        };

        let alternate_info = alternate.info;
        let else_token = keyword_between(cx, &consequent, &alternate_info, ELSE_KW).ok_or_else(|| {
            PatchError::Patch {
                message: "cannot find 'else' token in conditional".to_owned(),
                range: info.content,
            }
        })?;
        let range = TextRange::new(consequent.outer.end(), else_token.range.end());
        cx.editor.overwrite(range, format!("{close} else"))?;

        if matches!(alternate.kind, Node::Conditional(_)) {
            return alternate.patch(cx);
        }

        match keyword_between(cx, &consequent, &alternate_info, THEN_KW) {
            Some(then) => {
                let range = TextRange::new(else_token.range.end(), then.range.end());
                cx.editor.overwrite(range, " {")?;
            }
            None => cx.editor.insert(else_token.range.end(), " {")?,
        }
        alternate.patch(cx)?;
        let close = closing_brace(info, &alternate_info, cx)?;
        cx.editor.insert(alternate_info.outer.end(), close)?;
        Ok(())
    }
}

fn keyword_between(
    cx: &PatchContext<'_>,
    left: &NodeInfo,
    right: &NodeInfo,
    kind: SyntaxKind,
) -> Option<Token> {
    index_of_token_between(cx.tree(), left, right, |token| token.kind == kind)
        .and_then(|index| cx.token(index))
}
