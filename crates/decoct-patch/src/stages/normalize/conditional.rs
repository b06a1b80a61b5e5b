use decoct_syntax::SyntaxKind::*;
use decoct_syntax::ast::IfExpr;
use decoct_syntax::{SyntaxNode, TextRange};

use super::{Node, build, missing};
use crate::context::PatchContext;
use crate::error::PatchError;
use crate::navigate::{index_of_token_between, postfix_expression_requires_parens};
use crate::patcher::{NodeInfo, NodePatch, Patcher};
use crate::scope::Scopes;

/// `a if b`, rewritten to `if b then a`.
#[derive(Debug)]
pub(crate) struct PostfixConditional {
    condition: Box<Patcher<Node>>,
    body: Box<Patcher<Node>>,
}

impl PostfixConditional {
    pub(super) fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        let view = IfExpr::cast(node).ok_or_else(|| missing(node, "condition"))?;
        let condition = view.condition.ok_or_else(|| missing(node, "condition"))?;
        let body = view.consequent.ok_or_else(|| missing(node, "body"))?;

        Ok(Self {
            condition: Box::new(build(condition, scopes)?),
            body: Box::new(build(body, scopes)?),
        })
    }
}

impl NodePatch<Node> for PostfixConditional {
    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        vec![&mut *self.condition, &mut *self.body]
    }

    fn patch_as_expression(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        self.condition.patch(cx)?;
        if postfix_expression_requires_parens(cx.slice(self.condition.info.content)) {
            self.condition.surround_in_parens(cx)?;
        }

        let if_token =
            index_of_token_between(cx.tree(), &self.body.info, &self.condition.info, |token| {
                token.kind == IF_KW
            })
            .and_then(|index| cx.token(index))
            .ok_or_else(|| PatchError::Patch {
                message: "cannot find 'if' token in conditional".to_owned(),
                range: info.content,
            })?;

        let body = self.body.info.outer;
        let header = cx.render_range(TextRange::new(if_token.range.start(), info.content.end()))?;
        cx.editor.remove(TextRange::new(body.end(), info.content.end()))?;
        cx.editor.insert(body.start(), format!("{header} then "))?;

        self.body.patch(cx)
    }
}
