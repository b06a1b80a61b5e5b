use decoct_syntax::SyntaxNode;

use super::{Node, build_child};
use crate::context::PatchContext;
use crate::error::PatchError;
use crate::patcher::{NodeInfo, NodePatch, Patcher, present};
use crate::scope::Scopes;

/// `return` with an optional value. Makes no edits of its own.
#[derive(Debug)]
pub(crate) struct Return {
    value: Option<Box<Patcher<Node>>>,
}

impl Return {
    pub(super) fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        Ok(Self { value: build_child(node.children().next(), scopes)? })
    }
}

impl NodePatch<Node> for Return {
    fn initialize(
        &mut self,
        _info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        cx.mark_explicit_return();
        if let Some(value) = &mut self.value {
            value.set_requires_expression();
        }
        Ok(())
    }

    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        present([self.value.as_mut()])
    }

    fn can_patch_as_expression(&self, _info: &NodeInfo) -> bool {
        false
    }

    fn patch_as_expression(
        &mut self,
        info: &NodeInfo,
        _cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        Err(PatchError::ContractViolation {
            message: "return statement cannot be used as an expression".to_owned(),
            range: info.content,
        })
    }

    fn patch_as_statement(
        &mut self,
        _info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        match &mut self.value {
            Some(value) => value.patch(cx),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use decoct_syntax::SyntaxKind::*;

    use super::super::build;
    use crate::context::PatchContext;
    use crate::error::{PatchError, Stage};
    use crate::patcher::PatchState;

    #[test]
    fn refuses_expression_position() {
        let parse = decoct_parse::parse("f = ->\n  return 1\n");
        let tree = parse.tree();
        let mut cx = PatchContext::new(tree, Stage::Main);
        let node = tree.root().descendants().find(|node| node.kind() == RETURN_STMT).unwrap();

        let mut patcher = build(node, &cx.scopes).unwrap();
        assert!(!patcher.can_patch_as_expression());
        patcher.initialize(&mut cx).unwrap();

        let error = patcher.patch_as_expression(&mut cx).unwrap_err();
        assert!(matches!(error, PatchError::ContractViolation { .. }), "{error:?}");
        assert_eq!(error.to_string(), "return statement cannot be used as an expression");
        assert_eq!(patcher.state(), PatchState::Initialized);

        patcher.patch_as_statement(&mut cx).unwrap();
        assert_eq!(patcher.state(), PatchState::Patched);
        assert!(matches!(
            patcher.patch_as_statement(&mut cx),
            Err(PatchError::ContractViolation { .. })
        ));
    }
}
