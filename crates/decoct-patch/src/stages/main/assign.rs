use decoct_syntax::SyntaxKind::*;
use decoct_syntax::SyntaxNode;
use decoct_syntax::ast;

use super::{Node, build, unsupported};
use crate::context::PatchContext;
use crate::error::PatchError;
use crate::patcher::{NodeInfo, NodePatch, Patcher};
use crate::scope::Scopes;

/// A name introduced by an assignment.
#[derive(Debug)]
struct Declaration {
    name: String,
    /// Used outside the block the assignment is in.
    escapes: bool,
}

/// `a = b` and `a ?= b`.
#[derive(Debug)]
pub(crate) struct Assign {
    lhs: Box<Patcher<Node>>,
    rhs: Box<Patcher<Node>>,
    existence: bool,
    declares: Vec<Declaration>,
    /// Every name in the target is new, so `let` can go inline.
    declares_all: bool,
}

impl Assign {
    pub(super) fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        let view =
            ast::Assign::cast(node).ok_or_else(|| unsupported(node, "expected an assignment"))?;
        let lhs = view.lhs.ok_or_else(|| unsupported(node, "assignment has no target"))?;
        let rhs = view.rhs.ok_or_else(|| unsupported(node, "assignment has no value"))?;

        let names = match lhs.kind() {
            IDENT => vec![lhs],
            ARRAY => lhs.children().collect(),
            _ => Vec::new(),
        };
        let declares_all = !names.is_empty()
            && names.iter().all(|name| name.kind() == IDENT && scopes.is_declaration(*name));
        let declares = names
            .iter()
            .filter(|name| name.kind() == IDENT && scopes.is_declaration(**name))
            .map(|name| Declaration {
                name: name.text().to_owned(),
                escapes: !scopes.is_block_local(*name),
            })
            .collect();

        Ok(Self {
            lhs: Box::new(build(lhs, scopes)?),
            rhs: Box::new(build(rhs, scopes)?),
            existence: view.is_existence,
            declares,
            declares_all,
        })
    }

    pub(super) fn is_existence(&self) -> bool {
        self.existence
    }

    /// Whether `let` can go in front of the assignment itself.
    fn declares_inline(&self) -> bool {
        self.declares_all && self.declares.iter().all(|declaration| !declaration.escapes)
    }

    fn declare_all(&self, cx: &mut PatchContext<'_>) {
        for declaration in &self.declares {
            cx.declare(&declaration.name, declaration.escapes);
        }
    }

    fn patch_operands(
        &mut self,
        cx: &mut PatchContext<'_>,
    ) -> Result<(String, String), PatchError> {
        let lhs = self.lhs.patch_and_render(cx)?;
        let rhs = self.rhs.patch_and_render(cx)?;
        Ok((lhs, rhs))
    }
}

impl NodePatch<Node> for Assign {
    fn initialize(
        &mut self,
        _info: &NodeInfo,
        _cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        self.lhs.set_requires_expression();
        self.rhs.set_requires_expression();
        Ok(())
    }

    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        vec![&mut *self.lhs, &mut *self.rhs]
    }

    fn patch_as_expression(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        self.declare_all(cx);
        if !self.existence {
            self.lhs.patch(cx)?;
            return self.rhs.patch(cx);
        }

        let (lhs, rhs) = self.patch_operands(cx)?;
        cx.editor.overwrite(info.content, format!("{lhs} != null ? {lhs} : ({lhs} = {rhs})"))?;
        Ok(())
    }

    fn patch_as_statement(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        if self.existence {
            self.declare_all(cx);
            let (lhs, rhs) = self.patch_operands(cx)?;
            cx.editor.overwrite(info.content, format!("if ({lhs} == null) {{ {lhs} = {rhs}; }}"))?;
            return Ok(());
        }

        self.lhs.patch(cx)?;
        self.rhs.patch(cx)?;
        if self.declares_inline() {
            cx.editor.insert(info.outer.start(), "let ")?;
        } else {
            self.declare_all(cx);
        }
        Ok(())
    }
}
