use decoct_syntax::SyntaxKind::*;
use decoct_syntax::ast::{self, name_of};
use decoct_syntax::{SyntaxNode, TextRange, Token};

use super::{Node, build_child, closing_brace, is_indented, prepend_body_lines, unsupported};
use crate::context::PatchContext;
use crate::error::PatchError;
use crate::patcher::{NodeInfo, NodePatch, Patcher};
use crate::scope::Scopes;

#[derive(Debug)]
struct Param {
    /// The name, or `@name` for a member parameter.
    binding: TextRange,
    name: String,
    member: bool,
    /// Text from the end of the binding to the end of the default value.
    default_range: TextRange,
    default: Option<Box<Patcher<Node>>>,
}

/// `(a, @b = 1) -> body` and its bound `=>` form.
#[derive(Debug)]
pub(crate) struct Function {
    params: Vec<Param>,
    param_list: Option<TextRange>,
    arrow: Token,
    body: Option<Box<Patcher<Node>>>,
    /// Keeps the braceless `=> expression` form.
    concise: bool,
}

impl Function {
    pub(super) fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        let view =
            ast::Function::cast(node).ok_or_else(|| unsupported(node, "expected a function"))?;
        let (_, arrow) = view.arrow.ok_or_else(|| unsupported(node, "function has no arrow"))?;

        let params = view
            .params()
            .map(|param| {
                let name = name_of(param.binding)
                    .ok_or_else(|| unsupported(param.binding, "unsupported parameter"))?;
                let binding = param.binding.range();
                Ok(Param {
                    binding,
                    name: name.to_owned(),
                    member: param.binding.kind() == THIS_MEMBER,
                    default_range: TextRange::new(binding.end(), param.node.range().end()),
                    default: build_child(param.default, scopes)?,
                })
            })
            .collect::<Result<Vec<_>, PatchError>>()?;

        Ok(Self {
            params,
            param_list: view.params.map(SyntaxNode::range),
            arrow,
            body: build_child(view.body, scopes)?,
            concise: false,
        })
    }

    fn is_bound(&self) -> bool {
        self.arrow.kind == FAT_ARROW
    }

    fn has_param_lines(&self) -> bool {
        self.params.iter().any(|param| param.member || param.default.is_some())
    }

    /// A bound function with a single inline expression keeps its
    /// braceless form.
    fn is_concise(&self, cx: &PatchContext<'_>) -> bool {
        let Some(body) = &self.body else { return false };
        self.is_bound()
            && !self.has_param_lines()
            && !is_indented(&body.info, cx)
            && body.can_patch_as_expression()
    }

    /// Renames member parameters and strips defaults. Returns the lines that
    /// assign them at the top of the body: defaults first, then members.
    fn patch_params(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<Vec<String>, PatchError> {
        let scope = cx.scopes.scope_of(cx.node(info.node)).unwrap_or(info.scope);
        let mut defaults = Vec::new();
        let mut members = Vec::new();

        for param in &mut self.params {
            let name = if param.member {
                let local = cx.claim_free_binding(scope, &param.name, param.binding)?;
                cx.editor.overwrite(param.binding, local.as_str())?;
                members.push(format!("this.{} = {local};", param.name));
                local
            } else {
                param.name.clone()
            };

            if let Some(default) = &mut param.default {
                let value = default.patch_and_render(cx)?;
                cx.editor.remove(param.default_range)?;
                defaults.push(format!("if ({name} == null) {{ {name} = {value}; }}"));
            }
        }

        defaults.extend(members);
        Ok(defaults)
    }

    fn opening(&self) -> &'static str {
        match (self.is_bound(), self.param_list.is_some()) {
            (false, true) => "{",
            (false, false) => "function() {",
            (true, true) => "=> {",
            (true, false) => "() => {",
        }
    }

    fn patch_function(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        if self.concise {
            if self.param_list.is_none() {
                cx.editor.overwrite(self.arrow.range, "() =>")?;
            }
            if let Some(body) = &mut self.body {
                body.patch(cx)?;
            }
            return Ok(());
        }

        if let (Some(params), false) = (self.param_list, self.is_bound()) {
            cx.editor.insert(params.start(), "function")?;
        }
        let lines = self.patch_params(info, cx)?;
        let opening = self.opening();

        let Some(body) = &mut self.body else {
            let text = match lines.as_slice() {
                [] => format!("{opening}}}"),
                lines => format!("{opening} {} }}", lines.join(" ")),
            };
            cx.editor.overwrite(self.arrow.range, text)?;
            return Ok(());
        };

        cx.editor.overwrite(self.arrow.range, opening)?;
        body.patch(cx)?;
        prepend_body_lines(body, &lines, cx)?;
        let close = closing_brace(info, &body.info, cx)?;
        cx.editor.insert(info.content.end(), close)?;
        Ok(())
    }
}

impl NodePatch<Node> for Function {
    fn initialize(
        &mut self,
        _info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        cx.enter_function();
        for param in &mut self.params {
            if let Some(default) = &mut param.default {
                default.set_requires_expression();
            }
        }

        self.concise = self.is_concise(cx);
        let Some(body) = &mut self.body else { return Ok(()) };
        if self.concise {
            body.set_requires_expression();
        } else if let Node::Block(block) = &mut body.kind {
            block.implicit_return = true;
        }
        Ok(())
    }

    fn finish_initialize(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        if cx.exit_function() && self.concise {
            return Err(PatchError::ContractViolation {
                message: "concise arrow function cannot return explicitly".to_owned(),
                range: info.content,
            });
        }
        Ok(())
    }

    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        self.params
            .iter_mut()
            .filter_map(|param| param.default.as_deref_mut())
            .chain(self.body.as_deref_mut())
            .collect()
    }

    fn patch_as_expression(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        self.patch_function(info, cx)
    }

    /// A function expression cannot start a statement, so unbound ones get
    /// parentheses.
    fn patch_as_statement(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        self.patch_function(info, cx)?;
        if !self.is_bound() && !info.is_parenthesized() {
            cx.editor.prepend(info.outer.start(), "(")?;
            cx.editor.insert(info.outer.end(), ")")?;
        }
        Ok(())
    }
}
