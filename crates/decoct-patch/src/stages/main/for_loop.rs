use decoct_syntax::SyntaxKind::*;
use decoct_syntax::ast::ForExpr;
use decoct_syntax::{NodeId, SyntaxNode, TextRange, TextSize};

use super::{Node, build, build_child, closing_brace, prepend_body_lines, unsupported};
use crate::context::PatchContext;
use crate::error::PatchError;
use crate::navigate::index_of_token_between;
use crate::patcher::{NodeInfo, NodePatch, Patcher, present};
use crate::scope::Scopes;

/// A name bound by the loop header.
#[derive(Debug)]
struct LoopBinding {
    name: String,
    declaration: bool,
    /// Used outside the block the loop is in.
    escapes: bool,
}

/// `for v in list`, `for v, i in list` and `for k, v of object`, with an
/// optional `when` filter. Only the prefix form reaches this stage.
#[derive(Debug)]
pub(crate) struct ForLoop {
    key: Option<Box<Patcher<Node>>>,
    value: Option<Box<Patcher<Node>>>,
    target: Box<Patcher<Node>>,
    filter: Option<Box<Patcher<Node>>>,
    body: Box<Patcher<Node>>,
    is_of: bool,
    bindings: Vec<LoopBinding>,
}

impl ForLoop {
    pub(super) fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        let view = ForExpr::cast(node).ok_or_else(|| unsupported(node, "expected a loop"))?;
        let target = view.target.ok_or_else(|| unsupported(node, "loop has no target"))?;
        let body = view.body.ok_or_else(|| unsupported(node, "loop has no body"))?;
        if body.range().start() < target.range().start() {
            return Err(unsupported(node, "postfix loop was not normalized"));
        }

        let mut bindings = Vec::new();
        for binding in [view.key, view.value].into_iter().flatten() {
            let names = match binding.kind() {
                ARRAY => binding.children().collect(),
                _ => vec![binding],
            };
            bindings.extend(names.into_iter().filter(|name| name.kind() == IDENT).map(|name| {
                LoopBinding {
                    name: name.text().to_owned(),
                    declaration: scopes.is_declaration(name),
                    escapes: !scopes.is_block_local(name),
                }
            }));
        }

        Ok(Self {
            key: build_child(view.key, scopes)?,
            value: build_child(view.value, scopes)?,
            target: Box::new(build(target, scopes)?),
            filter: build_child(view.filter, scopes)?,
            body: Box::new(build(body, scopes)?),
            is_of: view.is_of,
            bindings,
        })
    }

    /// Whether every name bound by the header is new and only used inside
    /// the loop, so it can be declared in the header itself.
    fn bindings_are_local(&self, node: NodeId, cx: &PatchContext<'_>) -> bool {
        let root = cx.tree().root().id();
        self.bindings.iter().all(|binding| {
            binding.declaration
                && cx.count_usages(root, &binding.name) == cx.count_usages(node, &binding.name)
        })
    }

    /// End of the header, `then` included.
    fn header_end(&self, cx: &PatchContext<'_>) -> TextSize {
        let last = self.filter.as_deref().unwrap_or(&*self.target);
        index_of_token_between(cx.tree(), &last.info, &self.body.info, |token| {
            token.kind == THEN_KW
        })
        .and_then(|index| cx.token(index))
        .map_or(last.info.outer.end(), |then| then.range.end())
    }

    /// The target as an expression that is safe to evaluate repeatedly.
    fn cached_target(
        &self,
        info: &NodeInfo,
        code: String,
        hint: &str,
        cx: &mut PatchContext<'_>,
    ) -> Result<String, PatchError> {
        if matches!(self.target.info.kind, IDENT | THIS_MEMBER | THIS) {
            return Ok(code);
        }
        let name = cx.claim_free_binding(info.scope, hint, self.target.info.outer)?;
        info.prepend_line_before(cx, &format!("let {name} = {code};"))?;
        Ok(name)
    }
}

fn render(
    patcher: Option<&mut Box<Patcher<Node>>>,
    cx: &mut PatchContext<'_>,
) -> Result<Option<String>, PatchError> {
    patcher.map(|patcher| patcher.patch_and_render(cx)).transpose()
}

impl NodePatch<Node> for ForLoop {
    /// Everything in the header is an expression.
    fn initialize(
        &mut self,
        _info: &NodeInfo,
        _cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        let header = [
            self.key.as_mut(),
            self.value.as_mut(),
            Some(&mut self.target),
            self.filter.as_mut(),
        ];
        for patcher in present(header) {
            patcher.set_requires_expression();
        }
        Ok(())
    }

    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        present([
            self.key.as_mut(),
            self.value.as_mut(),
            Some(&mut self.target),
            self.filter.as_mut(),
            Some(&mut self.body),
        ])
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
            message: "loop cannot be used as an expression".to_owned(),
            range: info.content,
        })
    }

    fn patch_as_statement(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        let for_token = info
            .content_tokens
            .and_then(|(first, _)| cx.token(first))
            .filter(|token| token.kind == FOR_KW)
            .ok_or_else(|| PatchError::Patch {
                message: "expected 'for' at start of loop".to_owned(),
                range: info.content,
            })?;
        let header = TextRange::new(for_token.range.start(), self.header_end(cx));

        let key = render(self.key.as_mut(), cx)?;
        let value = render(self.value.as_mut(), cx)?;
        let target = render(Some(&mut self.target), cx)?.unwrap_or_default();
        let filter = render(self.filter.as_mut(), cx)?;

        let local = self.bindings_are_local(info.node, cx);
        if !local {
            for binding in self.bindings.iter().filter(|binding| binding.declaration) {
                cx.declare(&binding.name, binding.escapes);
            }
        }
        let decl = if local { "let " } else { "" };

        let mut lines = Vec::new();
        let opening = match (self.is_of, key, value) {
            (true, Some(key), value) => {
                let object = self.cached_target(info, target, "object", cx)?;
                if let Some(value) = value {
                    lines.push(format!("{decl}{value} = {object}[{key}];"));
                }
                format!("for ({decl}{key} in {object}) {{")
            }
            (false, Some(index), value) => {
                let array = self.cached_target(info, target, "array", cx)?;
                if let Some(value) = value {
                    lines.push(format!("{decl}{value} = {array}[{index}];"));
                }
                format!("for ({decl}{index} = 0; {index} < {array}.length; {index}++) {{")
            }
            (false, None, Some(value)) => format!("for ({decl}{value} of {target}) {{"),
            _ => {
                return Err(PatchError::Patch {
                    message: "loop has no binding".to_owned(),
                    range: info.content,
                });
            }
        };
        if let Some(filter) = filter {
            lines.push(format!("if (!({filter})) {{ continue; }}"));
        }

        cx.editor.overwrite(header, opening)?;
        self.body.patch(cx)?;
        prepend_body_lines(&self.body, &lines, cx)?;
        let close = closing_brace(info, &self.body.info, cx)?;
        cx.editor.insert(info.content.end(), close)?;
        Ok(())
    }
}
