use decoct_syntax::SyntaxKind::*;
use decoct_syntax::ast::ForExpr;
use decoct_syntax::{SyntaxNode, TextRange, Token};

use super::{Node, build, build_child, missing};
use crate::context::PatchContext;
use crate::error::PatchError;
use crate::navigate::{index_of_token_between, postfix_expression_requires_parens};
use crate::patcher::{NodeInfo, NodePatch, Patcher, present};
use crate::scope::Scopes;

#[derive(Debug)]
pub(crate) struct ForLoop {
    key: Option<Box<Patcher<Node>>>,
    value: Option<Box<Patcher<Node>>>,
    target: Box<Patcher<Node>>,
    filter: Option<Box<Patcher<Node>>>,
    body: Box<Patcher<Node>>,
}

impl ForLoop {
    pub(super) fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        let view = ForExpr::cast(node).ok_or_else(|| missing(node, "loop header"))?;
        let target = view.target.ok_or_else(|| missing(node, "target"))?;
        let body = view.body.ok_or_else(|| missing(node, "body"))?;

        Ok(Self {
            key: build_child(view.key, scopes)?,
            value: build_child(view.value, scopes)?,
            target: Box::new(build(target, scopes)?),
            filter: build_child(view.filter, scopes)?,
            body: Box::new(build(body, scopes)?),
        })
    }

    /// The body is written before the header.
    fn is_postfix(&self) -> bool {
        self.body.info.content.start() < self.target.info.content.start()
    }

    /// Patches the value binding. A pattern the header cannot bind directly
    /// is replaced by a fresh name; the returned line assigns it back.
    fn patch_value(
        value: &mut Patcher<Node>,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<Option<String>, PatchError> {
        if can_bind_directly(cx.node(value.info.node)) {
            value.patch(cx)?;
            return Ok(None);
        }

        let name = cx.claim_free_binding(info.scope, "value", value.info.outer)?;
        let code = value.patch_and_render(cx)?;
        cx.editor.overwrite(value.info.content, name.as_str())?;
        Ok(Some(format!("{code} = {name}")))
    }

    fn surround_then_usages_in_parens(&self, cx: &mut PatchContext<'_>) -> Result<(), PatchError> {
        for patcher in [Some(&self.target), self.filter.as_ref()].into_iter().flatten() {
            if postfix_expression_requires_parens(cx.slice(patcher.info.content)) {
                patcher.surround_in_parens(cx)?;
            }
        }
        Ok(())
    }

    fn first_header_patcher(&self) -> &Patcher<Node> {
        [self.key.as_deref(), self.value.as_deref()]
            .into_iter()
            .flatten()
            .chain([&*self.target])
            .min_by_key(|patcher| patcher.info.content.start())
            .unwrap_or(&*self.target)
    }

    fn for_token(&self, info: &NodeInfo, cx: &PatchContext<'_>) -> Result<Token, PatchError> {
        let error = |message: &str| PatchError::Patch {
            message: message.to_owned(),
            range: info.content,
        };

        if self.is_postfix() {
            let header = self.first_header_patcher();
            index_of_token_between(cx.tree(), &self.body.info, &header.info, |token| {
                token.kind == FOR_KW
            })
            .and_then(|index| cx.token(index))
            .ok_or_else(|| error("cannot find 'for' token in loop"))
        } else {
            info.content_tokens
                .and_then(|(first, _)| cx.token(first))
                .filter(|token| token.kind == FOR_KW)
                .ok_or_else(|| error("expected 'for' at start of loop"))
        }
    }
}

/// Plain names and arrays of them can be bound by a loop header as is.
fn can_bind_directly(node: SyntaxNode<'_>) -> bool {
    match node.kind() {
        IDENT => true,
        ARRAY => node.children().all(can_bind_directly),
        _ => false,
    }
}

impl NodePatch<Node> for ForLoop {
    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        present([
            self.key.as_mut(),
            self.value.as_mut(),
            Some(&mut self.target),
            self.filter.as_mut(),
            Some(&mut self.body),
        ])
    }

    fn patch_as_expression(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        if let Some(key) = &mut self.key {
            key.patch(cx)?;
        }
        let line = match &mut self.value {
            Some(value) => Self::patch_value(value, info, cx)?,
            None => None,
        };
        self.target.patch(cx)?;
        if let Some(filter) = &mut self.filter {
            filter.patch(cx)?;
        }

        let for_token = self.for_token(info, cx)?;
        if self.is_postfix() {
            self.surround_then_usages_in_parens(cx)?;

            let body = self.body.info.outer;
            let header =
                cx.render_range(TextRange::new(for_token.range.start(), info.content.end()))?;
            cx.editor.remove(TextRange::new(body.end(), info.content.end()))?;
            cx.editor.insert(body.start(), format!("{header} then "))?;
            if let Some(line) = &line {
                cx.editor.insert(body.start(), format!("{line}{}", cx.inline_separator()))?;
            }
        } else if let Some(line) = &line {
            self.body.insert_line_before(cx, line)?;
        }

        self.body.patch(cx)
    }
}

#[cfg(test)]
mod tests {
    use decoct_syntax::{SyntaxKind, SyntaxTree, TextSize};

    use super::*;
    use crate::error::Stage;

    fn find(tree: &SyntaxTree, kind: SyntaxKind) -> SyntaxNode<'_> {
        tree.root().descendants().find(|node| node.kind() == kind).unwrap()
    }

    fn info(node: SyntaxNode<'_>, cx: &PatchContext<'_>) -> NodeInfo {
        NodeInfo::new(node, node, cx.scopes.enclosing(node))
    }

    #[test]
    fn prefix_loop_must_start_with_for() {
        let parse = decoct_parse::parse("for x in list then f(x)\n");
        let tree = parse.tree();
        let cx = PatchContext::new(tree, Stage::Normalize);
        let node = find(tree, FOR_EXPR);
        let for_loop = ForLoop::new(node, &cx.scopes).unwrap();

        let token = for_loop.for_token(&info(node, &cx), &cx).unwrap();
        assert_eq!(token.range, TextRange::new(TextSize::new(0), TextSize::new(3)));

        let call = find(tree, CALL_EXPR);
        let error = for_loop.for_token(&info(call, &cx), &cx).unwrap_err();
        assert!(matches!(error, PatchError::Patch { .. }), "{error:?}");
        assert_eq!(error.to_string(), "expected 'for' at start of loop");
        assert_eq!(error.range(), call.range());
    }

    #[test]
    fn postfix_loop_keyword_must_follow_the_body() {
        let parse = decoct_parse::parse("f(x) for x in list\n");
        let tree = parse.tree();
        let node = find(tree, FOR_EXPR);

        let cx = PatchContext::new(tree, Stage::Normalize);
        let for_loop = ForLoop::new(node, &cx.scopes).unwrap();
        let token = for_loop.for_token(&info(node, &cx), &cx).unwrap();
        assert_eq!(token.range, TextRange::new(TextSize::new(5), TextSize::new(8)));

        // Same token positions, no loop keyword among them.
        let other = decoct_parse::parse("f(x) or x + list\n");
        let other_cx = PatchContext::new(other.tree(), Stage::Normalize);
        let error = for_loop.for_token(&info(node, &cx), &other_cx).unwrap_err();
        assert_eq!(error.to_string(), "cannot find 'for' token in loop");
        assert_eq!(error.range(), node.range());
    }
}
