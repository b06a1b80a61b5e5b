//! Rewrites postfix loops and conditionals into their prefix forms,
//! staying in the input language. Everything else is left as written.

use decoct_syntax::SyntaxKind::*;
use decoct_syntax::SyntaxNode;
use decoct_syntax::ast::IfExpr;

use crate::context::PatchContext;
use crate::error::PatchError;
use crate::patcher::{NodeInfo, NodePatch, Patcher, patcher_kinds, unwrap_parens};
use crate::scope::Scopes;

mod conditional;
mod for_loop;

use conditional::PostfixConditional;
use for_loop::ForLoop;

patcher_kinds! {
    #[derive(Debug)]
    pub(crate) enum Node {
        For(ForLoop),
        Conditional(PostfixConditional),
        Passthrough(Passthrough),
    }
}

pub(crate) fn build(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Patcher<Node>, PatchError> {
    let (inner, outer) = unwrap_parens(node);
    let info = NodeInfo::new(inner, outer, scopes.enclosing(inner));

    let kind = match inner.kind() {
        FOR_EXPR => Node::For(ForLoop::new(inner, scopes)?),
        IF_EXPR if IfExpr::cast(inner).is_some_and(|view| view.is_postfix) => {
            Node::Conditional(PostfixConditional::new(inner, scopes)?)
        }
        _ => Node::Passthrough(Passthrough::new(inner, scopes)?),
    };
    Ok(Patcher::new(info, kind))
}

fn build_child(
    node: Option<SyntaxNode<'_>>,
    scopes: &Scopes,
) -> Result<Option<Box<Patcher<Node>>>, PatchError> {
    node.map(|node| build(node, scopes).map(Box::new)).transpose()
}

fn missing(node: SyntaxNode<'_>, what: &str) -> PatchError {
    PatchError::Patch {
        message: format!("{} has no {what}", node.kind().describe()),
        range: node.range(),
    }
}

/// Leaves its own text alone and patches its children.
#[derive(Debug)]
pub(crate) struct Passthrough {
    children: Vec<Patcher<Node>>,
}

impl Passthrough {
    fn new(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Self, PatchError> {
        let children =
            node.children().map(|child| build(child, scopes)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { children })
    }
}

impl NodePatch<Node> for Passthrough {
    fn children_mut(&mut self) -> Vec<&mut Patcher<Node>> {
        self.children.iter_mut().collect()
    }

    fn patch_as_expression(
        &mut self,
        _info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        for child in &mut self.children {
            child.patch(cx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{CompileOptions, Stage, compile};

    fn check(input: &str, expected: &str) {
        let options = CompileOptions { stage: Stage::Normalize };
        assert_eq!(compile(input, &options).unwrap(), expected);
    }

    #[test]
    fn leaves_prefix_forms_alone() {
        check("for x in list\n  f(x)\n", "for x in list\n  f(x)\n");
        check("if a then b else c\n", "if a then b else c\n");
    }

    #[test]
    fn postfix_loop_becomes_prefix() {
        check("f(x) for x in list\n", "for x in list then f(x)\n");
        check("f(x) for x, i in list when i > 0\n", "for x, i in list when i > 0 then f(x)\n");
    }

    #[test]
    fn postfix_conditional_becomes_prefix() {
        check("a() if b\n", "if b then a()\n");
        check("return a if b\n", "if b then return a\n");
    }

    #[test]
    fn nested_postfix_loops_keep_their_order() {
        check("f(x, y) for x in xs for y in ys\n", "for y in ys then for x in xs then f(x, y)\n");
    }

    #[test]
    fn relocated_headers_are_parenthesized_when_ambiguous() {
        check(
            "f(x) for x in (if a then b else c)\n",
            "for x in (if a then b else c) then f(x)\n",
        );
        check("f(x) for x in g(-> if a then b)\n", "for x in (g(-> if a then b)) then f(x)\n");
    }

    #[test]
    fn pattern_values_are_hoisted() {
        check("for [a, @b] in list\n  f(a)\n", "for value in list\n  [a, @b] = value\n  f(a)\n");
        check("f(a) for [a, @b] in list\n", "for value in list then [a, @b] = value; f(a)\n");
        check(
            "value = 1\nfor @a in list then f()\n",
            "value = 1\nfor value1 in list then @a = value1; f()\n",
        );
    }

    #[test]
    fn plain_bindings_are_not_hoisted() {
        check("for [a, b] in list\n  f(a)\n", "for [a, b] in list\n  f(a)\n");
    }

    #[test]
    fn indented_bodies_keep_indentation() {
        check("if a\n  f(x) for x in y\n", "if a\n  for x in y then f(x)\n");
    }
}
