//! Token lookups between the patchers of one construct.

use decoct_syntax::SyntaxKind::*;
use decoct_syntax::{SyntaxSet, SyntaxTree, Token, TokenIndex};

use crate::patcher::NodeInfo;

/// Keywords that would be misread when a relocated expression is followed
/// by `then`.
const CLAUSE_KEYWORDS: SyntaxSet = SyntaxSet::new([THEN_KW, IF_KW, ELSE_KW, FOR_KW]);

fn between(
    tree: &SyntaxTree,
    left: &NodeInfo,
    right: &NodeInfo,
) -> impl Iterator<Item = (TokenIndex, Token)> {
    let start = left.outer_tokens.map(|(_, last)| last.next().index());
    let end = right.outer_tokens.map(|(first, _)| first.index());
    let range = match start.zip(end) {
        Some((start, end)) if start <= end => start..end,
        _ => 0..0,
    };
    range.filter_map(move |index| {
        let index = TokenIndex::new(index);
        tree.token(index).map(|token| (index, *token))
    })
}

/// First token after `left` and before `right` matching `predicate`.
pub fn index_of_token_between(
    tree: &SyntaxTree,
    left: &NodeInfo,
    right: &NodeInfo,
    predicate: impl Fn(&Token) -> bool,
) -> Option<TokenIndex> {
    between(tree, left, right).find(|(_, token)| predicate(token)).map(|(index, _)| index)
}

/// Whether `text` needs parentheses before it can be followed by `then`
/// in a relocated loop or conditional header.
pub fn postfix_expression_requires_parens(text: &str) -> bool {
    decoct_tokenizer::tokenize(text).iter().any(|token| CLAUSE_KEYWORDS.contains(token.kind))
}

#[cfg(test)]
mod tests {
    use decoct_syntax::SyntaxNode;

    use super::*;
    use crate::scope::Scopes;

    fn info(node: SyntaxNode<'_>, scopes: &Scopes) -> NodeInfo {
        NodeInfo::new(node, node, scopes.enclosing(node))
    }

    #[test]
    fn finds_loop_keyword_between_body_and_binding() {
        let parse = decoct_parse::parse("f(x) for x in list\n");
        let tree = parse.tree();
        let scopes = Scopes::build(tree);
        let for_expr = tree.root().descendants().find(|node| node.kind() == FOR_EXPR).unwrap();
        let mut children = for_expr.children();
        let body = info(children.next().unwrap(), &scopes);
        let value = info(children.next().unwrap(), &scopes);

        let index = index_of_token_between(tree, &body, &value, |token| token.kind == FOR_KW);
        assert_eq!(index.map(|index| tree.token_text(index)), Some("for"));
        assert_eq!(index_of_token_between(tree, &value, &body, |_| true), None);
    }

    #[test]
    fn clause_keywords_require_parens() {
        assert!(postfix_expression_requires_parens("a if b else c"));
        assert!(postfix_expression_requires_parens("x for x in y"));
        assert!(!postfix_expression_requires_parens("f(a, b)"));
        assert!(!postfix_expression_requires_parens("then_value"));
    }
}
