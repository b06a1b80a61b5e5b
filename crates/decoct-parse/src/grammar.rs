use decoct_syntax::SyntaxKind::{self, *};
use decoct_syntax::SyntaxSet;

use crate::parser::Parser;

mod exprs;
pub(crate) mod stmts;

/// Tokens that can begin an expression.
pub(crate) const EXPR_FIRST: SyntaxSet = SyntaxSet::new([
    NUMBER,
    STRING,
    TRUE_KW,
    FALSE_KW,
    NULL_KW,
    UNDEFINED_KW,
    THIS_KW,
    NAME,
    AT,
    LEFT_PAREN,
    LEFT_BRACKET,
    ARROW,
    FAT_ARROW,
    BANG,
    NOT_KW,
    OPERATOR,
    FOR_KW,
    IF_KW,
]);

/// Tokens that can begin a statement.
pub(crate) const STMT_FIRST: SyntaxSet = EXPR_FIRST.with(RETURN_KW);

pub(crate) fn name(p: &mut Parser<'_>) {
    match p.peek_kind() {
        NAME => {
            let m = p.start();
            p.advance();
            m.complete(p, IDENT);
        }
        EOF => p.error("expected identifier"),
        _ => p.error_and_bump("expected identifier"),
    }
}

pub(crate) fn delimited(
    p: &mut Parser<'_>,
    bra: SyntaxKind,
    ket: SyntaxKind,
    unexpected_delim_message: &'static str,
    first_set: SyntaxSet,
    mut parser: impl FnMut(&mut Parser<'_>) -> bool,
) {
    debug_assert_eq!(p.peek_kind(), bra);
    p.advance();

    while !p.at(ket) && !p.at(EOF) {
        if p.at(COMMA) {
            p.error_and_bump(unexpected_delim_message);
            continue;
        }

        if !parser(p) {
            break;
        }

        if !p.eat(COMMA) {
            if first_set.contains(p.peek_kind()) {
                p.error("expected ','");
            } else {
                break;
            }
        }
    }

    let message = match ket {
        RIGHT_PAREN => "expected ')'",
        _ => "expected ']'",
    };
    p.expect(ket, message);
}
