use decoct_syntax::SyntaxKind::*;
use decoct_syntax::SyntaxSet;

use super::stmts::{block, body, inline_block, stmt};
use super::{EXPR_FIRST, STMT_FIRST, delimited, name};
use crate::parser::{CompletedMarker, Parser};

const PARAM_FIRST: SyntaxSet = SyntaxSet::new([NAME, AT]);

pub(crate) fn expr(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    match p.peek_kind() {
        FOR_KW => for_expr(p).into(),
        IF_KW => if_expr(p).into(),
        _ => assignment(p),
    }
}

fn assignment(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    let lhs = binary(p, 0)?;

    let kind = match p.peek_kind() {
        EQ => ASSIGN,
        EXISTS_EQ => EXISTS_ASSIGN,
        _ => return Some(lhs),
    };

    let m = lhs.precede(p);
    p.advance();
    expr(p);
    m.complete(p, kind).into()
}

fn binding_power(p: &Parser<'_>) -> Option<u8> {
    let power = match p.peek_kind() {
        OR_KW => 1,
        AND_KW => 2,
        IS_KW | ISNT_KW => 3,
        OPERATOR => match p.peek_text() {
            "||" => 1,
            "&&" => 2,
            "==" | "!=" => 3,
            "<" | ">" | "<=" | ">=" => 4,
            "+" | "-" => 5,
            _ => 6,
        },
        _ => return None,
    };
    Some(power)
}

fn binary(p: &mut Parser<'_>, min_power: u8) -> Option<CompletedMarker> {
    let mut lhs = unary(p)?;

    while let Some(power) = binding_power(p) {
        if power <= min_power {
            break;
        }

        let m = lhs.precede(p);
        p.advance();
        binary(p, power);
        lhs = m.complete(p, BINARY_EXPR);
    }

    lhs.into()
}

fn unary(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    let is_prefix = match p.peek_kind() {
        BANG | NOT_KW => true,
        OPERATOR => matches!(p.peek_text(), "-" | "+"),
        _ => false,
    };
    if !is_prefix {
        return postfix(p);
    }

    let m = p.start();
    p.advance();
    unary(p);
    m.complete(p, PREFIX_EXPR).into()
}

fn postfix(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    let mut lhs = primary(p)?;

    loop {
        lhs = match p.peek_kind() {
            DOT => {
                let m = lhs.precede(p);
                p.advance();
                p.expect(NAME, "expected property name");
                m.complete(p, MEMBER_EXPR)
            }
            LEFT_PAREN if p.at_adjacent(LEFT_PAREN) => {
                let m = lhs.precede(p);
                arg_list(p);
                m.complete(p, CALL_EXPR)
            }
            LEFT_BRACKET if p.at_adjacent(LEFT_BRACKET) => {
                let m = lhs.precede(p);
                p.advance();
                expr(p);
                p.expect(RIGHT_BRACKET, "expected ']'");
                m.complete(p, INDEX_EXPR)
            }
            _ => break,
        };
    }

    lhs.into()
}

fn arg_list(p: &mut Parser<'_>) {
    let m = p.start();
    delimited(p, LEFT_PAREN, RIGHT_PAREN, "expected argument", EXPR_FIRST, |p| {
        expr(p).is_some()
    });
    m.complete(p, ARG_LIST);
}

fn primary(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    match p.peek_kind() {
        NUMBER | STRING | TRUE_KW | FALSE_KW | NULL_KW | UNDEFINED_KW => {
            let m = p.start();
            p.advance();
            m.complete(p, LITERAL).into()
        }
        NAME => {
            let m = p.start();
            p.advance();
            m.complete(p, IDENT).into()
        }
        THIS_KW => {
            let m = p.start();
            p.advance();
            m.complete(p, THIS).into()
        }
        AT => this_member(p).into(),
        LEFT_PAREN if is_param_list(p) => function(p).into(),
        ARROW | FAT_ARROW => function(p).into(),
        LEFT_PAREN => {
            let m = p.start();
            p.advance();
            expr(p);
            p.expect(RIGHT_PAREN, "expected ')'");
            m.complete(p, PAREN_EXPR).into()
        }
        LEFT_BRACKET => {
            let m = p.start();
            delimited(p, LEFT_BRACKET, RIGHT_BRACKET, "expected element", EXPR_FIRST, |p| {
                expr(p).is_some()
            });
            m.complete(p, ARRAY).into()
        }
        kind if kind.is_layout() => {
            p.error("expected expression");
            None
        }
        _ => {
            p.error_and_bump("expected expression");
            None
        }
    }
}

/// `@name` or a bare `@`.
fn this_member(p: &mut Parser<'_>) -> CompletedMarker {
    debug_assert_eq!(p.peek_kind(), AT);

    let m = p.start();
    let has_name = p.next_is_adjacent(NAME);
    p.advance();
    if has_name {
        p.advance();
        m.complete(p, THIS_MEMBER)
    } else {
        m.complete(p, THIS)
    }
}

/// Looks past the balanced parentheses for an arrow.
fn is_param_list(p: &Parser<'_>) -> bool {
    let mut depth = 0usize;
    let mut n = 0;
    loop {
        match p.nth_kind(n) {
            LEFT_PAREN => depth += 1,
            RIGHT_PAREN => {
                depth -= 1;
                if depth == 0 {
                    return matches!(p.nth_kind(n + 1), ARROW | FAT_ARROW);
                }
            }
            EOF => return false,
            _ => {}
        }
        n += 1;
    }
}

fn function(p: &mut Parser<'_>) -> CompletedMarker {
    let m = p.start();

    if p.at(LEFT_PAREN) {
        let params = p.start();
        delimited(p, LEFT_PAREN, RIGHT_PAREN, "expected parameter", PARAM_FIRST, param);
        params.complete(p, PARAM_LIST);
    }

    debug_assert!(p.at(ARROW) || p.at(FAT_ARROW));
    p.advance();

    if p.at(INDENT) {
        block(p);
    } else if STMT_FIRST.contains(p.peek_kind()) {
        let body = p.start();
        stmt(p);
        body.complete(p, BLOCK);
    }

    m.complete(p, FUNCTION)
}

fn param(p: &mut Parser<'_>) -> bool {
    let binding = match p.peek_kind() {
        NAME => {
            let m = p.start();
            p.advance();
            m.complete(p, IDENT)
        }
        AT => this_member(p),
        _ => {
            p.error_and_bump("expected parameter");
            return false;
        }
    };

    if p.at(EQ) {
        let m = binding.precede(p);
        p.advance();
        expr(p);
        m.complete(p, DEFAULT_PARAM);
    }
    true
}

fn for_expr(p: &mut Parser<'_>) -> CompletedMarker {
    debug_assert_eq!(p.peek_kind(), FOR_KW);

    let m = p.start();
    p.advance();
    for_header(p);
    body(p);
    m.complete(p, FOR_EXPR)
}

/// Loop bindings, `in`/`of`, the iterated value and an optional `when`
/// filter. The `for` keyword is already consumed.
pub(crate) fn for_header(p: &mut Parser<'_>) {
    binding(p);
    if p.eat(COMMA) {
        binding(p);
    }

    if !p.eat(IN_KW) && !p.eat(OF_KW) {
        p.error("expected 'in' or 'of'");
    }
    binary(p, 0);

    if p.eat(WHEN_KW) {
        binary(p, 0);
    }
}

fn binding(p: &mut Parser<'_>) {
    match p.peek_kind() {
        NAME | AT | LEFT_BRACKET => _ = postfix(p),
        _ => name(p),
    }
}

fn if_expr(p: &mut Parser<'_>) -> CompletedMarker {
    debug_assert_eq!(p.peek_kind(), IF_KW);

    let m = p.start();
    p.advance();
    expr(p);
    body(p);

    if p.at(NEWLINE) && p.nth_kind(1) == ELSE_KW {
        p.advance();
    }
    if p.eat(ELSE_KW) {
        if p.at(IF_KW) {
            if_expr(p);
        } else if p.at(INDENT) {
            block(p);
        } else {
            p.eat(THEN_KW);
            inline_block(p);
        }
    }

    m.complete(p, IF_EXPR)
}
