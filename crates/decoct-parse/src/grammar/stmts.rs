use decoct_syntax::SyntaxKind::{self, *};

use super::{EXPR_FIRST, STMT_FIRST, exprs};
use crate::parser::{CompletedMarker, Parser};

pub(crate) fn program(p: &mut Parser<'_>) {
    let m = p.start();

    let block = p.start();
    stmts(p, EOF);
    block.complete(p, BLOCK);

    m.complete(p, PROGRAM);
}

/// Statements up to `end`, separated by newlines or semicolons.
fn stmts(p: &mut Parser<'_>, end: SyntaxKind) {
    loop {
        while p.at(NEWLINE) || p.at(SEMICOLON) {
            p.advance();
        }
        if p.at(end) || p.at(EOF) {
            break;
        }

        stmt(p);

        match p.peek_kind() {
            NEWLINE | SEMICOLON => p.advance(),
            kind if kind == end || kind == EOF => break,
            INDENT => p.error_and_bump("unexpected indentation"),
            _ => p.error_and_bump("expected end of statement"),
        }
    }
}

pub(crate) fn stmt(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    let mut stmt = if p.at(RETURN_KW) {
        let m = p.start();
        p.advance();
        if EXPR_FIRST.contains(p.peek_kind()) {
            exprs::expr(p);
        }
        m.complete(p, RETURN_STMT)
    } else {
        exprs::expr(p)?
    };

    loop {
        let kind = match p.peek_kind() {
            FOR_KW => FOR_EXPR,
            IF_KW => IF_EXPR,
            _ => break,
        };

        let body = stmt.precede(p).complete(p, BLOCK);
        let m = body.precede(p);
        p.advance();
        if kind == FOR_EXPR {
            exprs::for_header(p);
        } else {
            exprs::expr(p);
        }
        stmt = m.complete(p, kind);
    }

    Some(stmt)
}

/// An indented block.
pub(crate) fn block(p: &mut Parser<'_>) {
    debug_assert_eq!(p.peek_kind(), INDENT);

    let m = p.start();
    p.advance();
    stmts(p, OUTDENT);
    p.expect(OUTDENT, "expected end of block");
    m.complete(p, BLOCK);
}

/// Statements on the rest of the line: `stmt (';' stmt)*`.
pub(crate) fn inline_block(p: &mut Parser<'_>) {
    let m = p.start();
    stmt(p);
    while p.at(SEMICOLON) && STMT_FIRST.contains(p.nth_kind(1)) {
        p.advance();
        stmt(p);
    }
    m.complete(p, BLOCK);
}

/// Body after a loop or conditional header: `then` + inline statements,
/// or an indented block.
pub(crate) fn body(p: &mut Parser<'_>) {
    if p.eat(THEN_KW) {
        if p.at(INDENT) {
            block(p);
        } else {
            inline_block(p);
        }
    } else if p.at(INDENT) {
        block(p);
    } else {
        p.error("expected 'then' or an indented block");
    }
}
