use decoct_syntax::SyntaxKind::{BLOCK, PROGRAM};
use expect_test::{Expect, expect};

fn check(text: &str, expect: Expect) {
    let parse = crate::parse(text);

    let mut actual = parse.tree().debug_dump();
    for error in parse.errors() {
        actual.push_str(&format!("error {:?}: {}\n", error.range(), error.message()));
    }
    expect.assert_eq(&actual);
}

#[test]
fn assignments() {
    check(
        "a = 1\nb ?= a\n",
        expect![[r#"
            PROGRAM@0..12
              BLOCK@0..12
                ASSIGN@0..5
                  IDENT@0..1
                  LITERAL@4..5
                EXISTS_ASSIGN@6..12
                  IDENT@6..7
                  IDENT@11..12
        "#]],
    );
}

#[test]
fn postfix_loop_wraps_body_in_block() {
    check(
        "f(x) for x in list when x\n",
        expect![[r#"
            PROGRAM@0..25
              BLOCK@0..25
                FOR_EXPR@0..25
                  BLOCK@0..4
                    CALL_EXPR@0..4
                      IDENT@0..1
                      ARG_LIST@1..4
                        IDENT@2..3
                  IDENT@9..10
                  IDENT@14..18
                  IDENT@24..25
        "#]],
    );
}

#[test]
fn function_with_params() {
    check(
        "(a, @b = 1) ->\n  a\n",
        expect![[r#"
            PROGRAM@0..18
              BLOCK@0..18
                FUNCTION@0..18
                  PARAM_LIST@0..11
                    IDENT@1..2
                    DEFAULT_PARAM@4..10
                      THIS_MEMBER@4..6
                      LITERAL@9..10
                  BLOCK@17..18
                    IDENT@17..18
        "#]],
    );
}

#[test]
fn conditional_with_else_on_next_line() {
    check(
        "if a\n  b\nelse c\n",
        expect![[r#"
            PROGRAM@0..15
              BLOCK@0..15
                IF_EXPR@0..15
                  IDENT@3..4
                  BLOCK@7..8
                    IDENT@7..8
                  BLOCK@14..15
                    IDENT@14..15
        "#]],
    );
}

#[test]
fn binary_precedence() {
    check(
        "a + b * c\n",
        expect![[r#"
            PROGRAM@0..9
              BLOCK@0..9
                BINARY_EXPR@0..9
                  IDENT@0..1
                  BINARY_EXPR@4..9
                    IDENT@4..5
                    IDENT@8..9
        "#]],
    );
}

#[test]
fn call_requires_adjacent_parens() {
    check(
        "f (a)\n",
        expect![[r#"
            PROGRAM@0..5
              BLOCK@0..5
                IDENT@0..1
                ERROR@2..3
                IDENT@3..4
                ERROR@4..5
            error 2..3: expected end of statement
            error 4..5: expected end of statement
        "#]],
    );
}

#[test]
fn missing_expression() {
    check(
        "a = )\n",
        expect![[r#"
            PROGRAM@0..5
              BLOCK@0..5
                ASSIGN@0..5
                  IDENT@0..1
                  ERROR@4..5
            error 4..5: expected expression
        "#]],
    );
}

#[test]
fn comments_stay_outside_nodes() {
    let text = "a = 1 # one\n# two\nb\n";
    let parse = crate::parse(text);
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());

    let tree = parse.tree();
    let comments =
        tree.comments().iter().map(|comment| &text[comment.range]).collect::<Vec<_>>();
    assert_eq!(comments, ["# one", "# two"]);
    let statements =
        tree.root().descendants().filter(|node| !matches!(node.kind(), PROGRAM | BLOCK));
    for node in statements {
        assert!(!node.text().contains('#'), "{node:?}");
    }
}
