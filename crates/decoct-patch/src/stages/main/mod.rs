//! Turns normalized source into JavaScript.

use decoct_syntax::SyntaxKind::*;
use decoct_syntax::{SyntaxNode, TextRange, TextSize};

use crate::context::PatchContext;
use crate::error::PatchError;
use crate::patcher::{NodeInfo, Patcher, patcher_kinds, unwrap_parens};
use crate::scope::Scopes;

mod assign;
mod block;
mod conditional;
mod expr;
mod for_loop;
mod function;
mod return_stmt;

use assign::Assign;
use block::Block;
use conditional::Conditional;
use expr::Expression;
use for_loop::ForLoop;
use function::Function;
use return_stmt::Return;

patcher_kinds! {
    #[derive(Debug)]
    pub(crate) enum Node {
        Block(Block),
        Return(Return),
        Function(Function),
        Assign(Assign),
        Conditional(Conditional),
        For(ForLoop),
        Expression(Expression),
    }
}

impl Node {
    /// Statements that end in a closing brace and take no `;`.
    fn is_block_statement(&self) -> bool {
        match self {
            Self::Conditional(_) | Self::For(_) => true,
            Self::Assign(assign) => assign.is_existence(),
            _ => false,
        }
    }
}

pub(crate) fn build(node: SyntaxNode<'_>, scopes: &Scopes) -> Result<Patcher<Node>, PatchError> {
    let (inner, outer) = unwrap_parens(node);
    if inner.kind() == PROGRAM
        && let Some(block) = inner.children().next()
    {
        return build(block, scopes);
    }

    let info = NodeInfo::new(inner, outer, scopes.enclosing(inner));
    let kind = match inner.kind() {
        BLOCK => Node::Block(Block::new(inner, scopes)?),
        RETURN_STMT => Node::Return(Return::new(inner, scopes)?),
        FUNCTION => Node::Function(Function::new(inner, scopes)?),
        ASSIGN | EXISTS_ASSIGN => Node::Assign(Assign::new(inner, scopes)?),
        IF_EXPR => Node::Conditional(Conditional::new(inner, scopes)?),
        FOR_EXPR => Node::For(ForLoop::new(inner, scopes)?),
        _ => Node::Expression(Expression::new(inner, scopes)?),
    };
    Ok(Patcher::new(info, kind))
}

fn build_child(
    node: Option<SyntaxNode<'_>>,
    scopes: &Scopes,
) -> Result<Option<Box<Patcher<Node>>>, PatchError> {
    node.map(|node| build(node, scopes).map(Box::new)).transpose()
}

fn unsupported(node: SyntaxNode<'_>, message: impl Into<String>) -> PatchError {
    PatchError::Patch { message: message.into(), range: node.range() }
}

/// Whether the construct starts on its own, more deeply indented line.
fn is_indented(info: &NodeInfo, cx: &PatchContext<'_>) -> bool {
    info.content_tokens
        .and_then(|(first, _)| first.prev())
        .and_then(|index| cx.token(index))
        .is_some_and(|token| token.kind == INDENT)
}

/// Respells every comment for JavaScript. Runs before any construct is
/// patched, so rewrites of enclosing ranges take precedence.
pub(crate) fn rewrite_comments(cx: &mut PatchContext<'_>) -> Result<(), PatchError> {
    let tree = cx.tree();
    for comment in tree.comments() {
        for (range, replacement) in comment.delimiters(tree.text()) {
            cx.editor.overwrite(range, replacement)?;
        }
    }
    Ok(())
}

/// Closing brace for a body opened on the line of `owner`. Comments that
/// trail an indented body are moved inside the brace.
fn closing_brace(
    owner: &NodeInfo,
    body: &NodeInfo,
    cx: &mut PatchContext<'_>,
) -> Result<String, PatchError> {
    if !is_indented(body, cx) {
        return Ok(" }".to_owned());
    }
    let indent = cx.indent_of_line(owner.content.start());
    let moved = move_trailing_comments(body.outer.end(), indent.len(), cx)?;
    Ok(format!("{moved}\n{indent}}}"))
}

/// Takes the comments after `end` that are on its line or on following
/// lines indented deeper than `indent`. Removes them from their place and
/// returns them, with the whitespace before each, as JavaScript.
fn move_trailing_comments(
    end: TextSize,
    indent: usize,
    cx: &mut PatchContext<'_>,
) -> Result<String, PatchError> {
    let tree = cx.tree();
    let mut cursor = end;
    let mut moved = String::new();
    let mut taken = None;

    for comment in tree.comments().iter().filter(|comment| comment.range.start() >= end) {
        let start = comment.range.start();
        let gap = cx.slice(TextRange::new(cursor, start));
        if !gap.chars().all(char::is_whitespace) {
            break;
        }
        let deeper = cx.line_indent(start).is_some_and(|prefix| prefix.len() > indent);
        if gap.contains('\n') && !deeper {
            break;
        }

        cursor = comment.range.end();
        if cx.move_comment(start) {
            moved.push_str(gap);
            moved.push_str(&comment.to_javascript(tree.text()));
            taken = Some(cursor);
        }
    }

    if let Some(taken) = taken {
        cx.editor.remove(TextRange::new(end, taken))?;
    }
    Ok(moved)
}

/// Adds `lines` in order in front of the first statement of `body`, ahead
/// of anything the body put there itself.
fn prepend_body_lines(
    body: &Patcher<Node>,
    lines: &[String],
    cx: &mut PatchContext<'_>,
) -> Result<(), PatchError> {
    if lines.is_empty() {
        return Ok(());
    }
    let first = match &body.kind {
        Node::Block(block) => block.first_statement(),
        _ => None,
    };
    let first = first.ok_or_else(|| body.error("expected a block with statements"))?;
    for line in lines.iter().rev() {
        first.prepend_line_before(cx, line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{CompileOptions, compile};

    #[track_caller]
    fn check(input: &str, expected: &str) {
        assert_eq!(compile(input, &CompileOptions::default()).unwrap(), expected);
    }

    #[test]
    fn statements_get_semicolons_and_declarations() {
        check("a = 1\nb = a + 2\na = b\n", "let a = 1;\nlet b = a + 2;\na = b;\n");
        check("f(a); g()\n", "f(a); g();\n");
    }

    #[test]
    fn return_without_value_is_left_alone() {
        check("return\n", "return;\n");
        check("-> return\n", "(function() { return; });\n");
    }

    #[test]
    fn return_patches_its_value() {
        check(
            "f = (a) ->\n  return a ?= 1\n",
            "let f = function(a) {\n  return a != null ? a : (a = 1);\n};\n",
        );
    }

    #[test]
    fn parameter_without_assignment() {
        check("(a) ->\n", "(function(a) {});\n");
    }

    #[test]
    fn member_parameters_become_assignments() {
        check(
            "(@a, @b) ->\n  @a + @b\n",
            "(function(a, b) {\n  this.a = a;\n  this.b = b;\n  return this.a + this.b;\n});\n",
        );
    }

    #[test]
    fn member_parameters_avoid_taken_names() {
        check(
            "a = 1\n(@a, @b) ->\n  b = 2\n  a + b\n",
            "let a = 1;\n(function(a1, b1) {\n  this.a = a1;\n  this.b = b1;\n  let b = 2;\n  return a + b;\n});\n",
        );
    }

    #[test]
    fn member_parameters_in_nested_blocks() {
        check(
            "if true\n  (@a) ->\n    @a\n",
            "if (true) {\n  (function(a) {\n    this.a = a;\n    return this.a;\n  });\n}\n",
        );
    }

    #[test]
    fn default_parameters() {
        check(
            "(a=0) ->\n  a ?= 1\n",
            "(function(a) {\n  if (a == null) { a = 0; }\n  return a != null ? a : (a = 1);\n});\n",
        );
    }

    #[test]
    fn bodiless_function_assigns_members_without_returning() {
        check("(@a) ->\n", "(function(a) { this.a = a; });\n");
    }

    #[test]
    fn inline_function_bodies() {
        check("f = (a) -> a + 1\n", "let f = function(a) { return a + 1; };\n");
        check("f = (@a) -> @a\n", "let f = function(a) { this.a = a; return this.a; };\n");
        check("g(-> 1)\n", "g(function() { return 1; });\n");
    }

    #[test]
    fn bound_functions() {
        check("f = (a) => a\n", "let f = (a) => a;\n");
        check("f = => @a\n", "let f = () => this.a;\n");
        check("f = (a) =>\n  b = a\n  b\n", "let f = (a) => {\n  let b = a;\n  return b;\n};\n");
    }

    #[test]
    fn existence_assignment_statement() {
        check("a = null\na ?= 2\n", "let a = null;\nif (a == null) { a = 2; }\n");
    }

    #[test]
    fn nested_assignment_declares_before_statement() {
        check("f(a = 1)\n", "let a;\nf(a = 1);\n");
    }

    #[test]
    fn operators_are_translated() {
        check("a and b or not c\n", "a && b || !c;\n");
        check("a is b isnt c == d != e\n", "a === b !== c === d !== e;\n");
        check("@a(@)\n", "this.a(this);\n");
    }

    #[test]
    fn conditionals() {
        check("if a then b else c\n", "if (a) { b; } else { c; }\n");
        check(
            "if a\n  b\nelse if c\n  d\nelse\n  e\n",
            "if (a) {\n  b;\n} else if (c) {\n  d;\n} else {\n  e;\n}\n",
        );
        check("x = if a then b else c\n", "let x = a ? b : c;\n");
        check("x = (if a then b)\n", "let x = (a ? b : undefined);\n");
    }

    #[test]
    fn implicit_return_goes_through_branches() {
        check(
            "f = (a) ->\n  if a\n    1\n  else\n    2\n",
            "let f = function(a) {\n  if (a) {\n    return 1;\n  } else {\n    return 2;\n  }\n};\n",
        );
    }

    #[test]
    fn loops() {
        check("for x in list\n  f(x)\n", "for (let x of list) {\n  f(x);\n}\n");
        check(
            "for x, i in list then f(x, i)\n",
            "for (let i = 0; i < list.length; i++) { let x = list[i]; f(x, i); }\n",
        );
        check(
            "for k, v of object\n  f(k, v)\n",
            "for (let k in object) {\n  let v = object[k];\n  f(k, v);\n}\n",
        );
    }

    #[test]
    fn loop_filters_skip_iterations() {
        check(
            "for x in list when x > 1\n  f(x)\n",
            "for (let x of list) {\n  if (!(x > 1)) { continue; }\n  f(x);\n}\n",
        );
    }

    #[test]
    fn complex_loop_targets_are_cached() {
        check(
            "for x, i in g()\n  f(x)\n",
            "let array = g();\nfor (let i = 0; i < array.length; i++) {\n  let x = array[i];\n  f(x);\n}\n",
        );
    }

    #[test]
    fn loop_variables_used_later_are_declared_outside() {
        check("for x in list\n  f(x)\ng(x)\n", "let x;\nfor (x of list) {\n  f(x);\n}\ng(x);\n");
    }

    #[test]
    fn postfix_forms_go_through_both_stages() {
        check("f(x) for x in list\n", "for (let x of list) { f(x); }\n");
        check("a() if b\n", "if (b) { a(); }\n");
        check(
            "f(a) for [a, b] in list\n",
            "for (let [a, b] of list) { f(a); }\n",
        );
    }

    #[test]
    fn names_assigned_in_branches_are_declared_before_the_statement() {
        check("if c\n  a = 1\nf(a)\n", "let a;\nif (c) {\n  a = 1;\n}\nf(a);\n");
        check(
            "f = (a) ->\n  if a\n    b = 1\n  else\n    b = 2\n  b\n",
            "let f = function(a) {\n  let b;\n  if (a) {\n    b = 1;\n  } else {\n    b = 2;\n  }\n  return b;\n};\n",
        );
        check(
            "for x in list\n  y = x\ng(y)\n",
            "let y;\nfor (let x of list) {\n  y = x;\n}\ng(y);\n",
        );
    }

    #[test]
    fn names_are_declared_in_their_branch_or_at_the_top() {
        check("if c\n  a = 1\n  f(a)\n", "if (c) {\n  let a = 1;\n  f(a);\n}\n");
        check(
            "if c\n  if d\n    a = 1\n  g(a)\n",
            "let a;\nif (c) {\n  if (d) {\n    a = 1;\n  }\n  g(a);\n}\n",
        );
    }

    #[test]
    fn nested_loop_variables_used_later_are_hoisted() {
        check(
            "if c\n  for x in list then f(x)\ng(x)\n",
            "let x;\nif (c) {\n  for (x of list) { f(x); }\n}\ng(x);\n",
        );
    }

    #[test]
    fn comments_become_javascript_comments() {
        check("# header\nf()\n", "// header\nf();\n");
        check("x = 1 # comment\n", "let x = 1; // comment\n");
        check("if a\n  b # note\n  c\n", "if (a) {\n  b; // note\n  c;\n}\n");
        check("###\nheader\n###\nf()\n", "/*\nheader\n*/\nf();\n");
    }

    #[test]
    fn trailing_comments_stay_inside_their_body() {
        check("f = ->\n  x\n  # c\n", "let f = function() {\n  return x;\n  // c\n};\n");
        check(
            "f = ->\n  if a\n    b\n    # inner\n  # outer\n",
            "let f = function() {\n  if (a) {\n    return b;\n    // inner\n  }\n  // outer\n};\n",
        );
        check(
            "if a\n  b\n  # c\nelse\n  d\n# after\n",
            "if (a) {\n  b;\n  // c\n} else {\n  d;\n}\n// after\n",
        );
    }

    #[test]
    fn parenthesized_conditional_statements() {
        check("(if a then b) for x in xs\n", "for (let x of xs) { (a ? b : undefined); }\n");
        check(
            "f = ->\n  (if a then b)\n",
            "let f = function() {\n  return (a ? b : undefined);\n};\n",
        );
        check("(if a then for x in y then f(x))\n", "if (a) { for (let x of y) { f(x); } }\n");
    }

    #[test]
    fn unicode_names() {
        check("é = 1\nf(é)\n", "let é = 1;\nf(é);\n");
    }

    #[test]
    fn hoisted_loop_pattern() {
        check(
            "for [a, @b] in list\n  f(a)\n",
            "for (let value of list) {\n  let a;\n  [a, this.b] = value;\n  f(a);\n}\n",
        );
    }
}
