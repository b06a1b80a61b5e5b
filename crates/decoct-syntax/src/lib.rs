//! Syntax tree shared by the tokenizer, the parser and the patchers.
//!
//! The tree is built once per compile stage and never mutated; rewriting
//! happens on the source text, not on the tree.

/// Typed views over the raw tree.
pub mod ast;
mod comment;
mod syntax_kind;
mod syntax_set;
mod tree;

pub use comment::{Comment, CommentKind};
pub use syntax_kind::SyntaxKind;
pub use syntax_set::SyntaxSet;
pub use text_size::{TextRange, TextSize};
pub use tree::{Builder, Element, NodeData, NodeId, SyntaxNode, SyntaxTree, Token, TokenIndex};
