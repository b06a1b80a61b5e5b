//! Immutable syntax tree over a pre-lexed token stream.
//!
//! Nodes live in an arena and refer to their tokens by index, so the token
//! stream stays addressable on its own for navigation between nodes.

use std::fmt;

use la_arena::{Arena, Idx};
use text_size::{TextRange, TextSize};

use crate::{Comment, SyntaxKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenIndex(u32);

impl TokenIndex {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

pub type NodeId = Idx<NodeData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Node(NodeId),
    Token(TokenIndex),
}

#[derive(Debug)]
pub struct NodeData {
    pub(crate) kind: SyntaxKind,
    pub(crate) range: TextRange,
    /// First and last significant token, layout tokens excluded.
    pub(crate) tokens: Option<(TokenIndex, TokenIndex)>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) elements: Vec<Element>,
}

pub struct SyntaxTree {
    pub(crate) text: Box<str>,
    pub(crate) tokens: Vec<Token>,
    pub(crate) comments: Vec<Comment>,
    pub(crate) nodes: Arena<NodeData>,
    pub(crate) root: NodeId,
}

impl SyntaxTree {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, id: self.root }
    }

    pub fn node(&self, id: NodeId) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, id }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: TokenIndex) -> Option<&Token> {
        self.tokens.get(index.index())
    }

    pub fn token_text(&self, index: TokenIndex) -> &str {
        self.token(index).map_or("", |token| &self.text[token.range])
    }

    /// Comments in source order. They are not part of any node.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Indented dump of the tree, one node per line, used by snapshot tests.
    pub fn debug_dump(&self) -> String {
        fn go(node: SyntaxNode<'_>, depth: usize, out: &mut String) {
            use fmt::Write as _;

            let indent = depth * 2;
            _ = writeln!(out, "{:indent$}{:?}@{:?}", "", node.kind(), node.range());
            for child in node.children() {
                go(child, depth + 1, out);
            }
        }

        let mut out = String::new();
        go(self.root(), 0, &mut out);
        out
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("text_len", &self.text.len())
            .field("tokens", &self.tokens.len())
            .field("comments", &self.comments.len())
            .finish_non_exhaustive()
    }
}

/// Node handle tied to the lifetime of the tree.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.range())
    }
}

impl<'t> SyntaxNode<'t> {
    fn data(self) -> &'t NodeData {
        &self.tree.nodes[self.id]
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn tree(self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(self) -> SyntaxKind {
        self.data().kind
    }

    pub fn range(self) -> TextRange {
        self.data().range
    }

    pub fn text(self) -> &'t str {
        &self.tree.text[self.range()]
    }

    pub fn parent(self) -> Option<Self> {
        self.data().parent.map(|id| Self { tree: self.tree, id })
    }

    pub fn first_token(self) -> Option<TokenIndex> {
        self.data().tokens.map(|(first, _)| first)
    }

    pub fn last_token(self) -> Option<TokenIndex> {
        self.data().tokens.map(|(_, last)| last)
    }

    pub fn elements(self) -> impl Iterator<Item = Element> + 't {
        self.data().elements.iter().copied()
    }

    pub fn children(self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        let tree = self.tree;
        self.elements().filter_map(move |element| match element {
            Element::Node(id) => Some(SyntaxNode { tree, id }),
            Element::Token(_) => None,
        })
    }

    /// Tokens owned directly by this node, not by one of its children.
    pub fn child_tokens(self) -> impl Iterator<Item = (TokenIndex, Token)> + 't {
        let tree = self.tree;
        self.elements().filter_map(move |element| match element {
            Element::Token(index) => Some((index, tree.tokens[index.index()])),
            Element::Node(_) => None,
        })
    }

    pub fn child_token(self, kind: SyntaxKind) -> Option<(TokenIndex, Token)> {
        self.child_tokens().find(|(_, token)| token.kind == kind)
    }

    pub fn descendants(self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            let mut children = node.children().collect::<Vec<_>>();
            children.reverse();
            stack.extend(children);
            Some(node)
        })
    }
}

/// Builds a `SyntaxTree` from start/token/finish events.
pub struct Builder {
    text: Box<str>,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    nodes: Arena<NodeData>,
    opened: Vec<NodeId>,
    root: Option<NodeId>,
    last_end: TextSize,
}

impl Builder {
    pub fn new(text: &str, tokens: Vec<Token>, comments: Vec<Comment>) -> Self {
        Self {
            text: text.into(),
            tokens,
            comments,
            nodes: Arena::new(),
            opened: Vec::new(),
            root: None,
            last_end: TextSize::new(0),
        }
    }

    pub fn start_node(&mut self, kind: SyntaxKind) {
        let parent = self.opened.last().copied();
        let id = self.nodes.alloc(NodeData {
            kind,
            range: TextRange::empty(self.last_end),
            tokens: None,
            parent,
            elements: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent].elements.push(Element::Node(id)),
            None => self.root = Some(id),
        }
        self.opened.push(id);
    }

    pub fn token(&mut self, index: TokenIndex) {
        let token = self.tokens[index.index()];
        if let Some(&current) = self.opened.last() {
            self.nodes[current].elements.push(Element::Token(index));
        }
        if token.kind.is_layout() {
            return;
        }

        self.last_end = token.range.end();
        for &id in &self.opened {
            let node = &mut self.nodes[id];
            node.tokens = Some(match node.tokens {
                None => {
                    node.range = token.range;
                    (index, index)
                }
                Some((first, _)) => {
                    node.range = node.range.cover(token.range);
                    (first, index)
                }
            });
        }
    }

    pub fn finish_node(&mut self) {
        self.opened.pop();
    }

    pub fn finish(self) -> SyntaxTree {
        let root = self.root.expect("builder finished without a root node");
        SyntaxTree {
            text: self.text,
            tokens: self.tokens,
            comments: self.comments,
            nodes: self.nodes,
            root,
        }
    }
}
