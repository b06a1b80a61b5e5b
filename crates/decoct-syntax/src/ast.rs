//! Typed views naming the roles of a node's children.

use crate::SyntaxKind::{self, *};
use crate::tree::{Element, SyntaxNode, Token, TokenIndex};

fn cast(node: SyntaxNode<'_>, kind: SyntaxKind) -> Option<SyntaxNode<'_>> {
    (node.kind() == kind).then_some(node)
}

#[derive(Debug, Clone, Copy)]
pub struct ForExpr<'t> {
    pub node: SyntaxNode<'t>,
    pub for_token: Option<(TokenIndex, Token)>,
    pub then_token: Option<(TokenIndex, Token)>,
    pub is_of: bool,
    pub key: Option<SyntaxNode<'t>>,
    pub value: Option<SyntaxNode<'t>>,
    pub target: Option<SyntaxNode<'t>>,
    pub filter: Option<SyntaxNode<'t>>,
    pub body: Option<SyntaxNode<'t>>,
}

impl<'t> ForExpr<'t> {
    pub fn cast(node: SyntaxNode<'t>) -> Option<Self> {
        let node = cast(node, FOR_EXPR)?;
        let mut view = Self {
            node,
            for_token: None,
            then_token: None,
            is_of: false,
            key: None,
            value: None,
            target: None,
            filter: None,
            body: None,
        };
        let mut bindings = Vec::new();
        let mut seen_in = false;
        let mut seen_when = false;

        for element in node.elements() {
            match element {
                Element::Token(index) => {
                    let token = node.tree().tokens()[index.index()];
                    match token.kind {
                        FOR_KW => view.for_token = Some((index, token)),
                        THEN_KW => view.then_token = Some((index, token)),
                        IN_KW | OF_KW => {
                            seen_in = true;
                            view.is_of = token.kind == OF_KW;
                        }
                        WHEN_KW => seen_when = true,
                        _ => {}
                    }
                }
                Element::Node(id) => {
                    let child = node.tree().node(id);
                    if view.for_token.is_none() {
                        view.body = Some(child);
                    } else if !seen_in {
                        bindings.push(child);
                    } else if view.target.is_none() {
                        view.target = Some(child);
                    } else if seen_when && view.filter.is_none() {
                        view.filter = Some(child);
                    } else {
                        view.body = Some(child);
                    }
                }
            }
        }

        let mut bindings = bindings.into_iter();
        let first = bindings.next();
        let second = bindings.next();
        if view.is_of {
            view.key = first;
            view.value = second;
        } else {
            view.value = first;
            view.key = second;
        }
        Some(view)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IfExpr<'t> {
    pub node: SyntaxNode<'t>,
    pub if_token: Option<(TokenIndex, Token)>,
    pub then_token: Option<(TokenIndex, Token)>,
    pub else_token: Option<(TokenIndex, Token)>,
    pub is_postfix: bool,
    pub condition: Option<SyntaxNode<'t>>,
    pub consequent: Option<SyntaxNode<'t>>,
    pub alternate: Option<SyntaxNode<'t>>,
}

impl<'t> IfExpr<'t> {
    pub fn cast(node: SyntaxNode<'t>) -> Option<Self> {
        let node = cast(node, IF_EXPR)?;
        let mut view = Self {
            node,
            if_token: None,
            then_token: None,
            else_token: None,
            is_postfix: false,
            condition: None,
            consequent: None,
            alternate: None,
        };

        for element in node.elements() {
            match element {
                Element::Token(index) => {
                    let token = node.tree().tokens()[index.index()];
                    match token.kind {
                        IF_KW if view.if_token.is_none() => view.if_token = Some((index, token)),
                        THEN_KW => view.then_token = Some((index, token)),
                        ELSE_KW => view.else_token = Some((index, token)),
                        _ => {}
                    }
                }
                Element::Node(id) => {
                    let child = node.tree().node(id);
                    if view.if_token.is_none() {
                        view.is_postfix = true;
                        view.consequent = Some(child);
                    } else if view.condition.is_none() {
                        view.condition = Some(child);
                    } else if view.else_token.is_some() {
                        view.alternate = Some(child);
                    } else {
                        view.consequent = Some(child);
                    }
                }
            }
        }
        Some(view)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Function<'t> {
    pub node: SyntaxNode<'t>,
    pub params: Option<SyntaxNode<'t>>,
    pub arrow: Option<(TokenIndex, Token)>,
    pub body: Option<SyntaxNode<'t>>,
}

impl<'t> Function<'t> {
    pub fn cast(node: SyntaxNode<'t>) -> Option<Self> {
        let node = cast(node, FUNCTION)?;
        let arrow = node.child_tokens().find(|(_, token)| matches!(token.kind, ARROW | FAT_ARROW));
        let params = node.children().find(|child| child.kind() == PARAM_LIST);
        let body = node.children().find(|child| child.kind() == BLOCK);
        Some(Self { node, params, arrow, body })
    }

    pub fn is_bound(self) -> bool {
        self.arrow.is_some_and(|(_, token)| token.kind == FAT_ARROW)
    }

    pub fn params(self) -> impl Iterator<Item = Param<'t>> + 't {
        self.params.into_iter().flat_map(|list| list.children()).map(Param::new)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Param<'t> {
    pub node: SyntaxNode<'t>,
    pub binding: SyntaxNode<'t>,
    pub default: Option<SyntaxNode<'t>>,
}

impl<'t> Param<'t> {
    fn new(node: SyntaxNode<'t>) -> Self {
        if node.kind() == DEFAULT_PARAM {
            let mut children = node.children();
            let binding = children.next().unwrap_or(node);
            let default = children.next();
            Self { node, binding, default }
        } else {
            Self { node, binding: node, default: None }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Assign<'t> {
    pub node: SyntaxNode<'t>,
    pub lhs: Option<SyntaxNode<'t>>,
    pub rhs: Option<SyntaxNode<'t>>,
    pub is_existence: bool,
}

impl<'t> Assign<'t> {
    pub fn cast(node: SyntaxNode<'t>) -> Option<Self> {
        if !matches!(node.kind(), ASSIGN | EXISTS_ASSIGN) {
            return None;
        }
        let mut children = node.children();
        Some(Self {
            node,
            lhs: children.next(),
            rhs: children.next(),
            is_existence: node.kind() == EXISTS_ASSIGN,
        })
    }
}

/// Name of an identifier or `@name` node.
pub fn name_of(node: SyntaxNode<'_>) -> Option<&str> {
    match node.kind() {
        IDENT => Some(node.text()),
        THIS_MEMBER => node.child_token(NAME).map(|(index, _)| node.tree().token_text(index)),
        _ => None,
    }
}
