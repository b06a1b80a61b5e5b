//! Name bookkeeping for introducing temporaries.
//!
//! One scope per program and per function, the scopes of the output
//! language. Built once per tree, before any patcher runs.

use decoct_syntax::SyntaxKind::*;
use decoct_syntax::ast::{Assign, ForExpr, Function};
use decoct_syntax::{NodeId, SyntaxNode, SyntaxTree};
use la_arena::{Arena, Idx};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::BindingError;

const MAX_ATTEMPTS: usize = 10_000;

pub type Scope = Idx<ScopeData>;

#[derive(Debug)]
pub struct ScopeData {
    parent: Option<Scope>,
    node: NodeId,
    declared: FxHashSet<String>,
    referenced: FxHashSet<String>,
    claimed: FxHashSet<String>,
}

impl ScopeData {
    fn new(parent: Option<Scope>, node: SyntaxNode<'_>) -> Self {
        Self {
            parent,
            node: node.id(),
            declared: FxHashSet::default(),
            referenced: FxHashSet::default(),
            claimed: FxHashSet::default(),
        }
    }
}

#[derive(Debug)]
pub struct Scopes {
    scopes: Arena<ScopeData>,
    by_node: FxHashMap<NodeId, Scope>,
    /// Identifiers that introduce their name in their scope.
    declarations: FxHashSet<NodeId>,
    root: Scope,
}

impl Scopes {
    pub fn build(tree: &SyntaxTree) -> Self {
        let mut scopes = Arena::new();
        let root_node = tree.root();
        let root = scopes.alloc(ScopeData::new(None, root_node));

        let mut by_node = FxHashMap::default();
        by_node.insert(root_node.id(), root);

        let mut scopes = Self { scopes, by_node, declarations: FxHashSet::default(), root };
        for child in root_node.children() {
            scopes.walk(child, root);
        }
        scopes
    }

    fn alloc(&mut self, parent: Scope, node: SyntaxNode<'_>) -> Scope {
        let scope = self.scopes.alloc(ScopeData::new(Some(parent), node));
        self.by_node.insert(node.id(), scope);
        scope
    }

    fn walk(&mut self, node: SyntaxNode<'_>, scope: Scope) {
        match node.kind() {
            FUNCTION => {
                let inner = self.alloc(scope, node);
                let Some(function) = Function::cast(node) else { return };
                for param in function.params() {
                    if param.binding.kind() == IDENT {
                        self.scopes[inner].declared.insert(param.binding.text().to_owned());
                    }
                    if let Some(default) = param.default {
                        self.walk(default, inner);
                    }
                }
                if let Some(body) = function.body {
                    self.walk(body, inner);
                }
            }
            ASSIGN | EXISTS_ASSIGN => {
                let Some(assign) = Assign::cast(node) else { return };
                if let Some(lhs) = assign.lhs {
                    self.bind(lhs, scope);
                }
                if let Some(rhs) = assign.rhs {
                    self.walk(rhs, scope);
                }
            }
            FOR_EXPR => {
                let Some(view) = ForExpr::cast(node) else { return };
                for child in node.children() {
                    if Some(child) == view.key || Some(child) == view.value {
                        self.bind(child, scope);
                    } else {
                        self.walk(child, scope);
                    }
                }
            }
            IDENT => {
                let name = node.text();
                let chain = self.chain(scope).collect::<Vec<_>>();
                for scope in chain {
                    self.scopes[scope].referenced.insert(name.to_owned());
                }
            }
            _ => {
                for child in node.children() {
                    self.walk(child, scope);
                }
            }
        }
    }

    fn bind(&mut self, target: SyntaxNode<'_>, scope: Scope) {
        match target.kind() {
            IDENT => {
                let name = target.text();
                if !self.is_declared(scope, name) {
                    self.declarations.insert(target.id());
                }
                self.scopes[scope].declared.insert(name.to_owned());
            }
            ARRAY => {
                for element in target.children() {
                    self.bind(element, scope);
                }
            }
            _ => self.walk(target, scope),
        }
    }

    pub fn root(&self) -> Scope {
        self.root
    }

    /// Scope introduced by `node` itself, for programs and functions.
    pub fn scope_of(&self, node: SyntaxNode<'_>) -> Option<Scope> {
        self.by_node.get(&node.id()).copied()
    }

    /// Innermost scope strictly enclosing `node`; the root for the root.
    pub fn enclosing(&self, node: SyntaxNode<'_>) -> Scope {
        std::iter::successors(node.parent(), |node| node.parent())
            .find_map(|ancestor| self.scope_of(ancestor))
            .unwrap_or(self.root)
    }

    pub fn node(&self, scope: Scope) -> NodeId {
        self.scopes[scope].node
    }

    /// Whether every use of the name bound by `ident` within its scope lies
    /// in the block containing `ident`, so a declaration there is visible
    /// to all of them.
    pub fn is_block_local(&self, ident: SyntaxNode<'_>) -> bool {
        let block = std::iter::successors(ident.parent(), |node| node.parent())
            .find(|node| node.kind() == BLOCK);
        let Some(block) = block else { return true };
        if is_scope_body(block) {
            return true;
        }

        let name = ident.text();
        let scope = ident.tree().node(self.node(self.enclosing(ident)));
        scope
            .descendants()
            .filter(|node| node.kind() == IDENT && node.text() == name)
            .all(|node| block.range().contains_range(node.range()))
    }

    pub fn chain(&self, scope: Scope) -> impl Iterator<Item = Scope> + '_ {
        std::iter::successors(Some(scope), move |&scope| self.scopes[scope].parent)
    }

    pub fn is_declared(&self, scope: Scope, name: &str) -> bool {
        self.chain(scope).any(|scope| self.scopes[scope].declared.contains(name))
    }

    /// Declared, read or claimed anywhere in the chain.
    pub fn is_bound(&self, scope: Scope, name: &str) -> bool {
        self.chain(scope).any(|scope| {
            let data = &self.scopes[scope];
            data.declared.contains(name)
                || data.referenced.contains(name)
                || data.claimed.contains(name)
        })
    }

    /// Whether this identifier is the first binding of its name.
    pub fn is_declaration(&self, node: SyntaxNode<'_>) -> bool {
        self.declarations.contains(&node.id())
    }

    /// Reserves `hint`, or `hint` with the smallest numeric suffix that is
    /// still free in the chain. Claims are never released.
    pub fn claim_free_binding(&mut self, scope: Scope, hint: &str) -> Result<String, BindingError> {
        for attempt in 0..MAX_ATTEMPTS {
            let name = if attempt == 0 { hint.to_owned() } else { format!("{hint}{attempt}") };
            if !self.is_bound(scope, &name) {
                self.scopes[scope].claimed.insert(name.clone());
                return Ok(name);
            }
        }
        Err(BindingError { hint: hint.to_owned() })
    }
}

/// Whether `block` is the body of a program or function rather than of a
/// conditional or loop.
pub fn is_scope_body(block: SyntaxNode<'_>) -> bool {
    block.parent().is_none_or(|parent| matches!(parent.kind(), PROGRAM | FUNCTION))
}

/// Number of identifier reads and writes of `name` within `node`.
pub fn count_usages(node: SyntaxNode<'_>, name: &str) -> usize {
    node.descendants().filter(|node| node.kind() == IDENT && node.text() == name).count()
}

#[cfg(test)]
impl Scopes {
    /// Claims `hint` and every suffixed form of it.
    pub(crate) fn exhaust(&mut self, scope: Scope, hint: &str) {
        let taken = std::iter::once(hint.to_owned())
            .chain((1..MAX_ATTEMPTS).map(|attempt| format!("{hint}{attempt}")));
        self.scopes[scope].claimed.extend(taken);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(text: &str) -> SyntaxTree {
        let parse = decoct_parse::parse(text);
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        parse.into_parts().0
    }

    fn function(tree: &SyntaxTree) -> SyntaxNode<'_> {
        tree.root().descendants().find(|node| node.kind() == FUNCTION).unwrap()
    }

    #[test]
    fn claims_skip_declared_and_referenced_names() {
        let tree = tree("a = 1\nf = (b) ->\n  a + c\n");
        let mut scopes = Scopes::build(&tree);
        let inner = scopes.scope_of(function(&tree)).unwrap();

        assert_eq!(scopes.claim_free_binding(inner, "a").unwrap(), "a1");
        assert_eq!(scopes.claim_free_binding(inner, "a").unwrap(), "a2");
        assert_eq!(scopes.claim_free_binding(inner, "b").unwrap(), "b1");
        assert_eq!(scopes.claim_free_binding(inner, "c").unwrap(), "c1");
        assert_eq!(scopes.claim_free_binding(inner, "d").unwrap(), "d");
    }

    #[test]
    fn reads_propagate_to_enclosing_scopes() {
        let tree = tree("f = ->\n  value\n");
        let mut scopes = Scopes::build(&tree);
        let root = scopes.root();

        assert!(scopes.is_bound(root, "value"));
        assert_eq!(scopes.claim_free_binding(root, "value").unwrap(), "value1");
    }

    #[test]
    fn outer_claims_are_visible_to_inner_scopes() {
        let tree = tree("f = ->\n  1\n");
        let mut scopes = Scopes::build(&tree);
        let root = scopes.root();
        let inner = scopes.scope_of(function(&tree)).unwrap();

        assert_eq!(scopes.claim_free_binding(root, "array").unwrap(), "array");
        assert_eq!(scopes.claim_free_binding(inner, "array").unwrap(), "array1");
        assert_eq!(scopes.enclosing(function(&tree)), root);
    }

    #[test]
    fn first_assignment_declares() {
        let tree = tree("a = 1\na = 2\n(a) ->\n  a = 3\n");
        let scopes = Scopes::build(&tree);

        let declarations = tree
            .root()
            .descendants()
            .filter(|node| node.kind() == IDENT && scopes.is_declaration(*node))
            .map(|node| node.range().start().into())
            .collect::<Vec<u32>>();
        assert_eq!(declarations, vec![0]);
    }

    #[test]
    fn names_used_after_their_block_are_not_local() {
        let tree = tree("if c\n  a = 1\n  b = a\nf(a)\ng = ->\n  if c\n    d = 1\n");
        let scopes = Scopes::build(&tree);
        let declaration = |name: &str| {
            tree.root()
                .descendants()
                .find(|node| node.kind() == IDENT && node.text() == name)
                .filter(|node| scopes.is_declaration(*node))
                .unwrap()
        };

        assert!(!scopes.is_block_local(declaration("a")));
        assert!(scopes.is_block_local(declaration("b")));
        assert!(scopes.is_block_local(declaration("d")));
        assert!(scopes.is_block_local(declaration("g")));
    }

    #[test]
    fn exhausted_names_are_an_error() {
        let tree = tree("x = 1\n");
        let mut scopes = Scopes::build(&tree);
        let root = scopes.root();
        scopes.exhaust(root, "hint");

        let error = scopes.claim_free_binding(root, "hint").unwrap_err();
        assert_eq!(error, BindingError { hint: "hint".to_owned() });
        assert_eq!(error.to_string(), "cannot find a free binding for 'hint'");

        scopes.scopes[root].claimed.remove("hint9999");
        assert_eq!(scopes.claim_free_binding(root, "hint").unwrap(), "hint9999");
    }

    #[test]
    fn usages_are_counted_in_subtree() {
        let tree = tree("a = a + b\nf(a)\n");
        assert_eq!(count_usages(tree.root(), "a"), 3);
        assert_eq!(count_usages(tree.root(), "b"), 1);
        assert_eq!(count_usages(tree.root(), "f"), 1);
    }
}
