//! The contract every construct's patcher follows.
//!
//! A patcher is initialized exactly once, top-down, then patched exactly
//! once, either as a statement or as an expression. Edits go through the
//! shared [`PatchContext`]; a parent finishes its own edits only after the
//! children it wraps or relocates are patched.

use decoct_syntax::SyntaxKind::{self, *};
use decoct_syntax::{NodeId, SyntaxNode, TextRange, TokenIndex};

use crate::context::PatchContext;
use crate::error::PatchError;
use crate::scope::Scope;

/// Where a node sits in the source and in the scope chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub node: NodeId,
    pub kind: SyntaxKind,
    /// The construct's own text.
    pub content: TextRange,
    /// `content` plus any parentheses around it.
    pub outer: TextRange,
    pub content_tokens: Option<(TokenIndex, TokenIndex)>,
    pub outer_tokens: Option<(TokenIndex, TokenIndex)>,
    /// Scope the construct is evaluated in.
    pub scope: Scope,
    pub requires_expression: bool,
}

impl NodeInfo {
    pub fn new(node: SyntaxNode<'_>, outer: SyntaxNode<'_>, scope: Scope) -> Self {
        let tokens = |node: SyntaxNode<'_>| node.first_token().zip(node.last_token());
        Self {
            node: node.id(),
            kind: node.kind(),
            content: node.range(),
            outer: outer.range(),
            content_tokens: tokens(node),
            outer_tokens: tokens(outer),
            scope,
            requires_expression: false,
        }
    }

    pub fn is_parenthesized(&self) -> bool {
        self.outer != self.content
    }

    /// Adds a statement right before this one: on its own line at the same
    /// indentation, or separated inline when the construct shares its line.
    pub fn insert_line_before(
        &self,
        cx: &mut PatchContext<'_>,
        line: &str,
    ) -> Result<(), PatchError> {
        let text = self.line_text(cx, line);
        cx.editor.insert(self.outer.start(), text)?;
        Ok(())
    }

    /// Like [`NodeInfo::insert_line_before`], but ahead of anything already
    /// inserted at the start of the construct.
    pub fn prepend_line_before(
        &self,
        cx: &mut PatchContext<'_>,
        line: &str,
    ) -> Result<(), PatchError> {
        let text = self.line_text(cx, line);
        cx.editor.prepend(self.outer.start(), text)?;
        Ok(())
    }

    fn line_text(&self, cx: &PatchContext<'_>, line: &str) -> String {
        match cx.line_indent(self.outer.start()) {
            Some(indent) => format!("{line}\n{indent}"),
            None => format!("{line}{}", cx.inline_separator()),
        }
    }
}

/// Steps through parentheses. Returns the wrapped construct and the
/// outermost parenthesized node around it.
pub fn unwrap_parens(node: SyntaxNode<'_>) -> (SyntaxNode<'_>, SyntaxNode<'_>) {
    let mut inner = node;
    while inner.kind() == PAREN_EXPR {
        match inner.children().next() {
            Some(child) => inner = child,
            None => break,
        }
    }
    (inner, node)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchState {
    Constructed,
    Initialized,
    Patched,
}

/// Behaviour of one construct. `K` is the closed set of constructs of a
/// stage; children are patchers over the same set.
pub trait NodePatch<K> {
    /// Runs before the children are initialized. Facts about the subtree and
    /// expression requirements of children are set up here.
    fn initialize(
        &mut self,
        _info: &NodeInfo,
        _cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        Ok(())
    }

    /// Runs after the children are initialized.
    fn finish_initialize(
        &mut self,
        _info: &NodeInfo,
        _cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        Ok(())
    }

    fn children_mut(&mut self) -> Vec<&mut Patcher<K>>;

    fn can_patch_as_expression(&self, _info: &NodeInfo) -> bool {
        true
    }

    fn patch_as_expression(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError>;

    fn patch_as_statement(
        &mut self,
        info: &NodeInfo,
        cx: &mut PatchContext<'_>,
    ) -> Result<(), PatchError> {
        self.patch_as_expression(info, cx)
    }
}

#[derive(Debug)]
pub struct Patcher<K> {
    pub info: NodeInfo,
    state: PatchState,
    pub kind: K,
}

impl<K: NodePatch<K>> Patcher<K> {
    pub fn new(info: NodeInfo, kind: K) -> Self {
        Self { info, state: PatchState::Constructed, kind }
    }

    pub fn state(&self) -> PatchState {
        self.state
    }

    /// Asks for expression mode. Parents decide this while they initialize,
    /// before the child is initialized itself.
    pub fn set_requires_expression(&mut self) {
        debug_assert_eq!(
            self.state,
            PatchState::Constructed,
            "{} asked for an expression after initialization",
            self.info.kind.describe()
        );
        self.info.requires_expression = true;
    }

    fn contract_violation(&self, message: impl Into<String>) -> PatchError {
        PatchError::ContractViolation { message: message.into(), range: self.info.content }
    }

    pub fn error(&self, message: impl Into<String>) -> PatchError {
        PatchError::Patch { message: message.into(), range: self.info.content }
    }

    pub fn initialize(&mut self, cx: &mut PatchContext<'_>) -> Result<(), PatchError> {
        if self.state != PatchState::Constructed {
            return Err(self.contract_violation(format!(
                "{} initialized twice",
                self.info.kind.describe()
            )));
        }

        self.kind.initialize(&self.info, cx)?;
        for child in self.kind.children_mut() {
            child.initialize(cx)?;
        }
        self.kind.finish_initialize(&self.info, cx)?;

        self.state = PatchState::Initialized;
        Ok(())
    }

    fn begin_patch(&self) -> Result<(), PatchError> {
        match self.state {
            PatchState::Initialized => Ok(()),
            PatchState::Constructed => Err(self.contract_violation(format!(
                "{} patched before initialization",
                self.info.kind.describe()
            ))),
            PatchState::Patched => Err(self.contract_violation(format!(
                "{} patched twice",
                self.info.kind.describe()
            ))),
        }
    }

    pub fn can_patch_as_expression(&self) -> bool {
        self.kind.can_patch_as_expression(&self.info)
    }

    /// Patches in the mode the parent asked for.
    pub fn patch(&mut self, cx: &mut PatchContext<'_>) -> Result<(), PatchError> {
        if self.info.requires_expression {
            self.patch_as_expression(cx)
        } else {
            self.patch_as_statement(cx)
        }
    }

    pub fn patch_as_expression(&mut self, cx: &mut PatchContext<'_>) -> Result<(), PatchError> {
        self.begin_patch()?;
        if !self.can_patch_as_expression() {
            return Err(self.contract_violation(format!(
                "{} cannot be used as an expression",
                self.info.kind.describe()
            )));
        }

        tracing::trace!(kind = ?self.info.kind, range = ?self.info.content, "patch as expression");
        self.kind.patch_as_expression(&self.info, cx)?;
        self.state = PatchState::Patched;
        Ok(())
    }

    pub fn patch_as_statement(&mut self, cx: &mut PatchContext<'_>) -> Result<(), PatchError> {
        self.begin_patch()?;

        tracing::trace!(kind = ?self.info.kind, range = ?self.info.content, "patch as statement");
        self.kind.patch_as_statement(&self.info, cx)?;
        self.state = PatchState::Patched;
        Ok(())
    }

    /// Patches and returns the rendered text of the outer range, including
    /// text inserted at its start.
    pub fn patch_and_render(&mut self, cx: &mut PatchContext<'_>) -> Result<String, PatchError> {
        self.patch(cx)?;
        Ok(cx.editor.render_range_inclusive(self.info.outer)?)
    }

    /// Original text of the construct, parentheses included.
    pub fn slice<'s>(&self, cx: &PatchContext<'s>) -> &'s str {
        cx.slice(self.info.outer)
    }

    /// Wraps the construct in parentheses unless it already has them.
    pub fn surround_in_parens(&self, cx: &mut PatchContext<'_>) -> Result<(), PatchError> {
        if self.info.is_parenthesized() {
            return Ok(());
        }
        cx.editor.prepend(self.info.outer.start(), "(")?;
        cx.editor.insert(self.info.outer.end(), ")")?;
        Ok(())
    }

    pub fn insert_line_before(
        &self,
        cx: &mut PatchContext<'_>,
        line: &str,
    ) -> Result<(), PatchError> {
        self.info.insert_line_before(cx, line)
    }

    pub fn prepend_line_before(
        &self,
        cx: &mut PatchContext<'_>,
        line: &str,
    ) -> Result<(), PatchError> {
        self.info.prepend_line_before(cx, line)
    }
}

/// Declares a closed set of constructs and forwards [`NodePatch`] to the
/// variant types.
macro_rules! patcher_kinds {
    ($(#[$attr:meta])* $vis:vis enum $name:ident { $($variant:ident($ty:ty)),* $(,)? }) => {
        $(#[$attr])*
        $vis enum $name {
            $($variant($ty)),*
        }

        impl $crate::patcher::NodePatch<$name> for $name {
            fn initialize(
                &mut self,
                info: &$crate::patcher::NodeInfo,
                cx: &mut $crate::context::PatchContext<'_>,
            ) -> Result<(), $crate::error::PatchError> {
                match self {
                    $(Self::$variant(inner) => {
                        $crate::patcher::NodePatch::<$name>::initialize(inner, info, cx)
                    }),*
                }
            }

            fn finish_initialize(
                &mut self,
                info: &$crate::patcher::NodeInfo,
                cx: &mut $crate::context::PatchContext<'_>,
            ) -> Result<(), $crate::error::PatchError> {
                match self {
                    $(Self::$variant(inner) => {
                        $crate::patcher::NodePatch::<$name>::finish_initialize(inner, info, cx)
                    }),*
                }
            }

            fn children_mut(&mut self) -> Vec<&mut $crate::patcher::Patcher<$name>> {
                match self {
                    $(Self::$variant(inner) => {
                        $crate::patcher::NodePatch::<$name>::children_mut(inner)
                    }),*
                }
            }

            fn can_patch_as_expression(&self, info: &$crate::patcher::NodeInfo) -> bool {
                match self {
                    $(Self::$variant(inner) => {
                        $crate::patcher::NodePatch::<$name>::can_patch_as_expression(inner, info)
                    }),*
                }
            }

            fn patch_as_expression(
                &mut self,
                info: &$crate::patcher::NodeInfo,
                cx: &mut $crate::context::PatchContext<'_>,
            ) -> Result<(), $crate::error::PatchError> {
                match self {
                    $(Self::$variant(inner) => {
                        $crate::patcher::NodePatch::<$name>::patch_as_expression(inner, info, cx)
                    }),*
                }
            }

            fn patch_as_statement(
                &mut self,
                info: &$crate::patcher::NodeInfo,
                cx: &mut $crate::context::PatchContext<'_>,
            ) -> Result<(), $crate::error::PatchError> {
                match self {
                    $(Self::$variant(inner) => {
                        $crate::patcher::NodePatch::<$name>::patch_as_statement(inner, info, cx)
                    }),*
                }
            }
        }
    };
}

pub(crate) use patcher_kinds;

/// Children that exist, in the given order.
pub(crate) fn present<K, const N: usize>(
    children: [Option<&mut Box<Patcher<K>>>; N],
) -> Vec<&mut Patcher<K>> {
    children.into_iter().flatten().map(|child| &mut **child).collect()
}

#[cfg(test)]
mod tests {
    use decoct_syntax::TextSize;

    use super::*;
    use crate::error::Stage;
    use crate::stages::main::build;

    #[test]
    fn lifecycle_is_enforced() {
        let parse = decoct_parse::parse("a = 1\n");
        let tree = parse.tree();
        let mut cx = PatchContext::new(tree, Stage::Main);
        let mut patcher = build(tree.root(), &cx.scopes).unwrap();
        let range = TextRange::new(TextSize::new(0), TextSize::new(5));
        assert_eq!(patcher.state(), PatchState::Constructed);

        let error = patcher.patch(&mut cx).unwrap_err();
        assert!(matches!(error, PatchError::ContractViolation { .. }), "{error:?}");
        assert_eq!(error.to_string(), "block patched before initialization");
        assert_eq!(error.range(), range);
        assert_eq!(patcher.state(), PatchState::Constructed);

        patcher.initialize(&mut cx).unwrap();
        let error = patcher.initialize(&mut cx).unwrap_err();
        assert_eq!(error.to_string(), "block initialized twice");
        assert_eq!(patcher.state(), PatchState::Initialized);

        patcher.patch(&mut cx).unwrap();
        let error = patcher.patch(&mut cx).unwrap_err();
        assert_eq!(error.to_string(), "block patched twice");
        assert_eq!(patcher.state(), PatchState::Patched);
        assert_eq!(cx.editor.render().unwrap(), "let a = 1;\n");
    }
}
