use std::fmt;

use decoct_errors::Diagnostic;
use text_size::TextRange;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit at {new:?} overlaps an edit at {existing:?} without nesting")]
    Overlapping { existing: TextRange, new: TextRange },
    #[error("edit at {range:?} is out of bounds or not on a character boundary")]
    Render { range: TextRange },
}

impl EditError {
    pub fn range(&self) -> TextRange {
        match self {
            Self::Overlapping { new, .. } => *new,
            Self::Render { range } => *range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot find a free binding for '{hint}'")]
pub struct BindingError {
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// A patcher was driven in a mode or order it does not support.
    #[error("{message}")]
    ContractViolation { message: String, range: TextRange },
    #[error("{message}")]
    Patch { message: String, range: TextRange },
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("{error}")]
    Binding {
        #[source]
        error: BindingError,
        /// The construct that needed the name.
        range: TextRange,
    },
}

impl PatchError {
    pub fn range(&self) -> TextRange {
        match self {
            Self::ContractViolation { range, .. }
            | Self::Patch { range, .. }
            | Self::Binding { range, .. } => *range,
            Self::Edit(error) => error.range(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::ContractViolation { .. } => "not supported in this position",
            Self::Patch { .. } => "cannot be rewritten",
            Self::Edit(_) => "conflicting rewrite",
            Self::Binding { .. } => "needs a temporary name",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string(), self.range()).with_label(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Source to source in the input language: postfix forms become prefix
    /// forms.
    Normalize,
    /// Normalized source to JavaScript.
    Main,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normalize => "normalize",
            Self::Main => "main",
        })
    }
}

/// Failure of one stage. Carries the text the stage was run on, since
/// diagnostics of later stages point into intermediate output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{stage} stage: {} syntax error(s)", .diagnostics.len())]
    Parse { stage: Stage, text: String, diagnostics: Vec<Diagnostic> },
    #[error("{stage} stage: {error}")]
    Patch {
        stage: Stage,
        text: String,
        #[source]
        error: PatchError,
    },
}

impl CompileError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Parse { stage, .. } | Self::Patch { stage, .. } => *stage,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Parse { text, .. } | Self::Patch { text, .. } => text,
        }
    }

    /// Diagnostics pointing into [`CompileError::text`], noting the stage
    /// when it is not the input itself.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostics = match self {
            Self::Parse { diagnostics, .. } => diagnostics.clone(),
            Self::Patch { error, .. } => vec![error.to_diagnostic()],
        };
        match self.stage() {
            Stage::Normalize => diagnostics,
            stage => diagnostics
                .into_iter()
                .map(|diagnostic| {
                    diagnostic.with_note(format!("in the {stage} stage, on normalized source"))
                })
                .collect(),
        }
    }
}
