//! Rewrites source text into JavaScript through localized edits.
//!
//! Every construct of the syntax tree gets a patcher. Patchers record
//! inserts, removals and overwrites against the original buffer in an
//! [`Editor`]; the output is the buffer rendered with those edits. A compile
//! runs in two stages, each over a fresh parse of its input: `normalize`
//! rewrites postfix loops and conditionals into prefix form, `main` produces
//! JavaScript.

mod context;
mod editor;
mod error;
pub mod navigate;
mod patcher;
mod scope;
mod stages;

pub use context::PatchContext;
pub use editor::Editor;
pub use error::{BindingError, CompileError, EditError, PatchError, Stage};
pub use patcher::{NodeInfo, NodePatch, PatchState, Patcher, unwrap_parens};
pub use scope::{Scope, ScopeData, Scopes, count_usages};

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Last stage to run.
    pub stage: Stage,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { stage: Stage::Main }
    }
}

pub fn compile(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let normalized = run_stage(Stage::Normalize, source)?;
    if options.stage == Stage::Normalize {
        return Ok(normalized);
    }
    run_stage(Stage::Main, &normalized)
}

fn run_stage(stage: Stage, text: &str) -> Result<String, CompileError> {
    let _span = tracing::debug_span!("stage", %stage).entered();

    let parse = decoct_parse::parse(text);
    if !parse.errors().is_empty() {
        tracing::debug!(errors = parse.errors().len(), "parse failed");
        let (_, diagnostics) = parse.into_parts();
        return Err(CompileError::Parse { stage, text: text.to_owned(), diagnostics });
    }

    let result = match stage {
        Stage::Normalize => stages::run(parse.tree(), stage, stages::normalize::build),
        Stage::Main => stages::run(parse.tree(), stage, stages::main::build),
    };
    result.map_err(|error| CompileError::Patch { stage, text: text.to_owned(), error })
}
