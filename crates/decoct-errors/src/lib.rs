//! Diagnostics shared by the parser, the patchers and the command line.

use std::fmt::Display;

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use text_size::TextRange;

const DEFAULT_LABEL: &str = "here";

/// An error pointing into the text of one compile stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    message: String,
    range: TextRange,
    label: Option<String>,
    notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self { message: message.into(), range, label: None, notes: Vec::new() }
    }

    /// Replaces the text shown under the annotated range.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a footer line shown below the snippet.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_LABEL)
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let snippet = Snippet::source(text)
            .origin(path)
            .annotation(Level::Error.span(self.range.into()).label(self.label()))
            .fold(true);
        let message = self
            .notes
            .iter()
            .fold(Level::Error.title(&self.message).snippet(snippet), |message, note| {
                message.footer(Level::Note.title(note))
            });
        renderer.render(message)
    }
}
