use std::fmt::Display;

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
use line_index::{LineCol, LineIndex};
pub use text_size::{TextRange, TextSize};

/// A problem found in a declaration dump, anchored at the text it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    message: String,
    range: TextRange,
    label: String,
    notes: Vec<String>,
}

impl Diagnostic {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self { message: message.into(), range, label: "here".to_owned(), notes: Vec::new() }
    }

    /// Replaces the text shown under the offending span.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Builds a diagnostic from a 1-based line/column position, the convention used by
    /// `serde_json` errors. Positions past the end of `text` are clamped to it.
    pub fn at_line_col(message: impl Into<String>, text: &str, line: usize, column: usize) -> Self {
        let index = LineIndex::new(text);
        let line_col = LineCol {
            line: line.saturating_sub(1) as u32,
            col: column.saturating_sub(1) as u32,
        };
        let end = TextSize::of(text);
        let offset = index.offset(line_col).map_or(end, |offset| offset.min(end));

        Self::error(message, TextRange::empty(offset))
    }

    /// Renders the diagnostic against the dump it came from, with `path` as origin.
    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let annotation = Level::Error.span(self.range.into()).label(&self.label);
        let snippet = Snippet::source(text).origin(path).annotation(annotation).fold(true);

        let message = self
            .notes
            .iter()
            .fold(Level::Error.title(&self.message).snippet(snippet), |message, note| {
                message.footer(Level::Note.title(note))
            });
        renderer.render(message)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
