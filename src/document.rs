//! The loaded text buffer.

use serde::{Deserialize, Serialize};

/// Separator placed between files in a batch import.
pub const BATCH_SEPARATOR: &str = "\n\n==============================\n\n";

/// Separator placed between the existing buffer and newly imported text in
/// [`ImportMode::Append`].
pub const APPEND_SEPARATOR: &str = "\n\n";

/// An ordered sequence of text lines.
///
/// Created by the loader from one or more source files and never mutated
/// afterwards; a new import builds a new `Document`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    /// Build a document from raw text. Line endings are normalised to `\n`.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        let lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The full text, lines joined by `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Number of Unicode scalar values in [`Document::text`].
    pub fn char_count(&self) -> usize {
        let newlines = self.lines.len().saturating_sub(1);
        self.lines.iter().map(|l| l.chars().count()).sum::<usize>() + newlines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }
}

/// How newly imported text combines with the current buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImportMode {
    /// Discard the current buffer. (default)
    #[default]
    Replace,
    /// Keep the current buffer and add the new text after a blank line.
    Append,
}

impl ImportMode {
    /// Combine `current` with freshly loaded `incoming` text.
    pub fn combine(self, current: &Document, incoming: &str) -> Document {
        match self {
            ImportMode::Append if !current.is_empty() => {
                let mut text = current.text();
                text.push_str(APPEND_SEPARATOR);
                text.push_str(incoming);
                Document::from_text(&text)
            }
            _ => Document::from_text(incoming),
        }
    }
}
