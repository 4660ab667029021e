//! Error types for the scrawl library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ScrawlError`]: **Fatal** for the operation at hand: the import,
//!   preset action or export cannot proceed at all (unsupported file, corrupt
//!   PDF, invalid parameters, pdfium missing). Returned as `Err(ScrawlError)`.
//!
//! * [`FormatError`]: **Non-fatal**: writing one output format for one chunk
//!   failed, but every other format is unaffected. Stored inside
//!   [`crate::output::FormatOutcome`] so callers see partial success instead
//!   of losing the whole export to one unwritable file.
//!
//! No error here is fatal to the process; a front end reports it and keeps
//! running.

use std::path::PathBuf;
use thiserror::Error;

/// All operation-level errors returned by the scrawl library.
#[derive(Debug, Error)]
pub enum ScrawlError {
    // ── Import errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The file extension is not one the loader understands.
    #[error("Unsupported file format '{extension}' for '{path}'{hint}")]
    UnsupportedFormat {
        path: PathBuf,
        extension: String,
        hint: String,
    },

    /// The file was recognised but its content could not be read.
    #[error("Failed to parse '{path}': {detail}")]
    Parse { path: PathBuf, detail: String },

    // ── Parameter errors ──────────────────────────────────────────────────
    /// A preset parameter is out of range and cannot be auto-corrected.
    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// No preset is stored under the requested name.
    #[error("Preset '{name}' not found. Available: {available}")]
    PresetNotFound { name: String, available: String },

    /// No usable TrueType font could be resolved.
    #[error("Font '{name}' not found in '{dir}'\nDrop a .ttf file into the fonts directory.")]
    FontNotFound { name: String, dir: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Export errors ─────────────────────────────────────────────────────
    /// Export was requested with no text to render.
    #[error("Nothing to export: the document is empty")]
    EmptyDocument,

    /// The handwriting renderer failed.
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Could not create or write an output or storage file.
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some formats were written but at least one failed.
    ///
    /// Returned by [`crate::output::ExportReport::into_result`] when the
    /// caller wants to treat any format failure as an error.
    #[error("{failed}/{total} outputs failed during export")]
    PartialFailure { written: usize, failed: usize, total: usize },

    /// Every requested output failed.
    #[error("All {total} outputs failed.\nFirst error: {first_error}")]
    AllFormatsFailed { total: usize, first_error: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF import, PDF export and handwriting rendering need the pdfium shared library.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium, or\n\
  • place libpdfium next to the binary / in the working directory, or\n\
  • install it on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single output of an export.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum FormatError {
    /// The chunk could not be rendered, so no format was attempted.
    #[error("Part {chunk}: rendering failed: {detail}")]
    RenderFailed { chunk: usize, detail: String },

    /// Page images could not be encoded into the target format.
    #[error("Part {chunk}: {format} encoding failed: {detail}")]
    EncodeFailed {
        chunk: usize,
        format: String,
        detail: String,
    },

    /// The encoded output could not be written to disk.
    #[error("Part {chunk}: writing '{path}' failed: {detail}")]
    WriteFailed {
        chunk: usize,
        path: PathBuf,
        detail: String,
    },
}

impl ScrawlError {
    /// Wrap an I/O failure on `path` as a [`ScrawlError::Write`].
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrawlError::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ScrawlError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
