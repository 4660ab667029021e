//! Batch import into the current document buffer.
//!
//! Two policies:
//!
//! * [`DocumentLoader::import`] is all-or-nothing. Every extension is
//!   checked, then every file parsed, and only then is the buffer touched.
//!   Any error leaves the current [`Document`] exactly as it was.
//! * [`DocumentLoader::import_lenient`] skips files that fail, reports them,
//!   and updates the buffer if at least one file loaded.
//!
//! Multiple files are joined with [`BATCH_SEPARATOR`].

use crate::document::{Document, ImportMode, BATCH_SEPARATOR};
use crate::error::ScrawlError;
use crate::pipeline::input::{self, SourceFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A file left out of a lenient import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of [`DocumentLoader::import_lenient`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

impl ImportReport {
    /// Whether the buffer was updated.
    pub fn changed(&self) -> bool {
        !self.imported.is_empty()
    }
}

/// Owns the current document buffer.
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    document: Document,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Replace the buffer with typed or pasted text.
    pub fn set_text(&mut self, text: &str) {
        self.document = Document::from_text(text);
    }

    pub fn clear(&mut self) {
        self.document = Document::default();
    }

    /// Strict batch import. An empty `paths` slice is a no-op.
    pub fn import<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        mode: ImportMode,
    ) -> Result<&Document, ScrawlError> {
        if paths.is_empty() {
            return Ok(&self.document);
        }
        for path in paths {
            SourceFormat::from_path(path.as_ref())?;
        }

        let texts = paths
            .iter()
            .map(|p| input::load_file(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        self.document = mode.combine(&self.document, &texts.join(BATCH_SEPARATOR));
        info!(
            "Imported {} file(s) ({:?}), document now {} chars",
            paths.len(),
            mode,
            self.document.char_count()
        );
        Ok(&self.document)
    }

    /// Import what can be imported; report the rest.
    pub fn import_lenient<P: AsRef<Path>>(&mut self, paths: &[P], mode: ImportMode) -> ImportReport {
        let mut report = ImportReport::default();
        let mut texts = Vec::new();

        for path in paths {
            let path: &Path = path.as_ref();
            match input::load_file(path) {
                Ok(text) => {
                    texts.push(text);
                    report.imported.push(path.to_path_buf());
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.skipped.push(SkippedFile {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if report.changed() {
            self.document = mode.combine(&self.document, &texts.join(BATCH_SEPARATOR));
            info!(
                "Imported {}/{} file(s), document now {} chars",
                report.imported.len(),
                paths.len(),
                self.document.char_count()
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::APPEND_SEPARATOR;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn batch_uses_separator() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.txt", "first");
        let b = write(dir.path(), "b.txt", "second");

        let mut loader = DocumentLoader::new();
        loader.import(&[a, b], ImportMode::Replace).unwrap();
        assert_eq!(loader.document().text(), format!("first{BATCH_SEPARATOR}second"));
    }

    #[test]
    fn unsupported_file_leaves_buffer_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.txt", "keep me out");
        let rtf = write(dir.path(), "letter.rtf", "{\\rtf1}");

        let mut loader = DocumentLoader::new();
        loader.set_text("original");
        let err = loader.import(&[good, rtf], ImportMode::Replace).unwrap_err();
        assert!(matches!(err, ScrawlError::UnsupportedFormat { .. }));
        assert_eq!(loader.document().text(), "original");
    }

    #[test]
    fn missing_file_leaves_buffer_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.txt", "new");
        let missing = dir.path().join("gone.txt");

        let mut loader = DocumentLoader::new();
        loader.set_text("original");
        assert!(loader.import(&[good, missing], ImportMode::Append).is_err());
        assert_eq!(loader.document().text(), "original");
    }

    #[test]
    fn append_adds_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.txt", "more");

        let mut loader = DocumentLoader::new();
        loader.set_text("start");
        loader.import(&[a], ImportMode::Append).unwrap();
        assert_eq!(loader.document().text(), format!("start{APPEND_SEPARATOR}more"));
    }

    #[test]
    fn lenient_skips_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.txt", "alpha");
        let rtf = write(dir.path(), "b.rtf", "nope");
        let c = write(dir.path(), "c.txt", "gamma");

        let mut loader = DocumentLoader::new();
        let report = loader.import_lenient(&[a, rtf.clone(), c], ImportMode::Replace);
        assert_eq!(report.imported.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, rtf);
        assert_eq!(loader.document().text(), format!("alpha{BATCH_SEPARATOR}gamma"));
    }

    #[test]
    fn lenient_with_nothing_loaded_keeps_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let rtf = write(dir.path(), "b.rtf", "nope");

        let mut loader = DocumentLoader::new();
        loader.set_text("original");
        let report = loader.import_lenient(&[rtf], ImportMode::Replace);
        assert!(!report.changed());
        assert_eq!(loader.document().text(), "original");
    }
}
