//! Export results.

use crate::config::ExportFormat;
use crate::error::{FormatError, ScrawlError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of writing one format for one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatOutcome {
    /// 1-indexed chunk number.
    pub chunk: usize,
    pub format: ExportFormat,
    /// Files written; several when raster pages are split.
    pub files: Vec<PathBuf>,
    /// Set when this output failed. `files` is empty in that case.
    pub error: Option<FormatError>,
}

impl FormatOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub chunks: usize,
    pub pages_rendered: usize,
    pub outputs_written: usize,
    pub outputs_failed: usize,
    pub files_written: usize,
    pub render_duration_ms: u64,
    pub write_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything an export produced, successful or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    pub outcomes: Vec<FormatOutcome>,
    pub stats: ExportStats,
}

impl ExportReport {
    /// Every file written, in task order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .flat_map(|o| o.files.iter().cloned())
            .collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = &FormatError> {
        self.outcomes.iter().filter_map(|o| o.error.as_ref())
    }

    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| !o.is_ok())
    }

    /// Treat any failed output as an error.
    pub fn into_result(self) -> Result<ExportReport, ScrawlError> {
        let total = self.outcomes.len();
        let failed = self.outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed == 0 {
            return Ok(self);
        }
        if failed == total {
            let first_error = self
                .errors()
                .next()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(ScrawlError::AllFormatsFailed { total, first_error });
        }
        Err(ScrawlError::PartialFailure {
            written: total - failed,
            failed,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(chunk: usize, format: ExportFormat, file: &str) -> FormatOutcome {
        FormatOutcome {
            chunk,
            format,
            files: vec![PathBuf::from(file)],
            error: None,
        }
    }

    fn failed(chunk: usize, format: ExportFormat) -> FormatOutcome {
        FormatOutcome {
            chunk,
            format,
            files: vec![],
            error: Some(FormatError::EncodeFailed {
                chunk,
                format: format.to_string(),
                detail: "bad".into(),
            }),
        }
    }

    #[test]
    fn clean_report_passes_through() {
        let report = ExportReport {
            outcomes: vec![ok(1, ExportFormat::Pdf, "a.pdf"), ok(1, ExportFormat::Png, "a.png")],
            stats: ExportStats::default(),
        };
        let report = report.into_result().unwrap();
        assert_eq!(report.files().len(), 2);
    }

    #[test]
    fn partial_failure_is_counted() {
        let report = ExportReport {
            outcomes: vec![ok(1, ExportFormat::Pdf, "a.pdf"), failed(1, ExportFormat::Docx)],
            stats: ExportStats::default(),
        };
        assert!(!report.all_failed());
        match report.into_result() {
            Err(ScrawlError::PartialFailure { written, failed, total }) => {
                assert_eq!((written, failed, total), (1, 1, 2));
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn total_failure_reports_first_error() {
        let report = ExportReport {
            outcomes: vec![failed(1, ExportFormat::Jpeg), failed(2, ExportFormat::Jpeg)],
            stats: ExportStats::default(),
        };
        assert!(report.all_failed());
        match report.into_result() {
            Err(ScrawlError::AllFormatsFailed { total, first_error }) => {
                assert_eq!(total, 2);
                assert!(first_error.contains("Part 1"));
            }
            other => panic!("expected AllFormatsFailed, got {other:?}"),
        }
    }

    #[test]
    fn report_serialises() {
        let report = ExportReport {
            outcomes: vec![failed(1, ExportFormat::Png)],
            stats: ExportStats::default(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"png\""));
        assert!(json.contains("EncodeFailed"));
    }
}
