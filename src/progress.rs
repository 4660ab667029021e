//! Progress-callback trait for per-output export events.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to receive events
//! as the pipeline renders each chunk and writes each format.
//!
//! A task is one (chunk, format) pair; an export with 3 chunks and 2 formats
//! reports 6 tasks.
//!
//! # Example
//!
//! ```rust
//! use scrawl::{ExportConfig, ExportFormat, ExportProgressCallback};
//! use std::path::PathBuf;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ExportProgressCallback for CountingCallback {
//!     fn on_task_complete(&self, _chunk: usize, _format: ExportFormat, files: &[PathBuf]) {
//!         self.written.fetch_add(files.len(), Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::config::ExportFormat;
use std::path::PathBuf;
use std::sync::Arc;

/// Called by the export pipeline as it works through each output.
///
/// Implementations must be `Send + Sync`: [`crate::export::export_async`]
/// runs the pipeline on a blocking-pool thread. All methods have default
/// no-op implementations so callers only override what they care about.
pub trait ExportProgressCallback: Send + Sync {
    /// Called once, before any other event.
    ///
    /// # Arguments
    /// * `total_tasks`: chunks × formats
    fn on_export_start(&self, total_tasks: usize) {
        let _ = total_tasks;
    }

    /// Called just before a chunk's pages are rendered.
    ///
    /// Not called with [`crate::config::ChunkPolicy::MaxPages`]: the whole
    /// text is rendered once before the chunk count is known.
    ///
    /// # Arguments
    /// * `chunk`: 1-indexed chunk number
    /// * `total_chunks`: number of chunks
    fn on_chunk_render(&self, chunk: usize, total_chunks: usize) {
        let _ = (chunk, total_chunks);
    }

    /// Called just before a format is written for a chunk.
    fn on_task_start(&self, chunk: usize, format: ExportFormat) {
        let _ = (chunk, format);
    }

    /// Called when a format was written for a chunk.
    ///
    /// # Arguments
    /// * `files`: every file produced (several with split raster pages)
    fn on_task_complete(&self, chunk: usize, format: ExportFormat, files: &[PathBuf]) {
        let _ = (chunk, format, files);
    }

    /// Called when a format could not be produced for a chunk.
    fn on_task_error(&self, chunk: usize, format: ExportFormat, error: String) {
        let _ = (chunk, format, error);
    }

    /// Called once after every task has been attempted.
    fn on_export_complete(&self, total_tasks: usize, success_count: usize) {
        let _ = (total_tasks, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;
