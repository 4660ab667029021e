//! Top-level export entry points.
//!
//! # Pipeline
//!
//! ```text
//! ExportJob ──▶ chunk ──▶ render (once per chunk) ──▶ write × formats ──▶ ExportReport
//! ```
//!
//! Each chunk is rendered once and its pages are reused for every requested
//! format. Every (chunk, format) pair is an independent task: a failed
//! DOCX does not stop the PNG next to it, and the failure is reported in
//! the task's [`FormatOutcome`] instead of aborting the export.

use crate::assets::AssetCatalog;
use crate::config::{ChunkPolicy, ExportConfig, ExportFormat};
use crate::document::Document;
use crate::error::{FormatError, ScrawlError};
use crate::output::{ExportReport, ExportStats, FormatOutcome};
use crate::pipeline::render::{PageRenderer, Template};
use crate::pipeline::{chunk, write};
use crate::preset::{Correction, Preset};
use crate::progress::{ExportProgressCallback, NoopProgressCallback};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// One export action: document text, validated render template and output
/// configuration. Immutable once built.
#[derive(Debug, Clone)]
pub struct ExportJob {
    text: String,
    template: Template,
    config: ExportConfig,
    correction: Option<Correction>,
}

impl ExportJob {
    /// Build a job, resolving the preset's font and background.
    ///
    /// # Errors
    /// * [`ScrawlError::EmptyDocument`] when there is nothing to write
    /// * [`ScrawlError::Validation`] / [`ScrawlError::FontNotFound`] from
    ///   template resolution
    pub fn new(
        document: &Document,
        preset: &Preset,
        assets: &AssetCatalog,
        config: ExportConfig,
    ) -> Result<Self, ScrawlError> {
        if document.is_empty() {
            return Err(ScrawlError::EmptyDocument);
        }
        let (template, correction) = Template::resolve(preset, assets)?;
        Ok(Self {
            text: document.text(),
            template,
            config,
            correction,
        })
    }

    /// Build a job from an already resolved template.
    pub fn with_template(
        document: &Document,
        template: Template,
        config: ExportConfig,
    ) -> Result<Self, ScrawlError> {
        if document.is_empty() {
            return Err(ScrawlError::EmptyDocument);
        }
        Ok(Self {
            text: document.text(),
            template,
            config,
            correction: None,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn preset(&self) -> &Preset {
        self.template.preset()
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn formats(&self) -> &[ExportFormat] {
        &self.config.formats
    }

    pub fn chunking(&self) -> ChunkPolicy {
        self.config.chunking
    }

    /// The line-spacing correction applied while building the job, if any.
    pub fn correction(&self) -> Option<&Correction> {
        self.correction.as_ref()
    }
}

/// Run an export to completion on the current thread.
///
/// # Returns
/// An [`ExportReport`] with one outcome per (chunk, format). Per-format
/// failures are inside the report; call [`ExportReport::into_result`] to
/// treat them as an error.
///
/// # Errors
/// Only failures that prevent every task: creating the output directory,
/// or (with [`ChunkPolicy::MaxPages`]) the single up-front render.
pub fn export(job: &ExportJob, renderer: &dyn PageRenderer) -> Result<ExportReport, ScrawlError> {
    let total_start = Instant::now();
    let config = job.config();
    let noop = NoopProgressCallback;
    let cb: &dyn ExportProgressCallback = match &config.progress_callback {
        Some(cb) => &**cb,
        None => &noop,
    };

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| ScrawlError::write(&config.output_dir, e))?;
    let stem = config.file_stem.clone().unwrap_or_else(default_stem);

    let mut stats = ExportStats::default();
    let mut render_ms = 0u64;
    let mut write_ms = 0u64;

    // MaxPages renders the whole text once and slices the pages; the other
    // policies render lazily per text chunk.
    let texts = chunk::split_text(job.text(), config.chunking);
    let mut page_groups = match config.chunking {
        ChunkPolicy::MaxPages(per_chunk) => {
            let start = Instant::now();
            let pages = renderer.render(job.text(), job.template())?;
            render_ms += start.elapsed().as_millis() as u64;
            if pages.is_empty() {
                return Err(ScrawlError::Render("renderer produced no pages".into()));
            }
            stats.pages_rendered = pages.len();
            Some(chunk::group_pages(pages, per_chunk))
        }
        _ => None,
    };

    let total_chunks = page_groups.as_ref().map_or(texts.len(), Vec::len);
    let total_tasks = total_chunks * config.formats.len();
    info!(
        "Exporting {} chunk(s) × {} format(s) to {}",
        total_chunks,
        config.formats.len(),
        config.output_dir.display()
    );
    cb.on_export_start(total_tasks);

    let mut outcomes = Vec::with_capacity(total_tasks);
    for idx in 0..total_chunks {
        let chunk_no = idx + 1;

        let pages: Result<Vec<DynamicImage>, String> = match page_groups.as_mut() {
            Some(groups) => Ok(std::mem::take(&mut groups[idx])),
            None => {
                cb.on_chunk_render(chunk_no, total_chunks);
                let start = Instant::now();
                let rendered = renderer.render(&texts[idx], job.template());
                render_ms += start.elapsed().as_millis() as u64;
                match rendered {
                    Ok(pages) if pages.is_empty() => Err("renderer produced no pages".to_string()),
                    Ok(pages) => {
                        stats.pages_rendered += pages.len();
                        Ok(pages)
                    }
                    Err(e) => {
                        warn!("Part {} failed to render: {}", chunk_no, e);
                        Err(e.to_string())
                    }
                }
            }
        };

        let base = output_base(&config.output_dir, &stem, chunk_no, total_chunks);
        for &format in &config.formats {
            cb.on_task_start(chunk_no, format);
            let start = Instant::now();
            let result = match &pages {
                Ok(pages) => write::write_format(format, pages, &base, chunk_no, config),
                Err(detail) => Err(FormatError::RenderFailed {
                    chunk: chunk_no,
                    detail: detail.clone(),
                }),
            };
            write_ms += start.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(files) => {
                    cb.on_task_complete(chunk_no, format, &files);
                    FormatOutcome {
                        chunk: chunk_no,
                        format,
                        files,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    cb.on_task_error(chunk_no, format, e.to_string());
                    FormatOutcome {
                        chunk: chunk_no,
                        format,
                        files: Vec::new(),
                        error: Some(e),
                    }
                }
            };
            outcomes.push(outcome);
        }
    }

    stats.chunks = total_chunks;
    stats.outputs_written = outcomes.iter().filter(|o| o.is_ok()).count();
    stats.outputs_failed = outcomes.len() - stats.outputs_written;
    stats.files_written = outcomes.iter().map(|o| o.files.len()).sum();
    stats.render_duration_ms = render_ms;
    stats.write_duration_ms = write_ms;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    cb.on_export_complete(total_tasks, stats.outputs_written);
    info!(
        "Export complete: {}/{} outputs, {} file(s), {}ms",
        stats.outputs_written, total_tasks, stats.files_written, stats.total_duration_ms
    );

    Ok(ExportReport { outcomes, stats })
}

/// Same as [`export`]; named for symmetry with [`export_async`].
pub fn export_sync(job: &ExportJob, renderer: &dyn PageRenderer) -> Result<ExportReport, ScrawlError> {
    export(job, renderer)
}

/// Run an export on tokio's blocking pool.
///
/// Rendering and encoding are CPU-bound and pdfium is not async-aware, so
/// the whole pipeline moves to `spawn_blocking` and the caller's runtime
/// stays responsive.
pub async fn export_async(
    job: ExportJob,
    renderer: Arc<dyn PageRenderer>,
) -> Result<ExportReport, ScrawlError> {
    tokio::task::spawn_blocking(move || export(&job, renderer.as_ref()))
        .await
        .map_err(|e| ScrawlError::Internal(format!("Export task panicked: {}", e)))?
}

/// `handwriting_{YYYYmmdd_HHMMSS}` in local time.
pub fn default_stem() -> String {
    format!("handwriting_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

/// Directory + stem for one chunk, without extension.
fn output_base(dir: &Path, stem: &str, chunk: usize, total_chunks: usize) -> PathBuf {
    if total_chunks > 1 {
        dir.join(format!("{stem}_part{chunk}"))
    } else {
        dir.join(stem)
    }
}
