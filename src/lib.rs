//! # scrawl
//!
//! Turn plain text into pages that look handwritten, and export them as
//! PNG, JPEG, PDF or DOCX.
//!
//! ## Why this crate?
//!
//! Typeset text is perfectly regular: every glyph the same size, on the same
//! baseline, at the same angle. Handwriting is not. scrawl lays text out
//! with a TrueType font and then perturbs every glyph (size, position,
//! rotation) and every gap with Gaussian noise, drawn over a paper
//! background of your choice. A fixed seed reproduces a page exactly.
//!
//! ## Pipeline Overview
//!
//! ```text
//! TXT / DOCX / PDF
//!  │
//!  ├─ 1. Import  extract text, batch files joined with a separator
//!  ├─ 2. Preset  validate parameters, auto-correct line spacing
//!  ├─ 3. Chunk   optional split by characters or pages
//!  ├─ 4. Layout  glyph placement with Gaussian jitter (seeded)
//!  ├─ 5. Render  pdfium draws glyphs over the background
//!  └─ 6. Export  PNG / JPEG / PDF / DOCX, partial success per format
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scrawl::{
//!     export, AppPaths, ExportConfig, ExportFormat, ImportMode, PdfiumRenderer, Session,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::restore(&AppPaths::default());
//!     session.import(&["letter.txt"], ImportMode::Replace)?;
//!
//!     let config = ExportConfig::builder()
//!         .formats([ExportFormat::Pdf, ExportFormat::Png])
//!         .output_dir("out")
//!         .build()?;
//!     let job = session.export_job(config)?;
//!     let report = export(&job, &PdfiumRenderer::new())?;
//!     for file in report.files() {
//!         println!("{}", file.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scrawl` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! scrawl = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! Rendering, PDF import and PDF export need the pdfium shared library; see
//! [`pipeline::engine`] for how it is located. TXT/DOCX import and the
//! layout engine work without it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assets;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod preset;
pub mod preview;
pub mod progress;
pub mod session;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assets::{AssetCatalog, AssetEntry};
pub use config::{AppPaths, ChunkPolicy, ExportConfig, ExportConfigBuilder, ExportFormat};
pub use document::{Document, ImportMode};
pub use error::{FormatError, ScrawlError};
pub use export::{export, export_async, export_sync, ExportJob};
pub use loader::{DocumentLoader, ImportReport, SkippedFile};
pub use output::{ExportReport, ExportStats, FormatOutcome};
pub use pipeline::input::{is_supported, load_file, SUPPORTED_EXTENSIONS};
pub use pipeline::render::{PageRenderer, PdfiumRenderer, Template};
pub use preset::{Correction, Distortions, Margins, Preset};
pub use preview::{preview_text, PreviewPager, PreviewThrottle};
pub use progress::{ExportProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::Session;
pub use store::{PresetStore, SettingsStore};
