//! Configuration types for export and for on-disk resources.
//!
//! Export behaviour is controlled through [`ExportConfig`], built via its
//! [`ExportConfigBuilder`]. Resource locations (fonts, backgrounds, preset
//! and settings files) live in [`AppPaths`].

use crate::error::ScrawlError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for an export.
///
/// # Example
/// ```rust
/// use scrawl::{ChunkPolicy, ExportConfig, ExportFormat};
///
/// let config = ExportConfig::builder()
///     .formats([ExportFormat::Pdf, ExportFormat::Png])
///     .chunking(ChunkPolicy::MaxChars(1000))
///     .output_dir("out")
///     .build()
///     .unwrap();
/// assert_eq!(config.formats.len(), 2);
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Formats to write, in order. Duplicates are removed. Default: PDF only.
    pub formats: Vec<ExportFormat>,

    /// How to split long text into independent outputs. Default: no split.
    pub chunking: ChunkPolicy,

    /// Resolution recorded in PDF output. Range: 72–600. Default: 300.
    ///
    /// Page images are rendered at one pixel per point; the PDF page size is
    /// derived from pixel size and this value, so a higher DPI yields a
    /// physically smaller, denser page.
    pub dpi: u32,

    /// JPEG quality, 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// Directory receiving the output files. Created if missing. Default: `.`.
    pub output_dir: PathBuf,

    /// Base file name without extension. `None` uses
    /// `handwriting_{YYYYmmdd_HHMMSS}`.
    pub file_stem: Option<String>,

    /// Write one PNG/JPEG per page instead of stacking every page of a chunk
    /// into a single tall image. Default: false.
    pub split_raster_pages: bool,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            formats: vec![ExportFormat::Pdf],
            chunking: ChunkPolicy::None,
            dpi: 300,
            jpeg_quality: 90,
            output_dir: PathBuf::from("."),
            file_stem: None,
            split_raster_pages: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("formats", &self.formats)
            .field("chunking", &self.chunking)
            .field("dpi", &self.dpi)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("output_dir", &self.output_dir)
            .field("file_stem", &self.file_stem)
            .field("split_raster_pages", &self.split_raster_pages)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExportProgressCallback>"),
            )
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn formats(mut self, formats: impl IntoIterator<Item = ExportFormat>) -> Self {
        self.config.formats = formats.into_iter().collect();
        self
    }

    pub fn format(mut self, format: ExportFormat) -> Self {
        self.config.formats.push(format);
        self
    }

    pub fn chunking(mut self, policy: ChunkPolicy) -> Self {
        self.config.chunking = policy;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn file_stem(mut self, stem: impl Into<String>) -> Self {
        self.config.file_stem = Some(stem.into());
        self
    }

    pub fn split_raster_pages(mut self, v: bool) -> Self {
        self.config.split_raster_pages = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ExportConfig, ScrawlError> {
        let mut seen = Vec::with_capacity(self.config.formats.len());
        self.config.formats.retain(|f| {
            if seen.contains(f) {
                false
            } else {
                seen.push(*f);
                true
            }
        });

        let c = &self.config;
        if c.formats.is_empty() {
            return Err(ScrawlError::InvalidConfig(
                "select at least one export format".into(),
            ));
        }
        if c.dpi < 72 || c.dpi > 600 {
            return Err(ScrawlError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        match c.chunking {
            ChunkPolicy::MaxChars(0) | ChunkPolicy::MaxPages(0) => {
                return Err(ScrawlError::InvalidConfig(
                    "chunk size must be ≥ 1".into(),
                ));
            }
            _ => {}
        }
        if let Some(ref stem) = c.file_stem {
            if stem.trim().is_empty() || stem.contains(['/', '\\']) {
                return Err(ScrawlError::InvalidConfig(format!(
                    "file stem must be a plain, non-empty name, got {stem:?}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Pdf,
    Docx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Pdf,
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::Docx,
    ];

    /// File extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    /// Whether pages are written as standalone image files.
    pub fn is_raster(self) -> bool {
        matches!(self, ExportFormat::Png | ExportFormat::Jpeg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Docx => "DOCX",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = ScrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(ScrawlError::InvalidConfig(format!(
                "unknown export format '{other}' (expected pdf, png, jpeg or docx)"
            ))),
        }
    }
}

/// How a long document is split into independent outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChunkPolicy {
    /// One output set for the whole document. (default)
    #[default]
    None,
    /// Split the text every `n` characters before rendering.
    MaxChars(usize),
    /// Render once, then group every `n` pages into an output set.
    MaxPages(usize),
}

// ── Resource locations ───────────────────────────────────────────────────

/// Where scrawl looks for fonts and backgrounds and keeps its JSON files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPaths {
    /// Scanned for `*.ttf`.
    pub fonts_dir: PathBuf,
    /// Scanned for `*.png`, `*.jpg`, `*.jpeg`.
    pub backgrounds_dir: PathBuf,
    /// Named presets.
    pub presets_file: PathBuf,
    /// Last active preset.
    pub settings_file: PathBuf,
}

impl Default for AppPaths {
    fn default() -> Self {
        Self {
            fonts_dir: PathBuf::from("fonts"),
            backgrounds_dir: PathBuf::from("backgrounds"),
            presets_file: PathBuf::from("presets.json"),
            settings_file: PathBuf::from("settings.json"),
        }
    }
}

impl AppPaths {
    /// All paths resolved under `root`.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let d = Self::default();
        Self {
            fonts_dir: root.join(d.fonts_dir),
            backgrounds_dir: root.join(d.backgrounds_dir),
            presets_file: root.join(d.presets_file),
            settings_file: root.join(d.settings_file),
        }
    }
}
