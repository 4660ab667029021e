//! Handwriting rasterisation: text + [`Template`] → page images.
//!
//! [`PageRenderer`] is the seam between the export pipeline and the glyph
//! engine. Production uses [`PdfiumRenderer`]; tests plug in a stub that
//! returns blank pages so export logic runs without the pdfium library.
//!
//! ## Why pdfium for glyphs?
//!
//! pdfium already ships a TrueType rasteriser with anti-aliasing and
//! arbitrary affine transforms per text object. Each laid-out glyph becomes
//! one text object rotated by its jitter angle, the background becomes an
//! image object behind them, and the page is rendered back to a bitmap at
//! one pixel per point. No second font stack is needed.

use crate::assets::AssetCatalog;
use crate::error::ScrawlError;
use crate::pipeline::engine;
use crate::pipeline::layout::{self, GlyphMetrics, PageLayout};
use crate::preset::{Correction, Preset};
use image::DynamicImage;
use pdfium_render::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything a renderer needs besides the text.
#[derive(Debug, Clone)]
pub struct Template {
    background: DynamicImage,
    font_path: PathBuf,
    preset: Preset,
}

impl Template {
    /// Build a template, validating the preset and its fit on `background`.
    ///
    /// The line-spacing rule is auto-corrected; use [`Template::resolve`] to
    /// see the correction.
    pub fn new(
        preset: Preset,
        font_path: impl Into<PathBuf>,
        background: DynamicImage,
    ) -> Result<Self, ScrawlError> {
        let (preset, _) = preset.corrected()?;
        layout::check_geometry(&preset, background.width(), background.height())?;
        Ok(Self {
            background,
            font_path: font_path.into(),
            preset,
        })
    }

    /// Resolve the preset's font and background through `assets`.
    pub fn resolve(
        preset: &Preset,
        assets: &AssetCatalog,
    ) -> Result<(Self, Option<Correction>), ScrawlError> {
        let (preset, correction) = preset.clone().corrected()?;
        let font_path = assets.resolve_font(&preset.font)?;
        let background = assets.load_background(preset.background.as_deref())?;
        let template = Self::new(preset, font_path, background)?;
        Ok((template, correction))
    }

    pub fn background(&self) -> &DynamicImage {
        &self.background
    }

    pub fn font_path(&self) -> &Path {
        &self.font_path
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    /// Page width in pixels.
    pub fn width(&self) -> u32 {
        self.background.width()
    }

    /// Page height in pixels.
    pub fn height(&self) -> u32 {
        self.background.height()
    }

    /// RNG for one render: the preset's seed, or a fresh one.
    pub fn rng(&self) -> StdRng {
        match self.preset.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Turns text into handwritten page images.
///
/// Must be `Send + Sync`: [`crate::export::export_async`] runs on tokio's
/// blocking pool.
pub trait PageRenderer: Send + Sync {
    /// Render `text` onto as many pages as it needs. Never returns an empty
    /// vector on success.
    fn render(&self, text: &str, template: &Template) -> Result<Vec<DynamicImage>, ScrawlError>;
}

/// [`PageRenderer`] backed by pdfium text objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRenderer;

impl PdfiumRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(&self, text: &str, template: &Template) -> Result<Vec<DynamicImage>, ScrawlError> {
        let pdfium = engine::pdfium()?;
        let mut document = pdfium.create_new_pdf().map_err(render_err)?;

        let font = document
            .fonts_mut()
            .load_true_type_from_file(template.font_path(), true)
            .map_err(|e| {
                ScrawlError::Render(format!(
                    "cannot load font '{}': {e:?}",
                    template.font_path().display()
                ))
            })?;

        let layouts = {
            let mut metrics = PdfiumMetrics {
                document: &document,
                font,
                cache: HashMap::new(),
            };
            let mut rng = template.rng();
            layout::layout_pages(
                text,
                template.preset(),
                template.width(),
                template.height(),
                &mut metrics,
                &mut rng,
            )?
        };
        debug!(
            "Laid out {} chars over {} page(s)",
            text.chars().count(),
            layouts.len()
        );

        let mut images = Vec::with_capacity(layouts.len());
        for (idx, page_layout) in layouts.iter().enumerate() {
            let image = draw_page(&mut document, font, template, page_layout)
                .map_err(|e| ScrawlError::Render(format!("page {}: {e:?}", idx + 1)))?;
            images.push(image);
        }

        info!(
            "Rendered {} page(s) at {}x{} px",
            images.len(),
            template.width(),
            template.height()
        );
        Ok(images)
    }
}

fn render_err(e: PdfiumError) -> ScrawlError {
    ScrawlError::Render(format!("{e:?}"))
}

/// Compose one page and rasterise it.
fn draw_page(
    document: &mut PdfDocument<'_>,
    font: PdfFontToken,
    template: &Template,
    page_layout: &PageLayout,
) -> Result<DynamicImage, PdfiumError> {
    let width = template.width() as f32;
    let height = template.height() as f32;

    let mut page = document.pages_mut().create_page_at_end(PdfPagePaperSize::Custom(
        PdfPoints::new(width),
        PdfPoints::new(height),
    ))?;

    page.objects_mut().create_image_object(
        PdfPoints::ZERO,
        PdfPoints::ZERO,
        template.background(),
        Some(PdfPoints::new(width)),
        Some(PdfPoints::new(height)),
    )?;

    for glyph in &page_layout.glyphs {
        let mut object = page.objects_mut().create_text_object(
            PdfPoints::ZERO,
            PdfPoints::ZERO,
            glyph.ch.to_string(),
            font,
            PdfPoints::new(glyph.size),
        )?;
        if glyph.theta != 0.0 {
            object.rotate_counter_clockwise_radians(glyph.theta)?;
        }
        // Layout is top-down with y at the em box top; PDF is bottom-up with
        // y at the baseline.
        object.translate(
            PdfPoints::new(glyph.x),
            PdfPoints::new(height - glyph.y - glyph.size),
        )?;
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(template.width() as i32)
        .set_maximum_height(template.height() as i32);
    let bitmap = page.render_with_config(&render_config)?;
    Ok(bitmap.as_image())
}

/// Advance widths measured with detached pdfium text objects.
struct PdfiumMetrics<'doc, 'lib> {
    document: &'doc PdfDocument<'lib>,
    font: PdfFontToken,
    /// Keyed by char and size in hundredths of a pixel.
    cache: HashMap<(char, u32), f32>,
}

impl GlyphMetrics for PdfiumMetrics<'_, '_> {
    fn advance(&mut self, ch: char, size: f32) -> Result<f32, ScrawlError> {
        let key = (ch, (size * 100.0).round() as u32);
        if let Some(&width) = self.cache.get(&key) {
            return Ok(width);
        }

        let object = PdfPageTextObject::new(
            self.document,
            ch.to_string(),
            self.font,
            PdfPoints::new(size),
        )
        .map_err(render_err)?;
        let mut width = object.width().map_err(render_err)?.value;
        if ch.is_whitespace() && width <= 0.0 {
            // pdfium reports zero-width bounds for blank glyphs.
            width = size / 3.0;
        }

        self.cache.insert(key, width);
        Ok(width)
    }
}
