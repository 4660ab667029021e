//! Glyph placement: turn text plus a preset into per-page glyph positions.
//!
//! Layout is pure. Glyph widths come from a [`GlyphMetrics`] implementation
//! (pdfium in production, a fixed-width stub in tests) and randomness from a
//! caller-supplied RNG, so a fixed seed reproduces the same pages exactly.
//!
//! ## Model
//!
//! A pen starts at (`left`, `top`). Each character is drawn at the pen with
//! a jittered size, offset and rotation, then the pen advances by the glyph
//! width plus `word_spacing` (itself jittered). When the next glyph would
//! cross the right margin, or the text has a `\n`, the pen returns to the
//! left margin and drops by `line_spacing`. When a line would cross the
//! bottom margin a new page begins.
//!
//! Whitespace advances the pen without emitting a glyph.

use crate::error::ScrawlError;
use crate::preset::Preset;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Supplies horizontal advances for characters.
pub trait GlyphMetrics {
    /// Advance width of `ch` drawn at `size` pixels.
    fn advance(&mut self, ch: char, size: f32) -> Result<f32, ScrawlError>;
}

/// One character placed on a page.
///
/// Coordinates are in page pixels with the origin at the top-left corner;
/// `(x, y)` is the top-left of the glyph's em box.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Counter-clockwise rotation in radians.
    pub theta: f32,
}

/// Glyphs for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub glyphs: Vec<PlacedGlyph>,
}

/// Reject page geometry on which not even one line fits.
pub fn check_geometry(preset: &Preset, width: u32, height: u32) -> Result<(), ScrawlError> {
    let m = &preset.margins;
    if m.left.saturating_add(m.right) >= width {
        return Err(ScrawlError::validation(
            "margins.left",
            format!(
                "left ({}) + right ({}) margins leave no room on a {}px wide page",
                m.left, m.right, width
            ),
        ));
    }
    if m.top.saturating_add(m.bottom).saturating_add(m.line_spacing) > height {
        return Err(ScrawlError::validation(
            "margins.top",
            format!(
                "top ({}) + bottom ({}) margins and one line ({}) exceed a {}px tall page",
                m.top, m.bottom, m.line_spacing, height
            ),
        ));
    }
    Ok(())
}

/// Lay `text` out over as many `width`×`height` pages as it needs.
///
/// Always returns at least one page; empty text yields a single blank page.
pub fn layout_pages<M, R>(
    text: &str,
    preset: &Preset,
    width: u32,
    height: u32,
    metrics: &mut M,
    rng: &mut R,
) -> Result<Vec<PageLayout>, ScrawlError>
where
    M: GlyphMetrics + ?Sized,
    R: Rng + ?Sized,
{
    check_geometry(preset, width, height)?;
    let jitter = Jitter::new(preset)?;
    let mut pen = Pen::new(preset, width, height);

    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            pen.new_line(&jitter, rng);
        }
        for ch in line.chars().filter(|c| *c != '\r') {
            let size = (preset.font_size as f32 + jitter.font_size.sample(rng)).max(1.0);
            let advance = metrics.advance(ch, size)?;
            if advance > pen.line_width() {
                return Err(ScrawlError::validation(
                    "font_size",
                    format!(
                        "glyph '{ch}' is {advance:.0}px wide but only {:.0}px fit between the margins",
                        pen.line_width()
                    ),
                ));
            }
            if pen.x + advance > pen.right && pen.x > pen.left {
                pen.new_line(&jitter, rng);
            }
            if !ch.is_whitespace() {
                pen.page.glyphs.push(PlacedGlyph {
                    ch,
                    x: pen.x + jitter.perturb_x.sample(rng),
                    y: pen.y + jitter.perturb_y.sample(rng),
                    size,
                    theta: jitter.theta.sample(rng),
                });
            }
            let step = advance + preset.margins.word_spacing as f32 + jitter.word_spacing.sample(rng);
            pen.x = (pen.x + step).max(pen.left);
        }
    }

    Ok(pen.finish())
}

// ── Internals ────────────────────────────────────────────────────────────

/// A zero-mean normal sampler; `None` when the sigma is zero.
struct Sigma(Option<Normal<f64>>);

impl Sigma {
    fn new(field: &str, sigma: f64) -> Result<Self, ScrawlError> {
        if sigma == 0.0 {
            return Ok(Sigma(None));
        }
        Normal::new(0.0, sigma)
            .map(|n| Sigma(Some(n)))
            .map_err(|e| ScrawlError::validation(format!("distortions.{field}"), e.to_string()))
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match &self.0 {
            Some(normal) => normal.sample(rng) as f32,
            None => 0.0,
        }
    }
}

struct Jitter {
    word_spacing: Sigma,
    line_spacing: Sigma,
    font_size: Sigma,
    perturb_x: Sigma,
    perturb_y: Sigma,
    theta: Sigma,
}

impl Jitter {
    fn new(preset: &Preset) -> Result<Self, ScrawlError> {
        let d = &preset.distortions;
        Ok(Self {
            word_spacing: Sigma::new("word_spacing_sigma", d.word_spacing_sigma)?,
            line_spacing: Sigma::new("line_spacing_sigma", d.line_spacing_sigma)?,
            font_size: Sigma::new("font_size_sigma", d.font_size_sigma)?,
            perturb_x: Sigma::new("perturb_x_sigma", d.perturb_x_sigma)?,
            perturb_y: Sigma::new("perturb_y_sigma", d.perturb_y_sigma)?,
            theta: Sigma::new("perturb_theta_sigma", d.perturb_theta_sigma)?,
        })
    }
}

struct Pen {
    x: f32,
    y: f32,
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    line_spacing: f32,
    page: PageLayout,
    pages: Vec<PageLayout>,
}

impl Pen {
    fn new(preset: &Preset, width: u32, height: u32) -> Self {
        let m = &preset.margins;
        Self {
            x: m.left as f32,
            y: m.top as f32,
            left: m.left as f32,
            right: (width - m.right) as f32,
            top: m.top as f32,
            bottom: (height - m.bottom) as f32,
            line_spacing: m.line_spacing as f32,
            page: PageLayout::default(),
            pages: Vec::new(),
        }
    }

    fn line_width(&self) -> f32 {
        self.right - self.left
    }

    fn new_line<R: Rng + ?Sized>(&mut self, jitter: &Jitter, rng: &mut R) {
        self.x = self.left;
        self.y += (self.line_spacing + jitter.line_spacing.sample(rng)).max(1.0);
        if self.y + self.line_spacing > self.bottom {
            self.pages.push(std::mem::take(&mut self.page));
            self.y = self.top;
        }
    }

    fn finish(mut self) -> Vec<PageLayout> {
        if !self.page.glyphs.is_empty() || self.pages.is_empty() {
            self.pages.push(self.page);
        }
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::Distortions;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Every glyph is `size / 2` wide.
    struct HalfEm;

    impl GlyphMetrics for HalfEm {
        fn advance(&mut self, _ch: char, size: f32) -> Result<f32, ScrawlError> {
            Ok(size / 2.0)
        }
    }

    fn preset() -> Preset {
        let mut p = Preset::default();
        p.font_size = 20;
        p.margins.top = 10;
        p.margins.bottom = 10;
        p.margins.left = 10;
        p.margins.right = 10;
        p.margins.word_spacing = 0;
        p.margins.line_spacing = 30;
        p
    }

    fn flat_preset() -> Preset {
        let mut p = preset();
        p.distortions = Distortions::none();
        p
    }

    #[test]
    fn flat_layout_is_a_grid() {
        let mut rng = StdRng::seed_from_u64(1);
        let pages = layout_pages("abc", &flat_preset(), 200, 200, &mut HalfEm, &mut rng).unwrap();
        assert_eq!(pages.len(), 1);
        let xs: Vec<f32> = pages[0].glyphs.iter().map(|g| g.x).collect();
        assert_eq!(xs, vec![10.0, 20.0, 30.0]);
        assert!(pages[0].glyphs.iter().all(|g| g.y == 10.0 && g.theta == 0.0));
    }

    #[test]
    fn whitespace_advances_without_glyph() {
        let mut rng = StdRng::seed_from_u64(1);
        let pages = layout_pages("a b", &flat_preset(), 200, 200, &mut HalfEm, &mut rng).unwrap();
        let glyphs = &pages[0].glyphs;
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[1].x, 30.0);
    }

    #[test]
    fn wraps_at_right_margin() {
        // 180px of line width fits 18 glyphs of 10px.
        let text = "x".repeat(20);
        let mut rng = StdRng::seed_from_u64(1);
        let pages = layout_pages(&text, &flat_preset(), 200, 200, &mut HalfEm, &mut rng).unwrap();
        let glyphs = &pages[0].glyphs;
        assert_eq!(glyphs.iter().filter(|g| g.y == 10.0).count(), 18);
        assert_eq!(glyphs[18].x, 10.0);
        assert_eq!(glyphs[18].y, 40.0);
    }

    #[test]
    fn newline_starts_new_line() {
        let mut rng = StdRng::seed_from_u64(1);
        let pages =
            layout_pages("ab\r\ncd", &flat_preset(), 200, 200, &mut HalfEm, &mut rng).unwrap();
        let glyphs = &pages[0].glyphs;
        assert_eq!(glyphs.len(), 4);
        assert_eq!((glyphs[2].x, glyphs[2].y), (10.0, 40.0));
    }

    #[test]
    fn paginates_when_lines_run_out() {
        // height 100: lines at y=10, 40; the third (70 + 30 > 90) breaks.
        let mut rng = StdRng::seed_from_u64(1);
        let pages =
            layout_pages("a\nb\nc\nd", &flat_preset(), 200, 100, &mut HalfEm, &mut rng).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].glyphs.len(), 2);
        assert_eq!(pages[1].glyphs[0].ch, 'c');
        assert_eq!(pages[1].glyphs[0].y, 10.0);
    }

    #[test]
    fn empty_text_gives_one_blank_page() {
        let mut rng = StdRng::seed_from_u64(1);
        let pages = layout_pages("", &flat_preset(), 200, 200, &mut HalfEm, &mut rng).unwrap();
        assert_eq!(pages, vec![PageLayout::default()]);
    }

    #[test]
    fn trailing_newline_does_not_add_blank_page() {
        let mut rng = StdRng::seed_from_u64(1);
        let pages = layout_pages("a\nb\n", &flat_preset(), 200, 100, &mut HalfEm, &mut rng).unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn same_seed_same_layout() {
        let text = "The quick brown fox\njumps over the lazy dog";
        let a = layout_pages(text, &preset(), 300, 300, &mut HalfEm, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = layout_pages(text, &preset(), 300, 300, &mut HalfEm, &mut StdRng::seed_from_u64(7)).unwrap();
        let c = layout_pages(text, &preset(), 300, 300, &mut HalfEm, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn no_glyph_left_of_margin_without_x_jitter() {
        let mut p = preset();
        p.distortions.perturb_x_sigma = 0.0;
        p.distortions.word_spacing_sigma = 6.0;
        let text = "word ".repeat(120);
        let mut rng = StdRng::seed_from_u64(3);
        let pages = layout_pages(&text, &p, 300, 400, &mut HalfEm, &mut rng).unwrap();
        assert!(pages.len() > 1);
        for page in &pages {
            for g in &page.glyphs {
                assert!(g.x >= 10.0, "glyph at x={} left of margin", g.x);
            }
        }
    }

    #[test]
    fn oversized_glyph_is_rejected() {
        let mut p = flat_preset();
        p.font_size = 400;
        p.margins.line_spacing = 401;
        let mut rng = StdRng::seed_from_u64(1);
        match layout_pages("a", &p, 200, 1000, &mut HalfEm, &mut rng) {
            Err(ScrawlError::Validation { field, .. }) => assert_eq!(field, "font_size"),
            other => panic!("expected font_size validation, got {other:?}"),
        }
    }

    #[test]
    fn impossible_margins_are_rejected() {
        let mut p = flat_preset();
        p.margins.left = 150;
        p.margins.right = 60;
        assert!(check_geometry(&p, 200, 200).is_err());

        let mut p = flat_preset();
        p.margins.top = 180;
        assert!(check_geometry(&p, 200, 200).is_err());
        assert!(check_geometry(&flat_preset(), 200, 200).is_ok());
    }
}
