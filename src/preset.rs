//! Render parameter sets.
//!
//! A [`Preset`] carries every knob the handwriting renderer reads: font,
//! size, page margins, spacing and the Gaussian perturbation magnitudes that
//! make the output look hand-drawn rather than typeset.
//!
//! The one cross-field rule is `line_spacing > font_size`. A preset that
//! breaks it is not rejected: [`Preset::corrected`] raises the line spacing
//! to 1.5× the font size and hands back a [`Correction`] so the caller can
//! tell the user what changed.

use crate::error::ScrawlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Upper bound accepted for `font_size`.
pub const MAX_FONT_SIZE: u32 = 1000;

/// A named-when-stored bundle of rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    /// Font name: the file stem of a `.ttf` in the fonts directory.
    pub font: String,
    /// Nominal glyph size in pixels.
    pub font_size: u32,
    pub margins: Margins,
    pub distortions: Distortions,
    /// Background name (file stem in the backgrounds directory). `None` is a
    /// plain white page.
    pub background: Option<String>,
    /// Fixed RNG seed for reproducible output. `None` draws a fresh seed per
    /// render.
    pub seed: Option<u64>,
}

/// Page margins and spacing, in pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
    /// Gap added after every glyph.
    pub word_spacing: u32,
    /// Distance between consecutive baselines. Must exceed `font_size`.
    pub line_spacing: u32,
}

/// Standard deviations of the random perturbations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Distortions {
    pub word_spacing_sigma: f64,
    pub line_spacing_sigma: f64,
    pub font_size_sigma: f64,
    pub perturb_x_sigma: f64,
    pub perturb_y_sigma: f64,
    /// Rotation jitter in radians.
    pub perturb_theta_sigma: f64,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            font: String::new(),
            font_size: 40,
            margins: Margins::default(),
            distortions: Distortions::default(),
            background: None,
            seed: None,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 105,
            bottom: 0,
            left: 86,
            right: 93,
            word_spacing: 1,
            line_spacing: 37,
        }
    }
}

impl Default for Distortions {
    fn default() -> Self {
        Self {
            word_spacing_sigma: 2.0,
            line_spacing_sigma: 0.0,
            font_size_sigma: 2.0,
            perturb_x_sigma: 2.0,
            perturb_y_sigma: 2.0,
            perturb_theta_sigma: 0.05,
        }
    }
}

/// A user-visible notice that a parameter was adjusted during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub field: String,
    pub old: u32,
    pub new: u32,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} adjusted from {} to {} (line spacing must exceed font size)",
            self.field, self.old, self.new
        )
    }
}

impl Preset {
    /// Check every constraint without modifying anything.
    pub fn validate(&self) -> Result<(), ScrawlError> {
        if self.font_size == 0 || self.font_size > MAX_FONT_SIZE {
            return Err(ScrawlError::validation(
                "font_size",
                format!("must be 1–{MAX_FONT_SIZE}, got {}", self.font_size),
            ));
        }
        if self.margins.line_spacing <= self.font_size {
            return Err(ScrawlError::validation(
                "margins.line_spacing",
                format!(
                    "must be greater than font_size ({}), got {}",
                    self.font_size, self.margins.line_spacing
                ),
            ));
        }
        for (field, sigma) in self.distortions.fields() {
            if !sigma.is_finite() || sigma < 0.0 {
                return Err(ScrawlError::validation(
                    format!("distortions.{field}"),
                    format!("must be a finite value ≥ 0, got {sigma}"),
                ));
            }
        }
        Ok(())
    }

    /// Validate, auto-correcting the line-spacing rule.
    ///
    /// Returns the (possibly adjusted) preset and the correction applied, if
    /// any. Violations that have no sensible automatic fix are returned as
    /// [`ScrawlError::Validation`].
    pub fn corrected(mut self) -> Result<(Preset, Option<Correction>), ScrawlError> {
        let mut correction = None;
        if self.font_size > 0 && self.margins.line_spacing <= self.font_size {
            let new = min_line_spacing(self.font_size);
            warn!(
                "line_spacing {} ≤ font_size {}; adjusted to {}",
                self.margins.line_spacing, self.font_size, new
            );
            correction = Some(Correction {
                field: "margins.line_spacing".to_string(),
                old: self.margins.line_spacing,
                new,
            });
            self.margins.line_spacing = new;
        }
        self.validate()?;
        Ok((self, correction))
    }
}

/// Line spacing used when auto-correcting: 1.5× the font size, and always
/// strictly greater than it.
pub fn min_line_spacing(font_size: u32) -> u32 {
    (font_size.saturating_mul(3) / 2).max(font_size.saturating_add(1))
}

impl Distortions {
    fn fields(&self) -> [(&'static str, f64); 6] {
        [
            ("word_spacing_sigma", self.word_spacing_sigma),
            ("line_spacing_sigma", self.line_spacing_sigma),
            ("font_size_sigma", self.font_size_sigma),
            ("perturb_x_sigma", self.perturb_x_sigma),
            ("perturb_y_sigma", self.perturb_y_sigma),
            ("perturb_theta_sigma", self.perturb_theta_sigma),
        ]
    }

    /// All perturbations disabled; useful for deterministic layouts.
    pub fn none() -> Self {
        Self {
            word_spacing_sigma: 0.0,
            line_spacing_sigma: 0.0,
            font_size_sigma: 0.0,
            perturb_x_sigma: 0.0,
            perturb_y_sigma: 0.0,
            perturb_theta_sigma: 0.0,
        }
    }
}
