//! Live preview support: text truncation, page navigation and update
//! throttling for front ends that re-render while the user edits.

use crate::error::ScrawlError;
use crate::pipeline::render::{PageRenderer, Template};
use crate::preset::Preset;
use image::DynamicImage;
use std::time::{Duration, Instant};

/// Characters of the document rendered in a preview.
pub const PREVIEW_CHAR_LIMIT: usize = 500;

/// Rendered when the document is empty.
pub const PREVIEW_SAMPLE_TEXT: &str = "Preview text sample";

/// Minimum gap between two preview renders.
pub const PREVIEW_THROTTLE: Duration = Duration::from_millis(200);

/// The slice of `text` a preview renders.
pub fn preview_text(text: &str) -> String {
    if text.trim().is_empty() {
        return PREVIEW_SAMPLE_TEXT.to_string();
    }
    text.chars().take(PREVIEW_CHAR_LIMIT).collect()
}

/// Render the preview pages for `text`.
pub fn render_preview(
    text: &str,
    template: &Template,
    renderer: &dyn PageRenderer,
) -> Result<PreviewPager, ScrawlError> {
    let pages = renderer.render(&preview_text(text), template)?;
    Ok(PreviewPager::new(pages))
}

/// Rendered preview pages with a cursor.
#[derive(Debug, Clone, Default)]
pub struct PreviewPager {
    pages: Vec<DynamicImage>,
    current: usize,
}

impl PreviewPager {
    pub fn new(pages: Vec<DynamicImage>) -> Self {
        Self { pages, current: 0 }
    }

    pub fn current(&self) -> Option<&DynamicImage> {
        self.pages.get(self.current)
    }

    /// 0-indexed.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[DynamicImage] {
        &self.pages
    }

    /// Returns whether the cursor moved.
    pub fn next(&mut self) -> bool {
        self.go_to(self.current + 1)
    }

    pub fn prev(&mut self) -> bool {
        match self.current.checked_sub(1) {
            Some(idx) => self.go_to(idx),
            None => false,
        }
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.pages.len() || index == self.current {
            return false;
        }
        self.current = index;
        true
    }

    /// "page N of M".
    pub fn page_info(&self) -> String {
        if self.pages.is_empty() {
            return "no pages".to_string();
        }
        format!("page {} of {}", self.current + 1, self.pages.len())
    }
}

/// Decides when a preview is worth re-rendering.
///
/// A render is due when the text or preset differs from the last rendered
/// pair and at least the throttle interval has passed since then.
#[derive(Debug, Clone)]
pub struct PreviewThrottle {
    interval: Duration,
    last_update: Option<Instant>,
    last_text: Option<String>,
    last_preset: Option<Preset>,
}

impl Default for PreviewThrottle {
    fn default() -> Self {
        Self::new(PREVIEW_THROTTLE)
    }
}

impl PreviewThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_update: None,
            last_text: None,
            last_preset: None,
        }
    }

    pub fn should_update(&mut self, text: &str, preset: &Preset) -> bool {
        self.should_update_at(Instant::now(), text, preset)
    }

    /// Like [`should_update`](Self::should_update) with an explicit clock.
    /// Records the pair as rendered when it returns `true`.
    pub fn should_update_at(&mut self, now: Instant, text: &str, preset: &Preset) -> bool {
        if let Some(last) = self.last_update {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }
        let changed = self.last_text.as_deref() != Some(text)
            || self.last_preset.as_ref() != Some(preset);
        if !changed {
            return false;
        }

        self.last_update = Some(now);
        self.last_text = Some(text.to_string());
        self.last_preset = Some(preset.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn pages(n: usize) -> Vec<DynamicImage> {
        (0..n)
            .map(|_| DynamicImage::ImageRgb8(RgbImage::new(2, 2)))
            .collect()
    }

    #[test]
    fn preview_text_truncates_and_samples() {
        assert_eq!(preview_text(""), PREVIEW_SAMPLE_TEXT);
        assert_eq!(preview_text("  \n"), PREVIEW_SAMPLE_TEXT);
        let long = "字".repeat(800);
        assert_eq!(preview_text(&long).chars().count(), PREVIEW_CHAR_LIMIT);
        assert_eq!(preview_text("short"), "short");
    }

    #[test]
    fn pager_navigation() {
        let mut pager = PreviewPager::new(pages(3));
        assert_eq!(pager.page_info(), "page 1 of 3");
        assert!(!pager.prev());
        assert!(pager.next());
        assert!(pager.next());
        assert!(!pager.next());
        assert_eq!(pager.current_index(), 2);
        assert!(pager.go_to(0));
        assert!(!pager.go_to(7));
        assert_eq!(pager.page_info(), "page 1 of 3");
    }

    #[test]
    fn empty_pager() {
        let mut pager = PreviewPager::default();
        assert!(pager.current().is_none());
        assert!(!pager.next());
        assert_eq!(pager.page_info(), "no pages");
    }

    #[test]
    fn throttle_needs_change_and_time() {
        let mut throttle = PreviewThrottle::default();
        let preset = Preset::default();
        let t0 = Instant::now();

        assert!(throttle.should_update_at(t0, "a", &preset));
        // Too soon.
        assert!(!throttle.should_update_at(t0 + Duration::from_millis(50), "ab", &preset));
        // Late enough but unchanged.
        assert!(!throttle.should_update_at(t0 + Duration::from_millis(300), "a", &preset));
        // Late enough and changed.
        assert!(throttle.should_update_at(t0 + Duration::from_millis(300), "ab", &preset));

        let mut other = preset.clone();
        other.font_size = 30;
        assert!(throttle.should_update_at(t0 + Duration::from_millis(600), "ab", &other));
    }
}
