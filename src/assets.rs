//! Fonts and backgrounds discovered on disk.
//!
//! Both directories are plain folders the user drops files into. They are
//! scanned when the catalog is built and again on [`AssetCatalog::refresh`];
//! a missing folder is an empty list, not an error.

use crate::config::AppPaths;
use crate::error::ScrawlError;
use image::{DynamicImage, Rgb, RgbImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FONT_EXTENSIONS: [&str; 1] = ["ttf"];
const BACKGROUND_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Side length of the plain white page used when no background is chosen.
pub const DEFAULT_BACKGROUND_SIZE: u32 = 1000;

/// One discovered file, addressed by its stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AssetCatalog {
    fonts_dir: PathBuf,
    backgrounds_dir: PathBuf,
    fonts: Vec<AssetEntry>,
    backgrounds: Vec<AssetEntry>,
}

impl AssetCatalog {
    pub fn scan(fonts_dir: impl Into<PathBuf>, backgrounds_dir: impl Into<PathBuf>) -> Self {
        let mut catalog = Self {
            fonts_dir: fonts_dir.into(),
            backgrounds_dir: backgrounds_dir.into(),
            fonts: Vec::new(),
            backgrounds: Vec::new(),
        };
        catalog.refresh();
        catalog
    }

    pub fn from_paths(paths: &AppPaths) -> Self {
        Self::scan(&paths.fonts_dir, &paths.backgrounds_dir)
    }

    /// Re-read both directories.
    pub fn refresh(&mut self) {
        self.fonts = scan_dir(&self.fonts_dir, &FONT_EXTENSIONS);
        self.backgrounds = scan_dir(&self.backgrounds_dir, &BACKGROUND_EXTENSIONS);
        debug!(
            "Asset scan: {} font(s), {} background(s)",
            self.fonts.len(),
            self.backgrounds.len()
        );
    }

    pub fn fonts(&self) -> &[AssetEntry] {
        &self.fonts
    }

    pub fn backgrounds(&self) -> &[AssetEntry] {
        &self.backgrounds
    }

    pub fn fonts_dir(&self) -> &Path {
        &self.fonts_dir
    }

    pub fn backgrounds_dir(&self) -> &Path {
        &self.backgrounds_dir
    }

    /// Path of the font called `name`, falling back to the first font.
    pub fn resolve_font(&self, name: &str) -> Result<PathBuf, ScrawlError> {
        if let Some(entry) = self.fonts.iter().find(|f| f.name == name) {
            return Ok(entry.path.clone());
        }
        match self.fonts.first() {
            Some(first) => {
                if !name.is_empty() {
                    warn!("Font '{}' not found; using '{}'", name, first.name);
                }
                Ok(first.path.clone())
            }
            None => Err(ScrawlError::FontNotFound {
                name: name.to_string(),
                dir: self.fonts_dir.clone(),
            }),
        }
    }

    /// The named background as RGB, or a plain white page for `None`.
    ///
    /// An unknown name falls back to the white page with a warning.
    pub fn load_background(&self, name: Option<&str>) -> Result<DynamicImage, ScrawlError> {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return Ok(default_background());
        };
        let Some(entry) = self.backgrounds.iter().find(|b| b.name == name) else {
            warn!("Background '{}' not found; using a plain page", name);
            return Ok(default_background());
        };

        let image = image::open(&entry.path).map_err(|e| ScrawlError::Parse {
            path: entry.path.clone(),
            detail: e.to_string(),
        })?;
        Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
    }
}

/// 1000×1000 white.
pub fn default_background() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(
        DEFAULT_BACKGROUND_SIZE,
        DEFAULT_BACKGROUND_SIZE,
        Rgb([255, 255, 255]),
    ))
}

fn scan_dir(dir: &Path, extensions: &[&str]) -> Vec<AssetEntry> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read asset directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut found: Vec<AssetEntry> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| extensions.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .filter_map(|path| {
            let name = path.file_stem()?.to_str()?.to_string();
            Some(AssetEntry { name, path })
        })
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn scans_by_extension_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = dir.path().join("fonts");
        std::fs::create_dir(&fonts).unwrap();
        touch(&fonts, "zeta.ttf");
        touch(&fonts, "Alpha.TTF");
        touch(&fonts, "readme.txt");

        let catalog = AssetCatalog::scan(&fonts, dir.path().join("backgrounds"));
        let names: Vec<&str> = catalog.fonts().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "zeta"]);
        assert!(catalog.backgrounds().is_empty());
    }

    #[test]
    fn refresh_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = AssetCatalog::scan(dir.path(), dir.path());
        assert!(catalog.fonts().is_empty());
        touch(dir.path(), "hand.ttf");
        catalog.refresh();
        assert_eq!(catalog.fonts().len(), 1);
    }

    #[test]
    fn font_resolution_falls_back_to_first() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.ttf");
        touch(dir.path(), "a.ttf");
        let catalog = AssetCatalog::scan(dir.path(), dir.path());

        assert_eq!(catalog.resolve_font("b").unwrap(), dir.path().join("b.ttf"));
        assert_eq!(catalog.resolve_font("missing").unwrap(), dir.path().join("a.ttf"));
    }

    #[test]
    fn no_fonts_is_font_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = AssetCatalog::scan(dir.path(), dir.path());
        assert!(matches!(
            catalog.resolve_font("any"),
            Err(ScrawlError::FontNotFound { .. })
        ));
    }

    #[test]
    fn backgrounds_load_as_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_pixel(30, 40, image::Rgba([10, 20, 30, 255]));
        img.save(dir.path().join("paper.png")).unwrap();

        let catalog = AssetCatalog::scan(dir.path(), dir.path());
        let bg = catalog.load_background(Some("paper")).unwrap();
        assert_eq!((bg.width(), bg.height()), (30, 40));
        assert!(matches!(bg, DynamicImage::ImageRgb8(_)));

        let plain = catalog.load_background(None).unwrap();
        assert_eq!(plain.width(), DEFAULT_BACKGROUND_SIZE);
        let unknown = catalog.load_background(Some("nope")).unwrap();
        assert_eq!(unknown.height(), DEFAULT_BACKGROUND_SIZE);
    }
}
