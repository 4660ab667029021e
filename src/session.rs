//! The application state a front end drives: one document buffer, one
//! active preset and the asset catalog they resolve against.
//!
//! Every operation is a synchronous request/response call. A failing call
//! leaves the session exactly as it was.

use crate::assets::AssetCatalog;
use crate::config::{AppPaths, ExportConfig};
use crate::document::{Document, ImportMode};
use crate::error::ScrawlError;
use crate::export::ExportJob;
use crate::loader::{DocumentLoader, ImportReport};
use crate::pipeline::render::{PageRenderer, Template};
use crate::preset::{min_line_spacing, Correction, Preset};
use crate::preview::{self, PreviewPager};
use crate::store::SettingsStore;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Session {
    loader: DocumentLoader,
    preset: Preset,
    assets: AssetCatalog,
}

impl Session {
    /// A session with an empty document and the default preset (with its
    /// line spacing already corrected).
    pub fn new(assets: AssetCatalog) -> Self {
        let mut preset = Preset::default();
        preset.margins.line_spacing = min_line_spacing(preset.font_size);
        Self {
            loader: DocumentLoader::new(),
            preset,
            assets,
        }
    }

    /// A session over `paths`, restoring the last active preset from the
    /// settings file when it is present and valid.
    pub fn restore(paths: &AppPaths) -> Self {
        let mut session = Self::new(AssetCatalog::from_paths(paths));
        match SettingsStore::new(&paths.settings_file).load() {
            Ok(Some(preset)) => {
                if let Err(e) = session.set_preset(preset) {
                    warn!("Ignoring saved settings: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring saved settings: {}", e),
        }
        session
    }

    pub fn document(&self) -> &Document {
        self.loader.document()
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn assets(&self) -> &AssetCatalog {
        &self.assets
    }

    /// Re-scan the font and background directories.
    pub fn refresh_assets(&mut self) {
        self.assets.refresh();
    }

    /// Replace the buffer with typed text.
    pub fn set_text(&mut self, text: &str) {
        self.loader.set_text(text);
    }

    /// Strict import; see [`DocumentLoader::import`].
    pub fn import<P: AsRef<Path>>(&mut self, paths: &[P], mode: ImportMode) -> Result<&Document, ScrawlError> {
        self.loader.import(paths, mode)
    }

    /// Lenient import; see [`DocumentLoader::import_lenient`].
    pub fn import_lenient<P: AsRef<Path>>(&mut self, paths: &[P], mode: ImportMode) -> ImportReport {
        self.loader.import_lenient(paths, mode)
    }

    /// Make `preset` active after validation, returning any correction.
    pub fn set_preset(&mut self, preset: Preset) -> Result<Option<Correction>, ScrawlError> {
        let (preset, correction) = preset.corrected()?;
        self.preset = preset;
        Ok(correction)
    }

    /// Persist the active preset as the session settings.
    pub fn save_settings(&self, store: &SettingsStore) -> Result<(), ScrawlError> {
        store.save(&self.preset)
    }

    pub fn clear(&mut self) {
        self.loader.clear();
    }

    /// The render template for the active preset.
    pub fn template(&self) -> Result<Template, ScrawlError> {
        Template::resolve(&self.preset, &self.assets).map(|(template, _)| template)
    }

    /// Render the preview pages for the current document.
    pub fn preview(&self, renderer: &dyn PageRenderer) -> Result<PreviewPager, ScrawlError> {
        let template = self.template()?;
        preview::render_preview(&self.document().text(), &template, renderer)
    }

    /// Snapshot the document and preset into an [`ExportJob`].
    pub fn export_job(&self, config: ExportConfig) -> Result<ExportJob, ScrawlError> {
        ExportJob::new(self.document(), &self.preset, &self.assets, config)
    }
}
