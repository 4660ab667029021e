//! Preset persistence.
//!
//! Presets live in one pretty-printed JSON object keyed by name, the last
//! active preset in a separate settings file. Both are rewritten whole on
//! every save via a temp file in the same directory plus rename, so a crash
//! mid-write never leaves half a JSON document behind.

use crate::error::ScrawlError;
use crate::preset::{Correction, Preset};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name that always resolves, to the built-in defaults if never saved.
pub const DEFAULT_PRESET_NAME: &str = "default";

/// Named presets backed by a JSON file.
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
}

impl PresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sorted names of every stored preset.
    pub fn list(&self) -> Result<Vec<String>, ScrawlError> {
        Ok(self.read_all()?.into_keys().collect())
    }

    /// Names are compared after trimming surrounding whitespace, here and
    /// in every other method.
    pub fn contains(&self, name: &str) -> Result<bool, ScrawlError> {
        Ok(self.read_all()?.contains_key(name.trim()))
    }

    /// Load a preset by name.
    pub fn load(&self, name: &str) -> Result<Preset, ScrawlError> {
        let name = name.trim();
        let mut presets = self.read_all()?;
        if let Some(preset) = presets.remove(name) {
            debug!("Loaded preset '{}' from {}", name, self.path.display());
            return Ok(preset);
        }
        if name == DEFAULT_PRESET_NAME {
            return Ok(Preset::default());
        }
        Err(ScrawlError::PresetNotFound {
            name: name.to_string(),
            available: describe_names(presets.keys()),
        })
    }

    /// Validate and save a preset under `name`, replacing any existing entry.
    ///
    /// A correctable violation is fixed before writing; the returned
    /// [`Correction`] says what changed.
    pub fn save(&self, name: &str, preset: &Preset) -> Result<Option<Correction>, ScrawlError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ScrawlError::validation("name", "preset name must not be empty"));
        }
        let (preset, correction) = preset.clone().corrected()?;

        let mut presets = self.read_all()?;
        presets.insert(name.to_string(), preset);
        write_json_atomic(&self.path, &presets)?;

        info!("Saved preset '{}' to {}", name, self.path.display());
        Ok(correction)
    }

    /// Remove a preset. Returns `false` if no such preset was stored.
    pub fn delete(&self, name: &str) -> Result<bool, ScrawlError> {
        let name = name.trim();
        let mut presets = self.read_all()?;
        if presets.remove(name).is_none() {
            return Ok(false);
        }
        write_json_atomic(&self.path, &presets)?;
        info!("Deleted preset '{}'", name);
        Ok(true)
    }

    fn read_all(&self) -> Result<BTreeMap<String, Preset>, ScrawlError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }
}

/// The last active preset, restored on the next start.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Preset>, ScrawlError> {
        read_json(&self.path)
    }

    pub fn save(&self, preset: &Preset) -> Result<(), ScrawlError> {
        write_json_atomic(&self.path, preset)?;
        debug!("Saved session settings to {}", self.path.display());
        Ok(())
    }
}

fn describe_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let names: Vec<&str> = names.map(String::as_str).collect();
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ScrawlError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ScrawlError::Parse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| ScrawlError::Parse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ScrawlError> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| ScrawlError::Internal(format!("serialise {}: {e}", path.display())))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| ScrawlError::write(&dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| ScrawlError::write(path, e))?;
    tmp.write_all(&json).map_err(|e| ScrawlError::write(path, e))?;
    tmp.persist(path).map_err(|e| ScrawlError::write(path, e.error))?;
    Ok(())
}
