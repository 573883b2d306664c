//! Engine settings, read from `<sdk>/models/engine.toml`.

use serde::Deserialize;
use std::path::Path;

use crate::error::EngineError;

pub const SETTINGS_FILE: &str = "engine.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Keep only the highest-confidence face of each detection pass.
    pub detect_best_face_only: bool,
    /// Faces whose shorter side is below this many pixels are not reported.
    pub min_face_size: u32,
    /// Faces whose shorter side is below this many pixels get no signature.
    pub min_extractable_size: u32,
    /// Extraction needs the five-point landmarks.
    pub require_landmarks: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            detect_best_face_only: true,
            min_face_size: 4,
            min_extractable_size: 16,
            require_landmarks: true,
        }
    }
}

impl EngineSettings {
    /// Load settings from `models_dir`, falling back to defaults when the file is absent.
    pub fn load(models_dir: &Path) -> Result<Self, EngineError> {
        let path = models_dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| EngineError::Settings {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| EngineError::Settings {
            path,
            message: e.to_string(),
        })
    }
}
