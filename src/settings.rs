//! Runner settings
//!
//! Loaded from an optional JSON file; every field has a default so partial
//! files are fine. Gameplay tuning stays in `consts`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Headless runner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Viewport ===
    pub width: f64,
    pub height: f64,

    // === Run ===
    /// Run seed (derived from the clock and viewport when absent)
    pub seed: Option<u32>,
    /// Frames to simulate
    pub frames: u32,
    /// Wall-clock spacing between frames
    pub frame_ms: f64,
    /// Let the scripted pilot fly
    pub autopilot: bool,
    /// Start a new run when the current one ends
    pub restart_on_game_over: bool,

    // === Output ===
    /// Print the final snapshot as JSON
    pub dump_final: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            seed: None,
            frames: 60 * 60,
            frame_ms: 1000.0 / 60.0,
            autopilot: true,
            restart_on_game_over: false,
            dump_final: false,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json).map_err(|err| match err {
            SettingsError::Parse { source, .. } => SettingsError::Parse {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            serde_json::from_str(json).map_err(|source| SettingsError::Parse { path: None, source })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| SettingsError::Parse { path: None, source })?;
        fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Reject values the simulation can't run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.width > 0.0 && self.width.is_finite()) {
            return Err(SettingsError::Invalid {
                field: "width",
                reason: "must be a positive number",
            });
        }
        if !(self.height > 0.0 && self.height.is_finite()) {
            return Err(SettingsError::Invalid {
                field: "height",
                reason: "must be a positive number",
            });
        }
        if !(self.frame_ms >= 0.0 && self.frame_ms.is_finite()) {
            return Err(SettingsError::Invalid {
                field: "frame_ms",
                reason: "must be zero or positive",
            });
        }
        Ok(())
    }
}

/// Failure while loading or saving settings
#[derive(Debug)]
pub enum SettingsError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: Option<PathBuf>, source: serde_json::Error },
    Invalid { field: &'static str, reason: &'static str },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot access settings file {}: {source}", path.display())
            }
            Self::Parse {
                path: Some(path),
                source,
            } => write!(f, "invalid settings in {}: {source}", path.display()),
            Self::Parse { path: None, source } => write!(f, "invalid settings: {source}"),
            Self::Invalid { field, reason } => write!(f, "setting `{field}` {reason}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid { .. } => None,
        }
    }
}
