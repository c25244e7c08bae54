// SPDX-License-Identifier: GPL-3.0-only

//! Capture configuration with JSON persistence

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tracing::warn;

use crate::backends::types::Facing;
use crate::constants::capture;

/// Directory name under the user config dir
const CONFIG_DIR: &str = "skincam";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Capture session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Which camera to open first
    pub facing: Facing,
    /// Preferred stream width
    pub width: u32,
    /// Preferred stream height
    pub height: u32,
    /// Snapshot JPEG quality (0-100)
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            facing: Facing::Front,
            width: capture::PREFERRED_WIDTH,
            height: capture::PREFERRED_HEIGHT,
            jpeg_quality: capture::JPEG_QUALITY,
        }
    }
}

impl CaptureConfig {
    /// Path of the persisted config file, if a config dir exists
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the persisted config, falling back to defaults.
    ///
    /// A missing file is normal (first run); an unreadable or unparsable
    /// file is logged and ignored.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read config");
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Malformed config, using defaults");
                Self::default()
            }
        }
    }

    /// Persist the config as pretty-printed JSON
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        std::fs::write(&path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_capture_constants() {
        let config = CaptureConfig::default();
        assert_eq!(config.facing, Facing::Front);
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.jpeg_quality, 95);
    }

    #[test]
    fn test_json_round_trip() {
        let config = CaptureConfig {
            facing: Facing::Back,
            width: 640,
            height: 480,
            jpeg_quality: 80,
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let back: CaptureConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let back: CaptureConfig =
            serde_json::from_str(r#"{ "facing": "back" }"#).expect("deserialize");
        assert_eq!(back.facing, Facing::Back);
        assert_eq!(back.width, 1280);
    }
}
