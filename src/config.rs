// SPDX-License-Identifier: GPL-3.0-only

//! Persistent settings
//!
//! Only capture and output preferences are stored. Processor chains always
//! come from the command line.

use crate::constants::{app_info::APP_NAME, capture, timing};
use crate::errors::{VelvetError, VelvetResult};
use crate::storage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the settings file inside the config directory
pub const CONFIG_FILE: &str = "config.json";

/// Preferred capture settings
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Requested width, the device picks the nearest it supports
    pub width: u32,
    /// Requested height
    pub height: u32,
    /// Capture device path, `/dev/video0` when unset
    pub device: Option<PathBuf>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: capture::DEFAULT_WIDTH,
            height: capture::DEFAULT_HEIGHT,
            device: None,
        }
    }
}

impl CaptureSettings {
    pub fn device_path(&self) -> PathBuf {
        self.device
            .clone()
            .unwrap_or_else(|| PathBuf::from(capture::DEFAULT_DEVICE))
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureSettings,
    /// Target display refresh rate
    pub refresh_rate_hz: u32,
    /// tracing filter directive used when `RUST_LOG` is unset
    pub log_filter: Option<String>,
    /// Where snapshots go, `~/Pictures/velvet` when unset
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureSettings::default(),
            refresh_rate_hz: timing::DEFAULT_REFRESH_RATE_HZ,
            log_filter: None,
            snapshot_dir: None,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/velvet/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Read settings from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> VelvetResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            VelvetError::Config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Load from an explicit path, or from the default location
    pub fn resolve(explicit: Option<&Path>) -> VelvetResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Write settings as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> VelvetResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json + "\n")?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> VelvetResult<()> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(VelvetError::Config(format!(
                "capture size {}x{} is empty",
                self.capture.width, self.capture.height
            )));
        }
        if self.refresh_rate_hz == 0 {
            return Err(VelvetError::Config(
                "refresh_rate_hz must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(storage::default_snapshot_dir)
    }
}
