// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::types::{CameraMode, StreamConstraints};
use crate::constants::{analysis, app_info, capture};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::EncodingQuality;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name below the per-user config directory
const CONFIG_FILE_NAME: &str = "config.json";

/// Remote analysis service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Static service credential; environment variables take precedence
    pub api_key: Option<String>,
    /// Model identifier, e.g. "gemini-2.5-flash"
    pub model: String,
    /// Endpoint prefix the model path is appended to
    pub api_base_url: String,
    /// Whole-request timeout
    pub request_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: analysis::DEFAULT_MODEL.to_string(),
            api_base_url: analysis::API_BASE_URL.to_string(),
            request_timeout_secs: analysis::REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Facing mode used at startup
    pub camera_mode: CameraMode,
    /// Ideal capture width
    pub preferred_width: u32,
    /// Ideal capture height
    pub preferred_height: u32,
    /// JPEG quality of captured stills
    pub jpeg_quality: EncodingQuality,
    pub analysis: AnalysisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_mode: CameraMode::default(), // Rear camera
            preferred_width: capture::PREFERRED_WIDTH,
            preferred_height: capture::PREFERRED_HEIGHT,
            jpeg_quality: EncodingQuality::default(), // Medium (80)
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/vision-ai/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or the default location when `None`
    ///
    /// A missing file yields defaults. Credential environment variables are
    /// applied on top.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from(&path)?,
            None => {
                debug!("No config directory available, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a config file without consulting the environment
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Take the credential from the first non-empty variable in
    /// [`analysis::API_KEY_ENV_VARS`]
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let found = analysis::API_KEY_ENV_VARS
            .iter()
            .find_map(|var| lookup(var).filter(|v| !v.trim().is_empty()).map(|v| (*var, v)));

        if let Some((var, key)) = found {
            debug!(var, "Using API key from environment");
            self.analysis.api_key = Some(key);
        }
    }

    /// Device request for a facing mode with the configured ideal resolution
    pub fn stream_constraints(&self, facing: CameraMode) -> StreamConstraints {
        StreamConstraints::new(facing, self.preferred_width, self.preferred_height)
    }
}
