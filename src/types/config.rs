use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

/// Immutable engine configuration, fixed at construction time.
///
/// Unlike [`Settings`](super::settings::Settings) this is never persisted by the
/// engines; it comes from an optional JSON file read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of sessions kept in the archive.
    pub archive_cap: usize,
    /// URL schemes eligible for capture, duplicate detection and focus.
    pub allowed_schemes: Vec<String>,
    pub sessions_key: String,
    pub last_session_key: String,
    pub settings_key: String,
    /// Label of the group focus mode collects out-of-scope tabs into.
    pub focus_group_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            archive_cap: 30,
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            sessions_key: "tabfix:sessions".to_string(),
            last_session_key: "tabfix:lastSessionId".to_string(),
            settings_key: "tabfix:settings".to_string(),
            focus_group_label: "Out of focus".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from a JSON file.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read config file: {}", e)))?;

        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config file: {}", e)))?;

        if config.archive_cap == 0 {
            return Err(ConfigError::Parse("archive_cap must be at least 1".to_string()));
        }
        Ok(config)
    }
}
