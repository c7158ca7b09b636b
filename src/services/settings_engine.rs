// Tabfix Settings Engine
// Typed wrapper over the persistence store holding the single settings record.
// Updates are shallow patches: each top-level key in the patch overwrites the
// stored value of the same option.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::database::store::{self, PersistenceStore, StorageArea};
use crate::types::config::EngineConfig;
use crate::types::errors::{SettingsError, StoreError};
use crate::types::settings::Settings;

/// Trait defining the settings engine interface.
#[async_trait]
pub trait SettingsEngineTrait {
    /// Writes the defaults when no record exists yet. Returns the current record.
    async fn initialize(&self) -> Result<Settings, SettingsError>;
    async fn load(&self) -> Result<Settings, SettingsError>;
    async fn update(&self, patch: &Value) -> Result<Settings, SettingsError>;
    async fn reset(&self) -> Result<Settings, SettingsError>;
}

/// Settings engine persisting the record in the synced store area.
pub struct SettingsEngine {
    store: Arc<dyn PersistenceStore>,
    key: String,
}

impl SettingsEngine {
    pub fn new(store: Arc<dyn PersistenceStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            key: config.settings_key.clone(),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        store::save(self.store.as_ref(), StorageArea::Synced, &self.key, settings).await?;
        Ok(())
    }
}

/// Applies a shallow patch to a settings record.
///
/// Every key of `patch` must name an existing option other than `version`;
/// the patched record must still decode as [`Settings`].
pub fn apply_patch(current: &Settings, patch: &Value) -> Result<Settings, SettingsError> {
    let patch = patch
        .as_object()
        .ok_or_else(|| SettingsError::InvalidValue("patch must be a JSON object".to_string()))?;

    let mut json_value = serde_json::to_value(current)
        .map_err(|e| SettingsError::InvalidValue(format!("Failed to serialize settings: {}", e)))?;

    let map = json_value
        .as_object_mut()
        .ok_or_else(|| SettingsError::InvalidValue("settings are not an object".to_string()))?;

    for (key, value) in patch {
        // The record version is not a user option.
        if key == "version" || !map.contains_key(key) {
            return Err(SettingsError::InvalidKey(key.clone()));
        }
        map.insert(key.clone(), value.clone());
    }

    serde_json::from_value(json_value)
        .map_err(|e| SettingsError::InvalidValue(format!("Invalid settings patch: {}", e)))
}

#[async_trait]
impl SettingsEngineTrait for SettingsEngine {
    async fn initialize(&self) -> Result<Settings, SettingsError> {
        match self.store.get(StorageArea::Synced, &self.key).await? {
            Some(_) => self.load().await,
            None => {
                let defaults = Settings::default();
                self.save(&defaults).await?;
                debug!("settings initialized with defaults");
                Ok(defaults)
            }
        }
    }

    /// Loads the record. Absent → defaults. A record that no longer decodes
    /// is replaced by the defaults in memory and reported with a warning.
    async fn load(&self) -> Result<Settings, SettingsError> {
        match store::load_or(self.store.as_ref(), StorageArea::Synced, &self.key, Settings::default()).await {
            Ok(settings) => Ok(settings),
            Err(StoreError::Serialization(msg)) => {
                warn!(error = %msg, "stored settings are malformed, using defaults");
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, patch: &Value) -> Result<Settings, SettingsError> {
        let current = self.load().await?;
        let updated = apply_patch(&current, patch)?;
        self.save(&updated).await?;
        debug!(keys = ?patch.as_object().map(|m| m.keys().cloned().collect::<Vec<_>>()), "settings updated");
        Ok(updated)
    }

    async fn reset(&self) -> Result<Settings, SettingsError> {
        let defaults = Settings::default();
        self.save(&defaults).await?;
        Ok(defaults)
    }
}
