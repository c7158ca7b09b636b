// Tabfix Duplicate Resolver
// Decides which tabs are redundant copies of an earlier tab and closes them.
// The first tab of each normalization key, in provider order, always survives.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::managers::tab_manager::TabProvider;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::tab_cleanup;
use crate::services::url_normalizer::{is_allowed_scheme, normalize};
use crate::types::cleanup::DuplicateReport;
use crate::types::config::EngineConfig;
use crate::types::errors::TabActionError;
use crate::types::settings::{DuplicateKeyMode, DuplicateScope, PinnedPrecedence, Settings};
use crate::types::tab::{TabId, TabInfo};

/// Knobs of a single resolve pass.
#[derive(Debug, Clone)]
pub struct DuplicateOptions {
    pub keep_pinned: bool,
    pub key_mode: DuplicateKeyMode,
    pub pinned_precedence: PinnedPrecedence,
    pub allowed_schemes: Vec<String>,
}

impl DuplicateOptions {
    pub fn from_settings(settings: &Settings, config: &EngineConfig) -> Self {
        Self {
            keep_pinned: settings.keep_pinned_on_duplicate_close,
            key_mode: settings.duplicate_key_mode,
            pinned_precedence: settings.pinned_precedence,
            allowed_schemes: config.allowed_schemes.clone(),
        }
    }
}

impl Default for DuplicateOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), &EngineConfig::default())
    }
}

/// Returns the ids of the tabs to close, in provider order.
///
/// Tabs with empty or non-http(s) URLs are never considered. Exempt pinned
/// tabs are never closed; under [`PinnedPrecedence::RecordAsSeen`] their key
/// still counts as seen.
pub fn resolve(tabs: &[TabInfo], options: &DuplicateOptions) -> Vec<TabId> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut to_close = Vec::new();

    for tab in tabs {
        if !is_allowed_scheme(&tab.url, &options.allowed_schemes) {
            continue;
        }
        let key = normalize(&tab.url, options.key_mode);

        if options.keep_pinned && tab.pinned {
            if options.pinned_precedence == PinnedPrecedence::RecordAsSeen {
                seen.insert(key);
            }
            continue;
        }

        if !seen.insert(key) {
            to_close.push(tab.id);
        }
    }
    to_close
}

/// Closes duplicate tabs according to the stored settings.
pub struct DuplicateCloser {
    provider: Arc<dyn TabProvider>,
    settings: Arc<SettingsEngine>,
    config: EngineConfig,
}

impl DuplicateCloser {
    pub fn new(provider: Arc<dyn TabProvider>, settings: Arc<SettingsEngine>, config: EngineConfig) -> Self {
        Self {
            provider,
            settings,
            config,
        }
    }

    pub async fn close_duplicates(&self) -> Result<DuplicateReport, TabActionError> {
        let settings = self.settings.load().await?;
        let tabs: Vec<TabInfo> = match settings.duplicate_scope {
            DuplicateScope::Window => self.provider.current_window().await?.tabs,
            DuplicateScope::AllWindows => self
                .provider
                .all_windows()
                .await?
                .into_iter()
                .flat_map(|w| w.tabs)
                .collect(),
        };

        let to_close = resolve(&tabs, &DuplicateOptions::from_settings(&settings, &self.config));
        if to_close.is_empty() {
            return Ok(DuplicateReport::default());
        }

        let outcome = tab_cleanup::remove_tabs(self.provider.as_ref(), &to_close).await;
        info!(closed = outcome.removed, failed = outcome.failed, "duplicate tabs closed");
        Ok(DuplicateReport {
            closed: outcome.removed,
            failed: outcome.failed,
        })
    }
}
