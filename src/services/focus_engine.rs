// Tabfix Focus Engine
// Enforces the configured focus scope against the live tab set. The scope in
// the settings record is the only state; every call recomputes from scratch.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::managers::tab_manager::TabProvider;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::tab_cleanup;
use crate::services::url_normalizer::{hostname, is_allowed_scheme, site_host, strip_www};
use crate::types::cleanup::FocusReport;
use crate::types::config::EngineConfig;
use crate::types::errors::TabActionError;
use crate::types::settings::{AllowlistMatch, FocusAction, FocusScope, Settings};
use crate::types::tab::{TabId, WindowInfo};

/// Out-of-scope tabs of the current window for the `domain` scope.
///
/// Empty when the window has no active tab or the active tab is not http(s).
pub fn domain_out_of_scope(window: &WindowInfo, settings: &Settings, schemes: &[String]) -> Vec<TabId> {
    let Some(active) = window.active_tab() else {
        return Vec::new();
    };
    if !is_allowed_scheme(&active.url, schemes) {
        return Vec::new();
    }
    let Some(focus_host) = site_host(&active.url) else {
        return Vec::new();
    };

    window
        .tabs
        .iter()
        .filter(|t| t.id != active.id)
        .filter(|t| is_allowed_scheme(&t.url, schemes))
        .filter(|t| !(settings.focus_keep_pinned && t.pinned))
        .filter(|t| settings.focus_close_audible || !t.audible)
        .filter(|t| site_host(&t.url).as_deref() != Some(focus_host.as_str()))
        .map(|t| t.id)
        .collect()
}

/// Out-of-scope tabs of the current window for the `allowlist` scope.
///
/// Pinned tabs and tabs without a hostname are always kept; whether a tab is
/// active does not matter.
pub fn allowlist_out_of_scope(window: &WindowInfo, allowlist: &[String], rule: AllowlistMatch) -> Vec<TabId> {
    let canonical = |host: &str| -> String {
        let host = host.trim().to_ascii_lowercase();
        match rule {
            AllowlistMatch::Exact => host,
            AllowlistMatch::StripWww => strip_www(&host).to_string(),
        }
    };
    let allowed: Vec<String> = allowlist.iter().map(|h| canonical(h)).collect();

    window
        .tabs
        .iter()
        .filter(|t| !t.pinned)
        .filter_map(|t| hostname(&t.url).map(|host| (t.id, canonical(&host))))
        .filter(|(_, host)| !allowed.contains(host))
        .map(|(id, _)| id)
        .collect()
}

/// Focus engine applying the stored focus settings.
pub struct FocusEngine {
    provider: Arc<dyn TabProvider>,
    settings: Arc<SettingsEngine>,
    config: EngineConfig,
}

impl FocusEngine {
    pub fn new(provider: Arc<dyn TabProvider>, settings: Arc<SettingsEngine>, config: EngineConfig) -> Self {
        Self {
            provider,
            settings,
            config,
        }
    }

    pub async fn enforce(&self) -> Result<FocusReport, TabActionError> {
        let settings = self.settings.load().await?;
        let scope = settings.focus_scope;

        let report = match scope {
            FocusScope::Window => self.close_other_windows().await?,
            FocusScope::Domain | FocusScope::Allowlist => {
                let window = self.provider.current_window().await?;
                let targets = if scope == FocusScope::Domain {
                    domain_out_of_scope(&window, &settings, &self.config.allowed_schemes)
                } else {
                    allowlist_out_of_scope(&window, &settings.focus_allowlist, settings.focus_allowlist_match)
                };
                self.apply(scope, settings.focus_action, &targets).await
            }
        };

        info!(
            scope = ?report.scope,
            windows_closed = report.windows_closed,
            tabs_closed = report.tabs_closed,
            tabs_grouped = report.tabs_grouped,
            failed = report.failed,
            "focus enforced"
        );
        Ok(report)
    }

    async fn close_other_windows(&self) -> Result<FocusReport, TabActionError> {
        let current = self.provider.current_window().await?;
        let others: Vec<_> = self
            .provider
            .all_windows()
            .await?
            .into_iter()
            .filter(|w| w.id != current.id)
            .map(|w| w.id)
            .collect();

        let outcome = tab_cleanup::remove_windows(self.provider.as_ref(), &others).await;
        Ok(FocusReport {
            windows_closed: outcome.removed,
            failed: outcome.failed,
            ..FocusReport::empty(FocusScope::Window)
        })
    }

    async fn apply(&self, scope: FocusScope, action: FocusAction, targets: &[TabId]) -> FocusReport {
        let mut report = FocusReport::empty(scope);
        if targets.is_empty() {
            debug!(scope = ?scope, "nothing out of focus");
            return report;
        }

        match action {
            FocusAction::Close => {
                let outcome = tab_cleanup::remove_tabs(self.provider.as_ref(), targets).await;
                report.tabs_closed = outcome.removed;
                report.failed = outcome.failed;
            }
            FocusAction::Group => {
                let label = &self.config.focus_group_label;
                let mut result = self.provider.group_tabs(targets, label, true).await.map(|_| targets.len());

                // A target closed since the scan: regroup whatever is left.
                if matches!(&result, Err(e) if e.is_gone()) {
                    let remaining = self.still_open(targets).await;
                    result = if remaining.is_empty() {
                        Ok(0)
                    } else {
                        self.provider.group_tabs(&remaining, label, true).await.map(|_| remaining.len())
                    };
                }

                match result {
                    Ok(grouped) => report.tabs_grouped = grouped,
                    Err(e) => {
                        warn!(error = %e, tabs = targets.len(), "could not group out-of-focus tabs");
                        report.failed = targets.len();
                    }
                }
            }
        }
        report
    }

    async fn still_open(&self, targets: &[TabId]) -> Vec<TabId> {
        match self.provider.current_window().await {
            Ok(window) => window
                .tabs
                .iter()
                .map(|t| t.id)
                .filter(|id| targets.contains(id))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}
