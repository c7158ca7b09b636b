// Tabfix inactivity sweeper
// Closes background tabs that have not been looked at for the configured number
// of minutes. Runs on a periodic timer, independent of user actions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::managers::tab_manager::TabProvider;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::tab_cleanup;
use crate::types::errors::TabActionError;
use crate::types::settings::Settings;
use crate::types::tab::{TabId, WindowInfo};

/// Tabs idle for longer than the threshold. Active and audible tabs are
/// never idle; pinned tabs are exempt when `keepPinnedOnAutoClose` is set.
pub fn inactive_tabs(windows: &[WindowInfo], settings: &Settings, now_ms: i64) -> Vec<TabId> {
    if settings.auto_close_inactive_minutes == 0 {
        return Vec::new();
    }
    let threshold_ms = i64::from(settings.auto_close_inactive_minutes) * 60_000;

    windows
        .iter()
        .flat_map(|w| w.tabs.iter())
        .filter(|t| !t.active && !t.audible)
        .filter(|t| !(settings.keep_pinned_on_auto_close && t.pinned))
        .filter(|t| now_ms.saturating_sub(t.last_accessed) > threshold_ms)
        .map(|t| t.id)
        .collect()
}

pub struct InactivitySweeper {
    provider: Arc<dyn TabProvider>,
    settings: Arc<SettingsEngine>,
}

impl InactivitySweeper {
    pub fn new(provider: Arc<dyn TabProvider>, settings: Arc<SettingsEngine>) -> Self {
        Self { provider, settings }
    }

    /// Runs one sweep and returns the number of tabs closed.
    ///
    /// With the threshold at zero this returns before touching the provider.
    pub async fn sweep(&self, now_ms: i64) -> Result<usize, TabActionError> {
        let settings = self.settings.load().await?;
        if settings.auto_close_inactive_minutes == 0 {
            return Ok(0);
        }

        let windows = self.provider.all_windows().await?;
        let targets = inactive_tabs(&windows, &settings, now_ms);
        if targets.is_empty() {
            debug!("no inactive tabs");
            return Ok(0);
        }

        let outcome = tab_cleanup::remove_tabs(self.provider.as_ref(), &targets).await;
        info!(closed = outcome.removed, failed = outcome.failed, "inactive tabs closed");
        Ok(outcome.removed)
    }
}

/// Spawns a task that sweeps every `period` until aborted.
///
/// A failed sweep is logged and the next tick runs as usual.
pub fn spawn_inactivity_sweeper(sweeper: Arc<InactivitySweeper>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.sweep(Utc::now().timestamp_millis()).await {
                warn!(error = %e, "inactivity sweep failed");
            }
        }
    })
}
