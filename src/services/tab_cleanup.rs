//! Best-effort removal helpers shared by the cleanup services.
//!
//! A tab or window that is already gone counts as removed: the user or a
//! concurrent sweep may have closed it between the scan and the removal.

use tracing::warn;

use crate::managers::tab_manager::TabProvider;
use crate::types::cleanup::RemovalOutcome;
use crate::types::tab::{TabId, WindowId};

pub async fn remove_tabs(provider: &dyn TabProvider, tab_ids: &[TabId]) -> RemovalOutcome {
    let mut outcome = RemovalOutcome::default();
    for &tab_id in tab_ids {
        match provider.remove_tab(tab_id).await {
            Ok(()) => outcome.removed += 1,
            Err(e) if e.is_gone() => outcome.removed += 1,
            Err(e) => {
                warn!(tab_id, error = %e, "tab removal rejected, continuing");
                outcome.failed += 1;
            }
        }
    }
    outcome
}

pub async fn remove_windows(provider: &dyn TabProvider, window_ids: &[WindowId]) -> RemovalOutcome {
    let mut outcome = RemovalOutcome::default();
    for &window_id in window_ids {
        match provider.remove_window(window_id).await {
            Ok(()) => outcome.removed += 1,
            Err(e) if e.is_gone() => outcome.removed += 1,
            Err(e) => {
                warn!(window_id, error = %e, "window removal rejected, continuing");
                outcome.failed += 1;
            }
        }
    }
    outcome
}
