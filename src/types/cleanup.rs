use serde::{Deserialize, Serialize};

use super::settings::FocusScope;

/// Per-element result of a best-effort batch of removals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemovalOutcome {
    /// Removed, or already gone when the removal was attempted.
    pub removed: usize,
    /// Rejected by the provider and skipped.
    pub failed: usize,
}

/// Result of a duplicate-closing pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub closed: usize,
    pub failed: usize,
}

/// Result of one focus enforcement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FocusReport {
    pub scope: FocusScope,
    pub windows_closed: usize,
    pub tabs_closed: usize,
    pub tabs_grouped: usize,
    pub failed: usize,
}

impl FocusReport {
    pub fn empty(scope: FocusScope) -> Self {
        Self {
            scope,
            windows_closed: 0,
            tabs_closed: 0,
            tabs_grouped: 0,
            failed: 0,
        }
    }
}
