use serde::{Deserialize, Serialize};

/// Current schema version written into every new session record.
pub const SESSION_RECORD_VERSION: u32 = 1;

fn default_version() -> u32 {
    SESSION_RECORD_VERSION
}

/// A captured snapshot of one or more windows.
///
/// Records are never edited in place: rename and favorite changes produce a new
/// record that replaces the old one in the archive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default = "default_version")]
    pub version: u32,
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default)]
    pub favorite: bool,
    pub windows: Vec<WindowSnapshot>,
}

impl Session {
    pub fn tab_count(&self) -> usize {
        self.windows.iter().map(|w| w.tabs.len()).sum()
    }

    /// Returns a copy with a new name.
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Returns a copy with the favorite flag set.
    pub fn with_favorite(&self, favorite: bool) -> Self {
        Self {
            favorite,
            ..self.clone()
        }
    }
}

/// The tabs of one window at capture time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub tabs: Vec<TabSnapshot>,
}

/// A tab's state as stored in a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    pub url: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Where a restored session's tabs are opened.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RestoreMode {
    NewWindow,
    CurrentWindow,
}

/// Outcome of a restore pass. Failed tabs were skipped, not retried.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub session_id: String,
    pub windows_created: usize,
    pub tabs_created: usize,
    pub tabs_failed: usize,
}
