use serde::{Deserialize, Serialize};

pub type TabId = i64;
pub type WindowId = i64;
pub type GroupId = i64;

/// A live browser tab as reported by the tab provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub audible: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_accessed: i64,
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

/// A collapsible, labelled group of tabs inside one window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabGroup {
    pub id: GroupId,
    pub label: String,
    #[serde(default)]
    pub collapsed: bool,
}

/// A live browser window with its tabs in tab-strip order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub id: WindowId,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub tabs: Vec<TabInfo>,
    #[serde(default)]
    pub groups: Vec<TabGroup>,
}

impl WindowInfo {
    pub fn active_tab(&self) -> Option<&TabInfo> {
        self.tabs.iter().find(|t| t.active)
    }

    /// Label of the group a tab belongs to, if any.
    pub fn group_label(&self, group_id: Option<GroupId>) -> Option<&str> {
        let gid = group_id?;
        self.groups
            .iter()
            .find(|g| g.id == gid)
            .map(|g| g.label.as_str())
    }
}

/// Properties for a tab creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTab {
    pub window_id: WindowId,
    pub url: String,
    pub pinned: bool,
    pub active: bool,
}
