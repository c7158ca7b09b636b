use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::types::errors::ProviderError;
use crate::types::tab::{CreateTab, GroupId, TabGroup, TabId, TabInfo, WindowId, WindowInfo};

/// Trait defining the tab/window provider consumed by the engines.
///
/// Every call may suspend while the browser performs the request.
#[async_trait]
pub trait TabProvider: Send + Sync {
    /// The focused window with its tabs.
    async fn current_window(&self) -> Result<WindowInfo, ProviderError>;
    /// All windows with their tabs, in window creation order.
    async fn all_windows(&self) -> Result<Vec<WindowInfo>, ProviderError>;
    /// Opens a window seeded with `urls` in order.
    async fn create_window(&self, urls: &[String], focused: bool) -> Result<WindowInfo, ProviderError>;
    async fn create_tab(&self, props: CreateTab) -> Result<TabInfo, ProviderError>;
    async fn set_pinned(&self, tab_id: TabId, pinned: bool) -> Result<TabInfo, ProviderError>;
    async fn remove_tab(&self, tab_id: TabId) -> Result<(), ProviderError>;
    async fn remove_window(&self, window_id: WindowId) -> Result<(), ProviderError>;
    /// Collects tabs of one window into a labelled group.
    async fn group_tabs(&self, tab_ids: &[TabId], label: &str, collapsed: bool) -> Result<GroupId, ProviderError>;
}

#[derive(Debug, Default)]
struct BrowserState {
    windows: Vec<WindowInfo>,
    focused: Option<WindowId>,
    next_id: i64,
    blocked: Vec<String>,
}

impl BrowserState {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn is_blocked(&self, url: &str) -> bool {
        self.blocked.iter().any(|pattern| url.contains(pattern.as_str()))
    }

    fn window_mut(&mut self, window_id: WindowId) -> Option<&mut WindowInfo> {
        self.windows.iter_mut().find(|w| w.id == window_id)
    }

    /// (window index, tab index) of a tab.
    fn locate(&self, tab_id: TabId) -> Option<(usize, usize)> {
        self.windows.iter().enumerate().find_map(|(wi, w)| {
            w.tabs.iter().position(|t| t.id == tab_id).map(|ti| (wi, ti))
        })
    }

    fn set_focus(&mut self, window_id: Option<WindowId>) {
        self.focused = window_id;
        for w in &mut self.windows {
            w.focused = Some(w.id) == window_id;
        }
    }

    /// Focused window, or the first one when nothing claims focus.
    fn current(&self) -> Option<&WindowInfo> {
        self.focused
            .and_then(|id| self.windows.iter().find(|w| w.id == id))
            .or_else(|| self.windows.first())
    }
}

/// Count of pinned tabs (they are always at the left).
fn pinned_count(window: &WindowInfo) -> usize {
    window.tabs.iter().filter(|t| t.pinned).count()
}

/// Removes groups no tab refers to any more.
fn prune_groups(window: &mut WindowInfo) {
    let tabs = &window.tabs;
    window
        .groups
        .retain(|g| tabs.iter().any(|t| t.group_id == Some(g.id)));
}

/// In-memory tab provider.
///
/// Mirrors the browser's windows and tabs; used by the RPC host and tests.
/// URLs containing a blocked pattern are rejected on creation.
pub struct TabManager {
    state: Mutex<BrowserState>,
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BrowserState::default()),
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn state(&self) -> Result<MutexGuard<'_, BrowserState>, ProviderError> {
        self.state
            .lock()
            .map_err(|e| ProviderError::Unavailable(format!("state lock poisoned: {}", e)))
    }

    /// Replaces the whole browser state. Windows keep their IDs.
    pub fn load(&self, windows: Vec<WindowInfo>) -> Result<(), ProviderError> {
        let mut state = self.state()?;
        let max_id = windows
            .iter()
            .flat_map(|w| {
                std::iter::once(w.id)
                    .chain(w.tabs.iter().map(|t| t.id))
                    .chain(w.groups.iter().map(|g| g.id))
            })
            .max()
            .unwrap_or(0);
        let focused = windows
            .iter()
            .find(|w| w.focused)
            .or_else(|| windows.first())
            .map(|w| w.id);

        state.windows = windows
            .into_iter()
            .map(|mut w| {
                let id = w.id;
                for tab in &mut w.tabs {
                    tab.window_id = id;
                }
                w
            })
            .collect();
        state.next_id = state.next_id.max(max_id);
        state.set_focus(focused);
        Ok(())
    }

    /// Returns a copy of every window and tab.
    pub fn snapshot(&self) -> Result<Vec<WindowInfo>, ProviderError> {
        Ok(self.state()?.windows.clone())
    }

    /// Makes every later creation of a URL containing `pattern` fail.
    pub fn block_url(&self, pattern: &str) -> Result<(), ProviderError> {
        self.state()?.blocked.push(pattern.to_string());
        Ok(())
    }

    pub fn focus_window(&self, window_id: WindowId) -> Result<(), ProviderError> {
        let mut state = self.state()?;
        if !state.windows.iter().any(|w| w.id == window_id) {
            return Err(ProviderError::WindowNotFound(window_id));
        }
        state.set_focus(Some(window_id));
        Ok(())
    }

    /// Makes a tab the active one of its window.
    pub fn activate_tab(&self, tab_id: TabId) -> Result<(), ProviderError> {
        let mut state = self.state()?;
        let (wi, ti) = state.locate(tab_id).ok_or(ProviderError::TabNotFound(tab_id))?;
        let now = Self::now();
        for (i, tab) in state.windows[wi].tabs.iter_mut().enumerate() {
            tab.active = i == ti;
            if tab.active {
                tab.last_accessed = now;
            }
        }
        Ok(())
    }

    pub fn set_audible(&self, tab_id: TabId, audible: bool) -> Result<(), ProviderError> {
        let mut state = self.state()?;
        let (wi, ti) = state.locate(tab_id).ok_or(ProviderError::TabNotFound(tab_id))?;
        state.windows[wi].tabs[ti].audible = audible;
        Ok(())
    }

    pub fn set_last_accessed(&self, tab_id: TabId, millis: i64) -> Result<(), ProviderError> {
        let mut state = self.state()?;
        let (wi, ti) = state.locate(tab_id).ok_or(ProviderError::TabNotFound(tab_id))?;
        state.windows[wi].tabs[ti].last_accessed = millis;
        Ok(())
    }

    pub fn tab_count(&self) -> Result<usize, ProviderError> {
        Ok(self.state()?.windows.iter().map(|w| w.tabs.len()).sum())
    }

    pub fn window_count(&self) -> Result<usize, ProviderError> {
        Ok(self.state()?.windows.len())
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabProvider for TabManager {
    async fn current_window(&self) -> Result<WindowInfo, ProviderError> {
        let state = self.state()?;
        state
            .current()
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable("no open window".to_string()))
    }

    async fn all_windows(&self) -> Result<Vec<WindowInfo>, ProviderError> {
        Ok(self.state()?.windows.clone())
    }

    /// Opens a window with one tab per URL; the first tab is active.
    /// The whole request fails if any URL is blocked.
    async fn create_window(&self, urls: &[String], focused: bool) -> Result<WindowInfo, ProviderError> {
        let mut state = self.state()?;
        if let Some(url) = urls.iter().find(|u| state.is_blocked(u)) {
            return Err(ProviderError::Rejected(format!("blocked url: {}", url)));
        }

        let window_id = state.alloc_id();
        let now = Self::now();
        let mut tabs = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            let id = state.alloc_id();
            tabs.push(TabInfo {
                id,
                window_id,
                url: url.clone(),
                title: url.clone(),
                pinned: false,
                active: i == 0,
                audible: false,
                last_accessed: now,
                group_id: None,
            });
        }

        state.windows.push(WindowInfo {
            id: window_id,
            focused: false,
            tabs,
            groups: Vec::new(),
        });
        if focused || state.focused.is_none() {
            state.set_focus(Some(window_id));
        }

        state
            .windows
            .last()
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable("window vanished".to_string()))
    }

    /// Appends a tab to a window. Pinned tabs go to the end of the pinned section.
    async fn create_tab(&self, props: CreateTab) -> Result<TabInfo, ProviderError> {
        let mut state = self.state()?;
        if state.is_blocked(&props.url) {
            return Err(ProviderError::Rejected(format!("blocked url: {}", props.url)));
        }
        if !state.windows.iter().any(|w| w.id == props.window_id) {
            return Err(ProviderError::WindowNotFound(props.window_id));
        }

        let id = state.alloc_id();
        let now = Self::now();
        let window = state
            .window_mut(props.window_id)
            .ok_or(ProviderError::WindowNotFound(props.window_id))?;

        let becomes_active = props.active || window.active_tab().is_none();
        if becomes_active {
            for tab in &mut window.tabs {
                tab.active = false;
            }
        }

        let tab = TabInfo {
            id,
            window_id: props.window_id,
            url: props.url.clone(),
            title: props.url,
            pinned: props.pinned,
            active: becomes_active,
            audible: false,
            last_accessed: now,
            group_id: None,
        };
        if tab.pinned {
            let pos = pinned_count(window);
            window.tabs.insert(pos, tab.clone());
        } else {
            window.tabs.push(tab.clone());
        }
        Ok(tab)
    }

    /// Pins or unpins a tab, moving it to the edge of the pinned section.
    async fn set_pinned(&self, tab_id: TabId, pinned: bool) -> Result<TabInfo, ProviderError> {
        let mut state = self.state()?;
        let (wi, ti) = state.locate(tab_id).ok_or(ProviderError::TabNotFound(tab_id))?;
        let window = &mut state.windows[wi];

        if window.tabs[ti].pinned == pinned {
            return Ok(window.tabs[ti].clone());
        }

        let mut tab = window.tabs.remove(ti);
        tab.pinned = pinned;
        // Pinning appends to the pinned section; unpinning lands right after it.
        let pos = pinned_count(window).min(window.tabs.len());
        window.tabs.insert(pos, tab.clone());
        Ok(tab)
    }

    /// Closes a tab. If it was active, its nearest neighbour becomes active.
    /// A window left without tabs is closed as well.
    async fn remove_tab(&self, tab_id: TabId) -> Result<(), ProviderError> {
        let mut state = self.state()?;
        let (wi, ti) = state.locate(tab_id).ok_or(ProviderError::TabNotFound(tab_id))?;

        let window = &mut state.windows[wi];
        let removed = window.tabs.remove(ti);
        prune_groups(window);

        if window.tabs.is_empty() {
            let window_id = window.id;
            state.windows.remove(wi);
            if state.focused == Some(window_id) {
                let next = state.windows.first().map(|w| w.id);
                state.set_focus(next);
            }
            return Ok(());
        }

        if removed.active {
            let idx = ti.min(window.tabs.len() - 1);
            window.tabs[idx].active = true;
        }
        Ok(())
    }

    async fn remove_window(&self, window_id: WindowId) -> Result<(), ProviderError> {
        let mut state = self.state()?;
        let idx = state
            .windows
            .iter()
            .position(|w| w.id == window_id)
            .ok_or(ProviderError::WindowNotFound(window_id))?;
        state.windows.remove(idx);
        if state.focused == Some(window_id) {
            let next = state.windows.first().map(|w| w.id);
            state.set_focus(next);
        }
        Ok(())
    }

    async fn group_tabs(&self, tab_ids: &[TabId], label: &str, collapsed: bool) -> Result<GroupId, ProviderError> {
        let mut state = self.state()?;
        let first = *tab_ids
            .first()
            .ok_or_else(|| ProviderError::Rejected("cannot group zero tabs".to_string()))?;
        let (wi, _) = state.locate(first).ok_or(ProviderError::TabNotFound(first))?;

        for id in tab_ids {
            match state.locate(*id) {
                Some((w, _)) if w == wi => {}
                Some(_) => {
                    return Err(ProviderError::Rejected(format!(
                        "tab {} belongs to another window",
                        id
                    )))
                }
                None => return Err(ProviderError::TabNotFound(*id)),
            }
        }

        let group_id = state.alloc_id();
        let window = &mut state.windows[wi];
        for tab in window.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
            tab.group_id = Some(group_id);
        }
        window.groups.push(TabGroup {
            id: group_id,
            label: label.to_string(),
            collapsed,
        });
        prune_groups(window);
        Ok(group_id)
    }
}
