//! Unit tests for duplicate detection and the duplicate closer.

use std::sync::Arc;

use async_trait::async_trait;
use rstest::rstest;
use serde_json::json;
use tabfix::database::Database;
use tabfix::managers::tab_manager::{TabManager, TabProvider};
use tabfix::services::duplicate_resolver::{resolve, DuplicateCloser, DuplicateOptions};
use tabfix::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use tabfix::services::tab_cleanup;
use tabfix::types::config::EngineConfig;
use tabfix::types::errors::ProviderError;
use tabfix::types::settings::{DuplicateKeyMode, PinnedPrecedence};
use tabfix::types::tab::{CreateTab, GroupId, TabId, TabInfo, WindowId, WindowInfo};

fn tab(id: TabId, url: &str, pinned: bool) -> TabInfo {
    TabInfo {
        id,
        window_id: 1,
        url: url.to_string(),
        title: String::new(),
        pinned,
        active: false,
        audible: false,
        last_accessed: 0,
        group_id: None,
    }
}

// === resolve ===

#[test]
fn test_later_copies_close_and_pinned_survives() {
    let tabs = vec![
        tab(1, "https://x.test/", false),
        tab(2, "https://x.test/", false),
        tab(3, "https://x.test/", true),
    ];
    assert_eq!(resolve(&tabs, &DuplicateOptions::default()), vec![2]);
}

#[test]
fn test_query_and_fragment_variants_are_duplicates() {
    let tabs = vec![
        tab(1, "https://x.test/a?ref=1", false),
        tab(2, "https://x.test/a#section", false),
        tab(3, "https://x.test/b", false),
    ];
    assert_eq!(resolve(&tabs, &DuplicateOptions::default()), vec![2]);
}

#[rstest]
#[case(PinnedPrecedence::RecordAsSeen, vec![2])]
#[case(PinnedPrecedence::ExemptOnly, vec![])]
fn test_pinned_first_precedence(#[case] precedence: PinnedPrecedence, #[case] expected: Vec<TabId>) {
    let tabs = vec![tab(1, "https://x.test/", true), tab(2, "https://x.test/", false)];
    let options = DuplicateOptions {
        pinned_precedence: precedence,
        ..DuplicateOptions::default()
    };
    assert_eq!(resolve(&tabs, &options), expected);
}

#[test]
fn test_pinned_copies_close_when_not_kept() {
    let tabs = vec![tab(1, "https://x.test/", false), tab(2, "https://x.test/", true)];
    let options = DuplicateOptions {
        keep_pinned: false,
        ..DuplicateOptions::default()
    };
    assert_eq!(resolve(&tabs, &options), vec![2]);
}

#[test]
fn test_non_web_urls_are_ignored() {
    let tabs = vec![
        tab(1, "chrome://newtab", false),
        tab(2, "chrome://newtab", false),
        tab(3, "", false),
        tab(4, "", false),
        tab(5, "file:///tmp/a", false),
        tab(6, "file:///tmp/a", false),
    ];
    assert!(resolve(&tabs, &DuplicateOptions::default()).is_empty());
}

#[test]
fn test_strip_fragment_mode_keeps_queries_distinct() {
    let tabs = vec![
        tab(1, "https://x.test/a?page=1", false),
        tab(2, "https://x.test/a?page=2", false),
        tab(3, "https://x.test/a?page=1#top", false),
    ];
    let options = DuplicateOptions {
        key_mode: DuplicateKeyMode::StripFragment,
        ..DuplicateOptions::default()
    };
    assert_eq!(resolve(&tabs, &options), vec![3]);
}

#[test]
fn test_empty_input() {
    assert!(resolve(&[], &DuplicateOptions::default()).is_empty());
}

// === DuplicateCloser ===

fn closer_for(browser: Arc<TabManager>) -> (DuplicateCloser, Arc<SettingsEngine>) {
    let config = EngineConfig::default();
    let store = Arc::new(Database::open_in_memory().unwrap());
    let settings = Arc::new(SettingsEngine::new(store, &config));
    (DuplicateCloser::new(browser, settings.clone(), config), settings)
}

fn two_windows_with_copies(browser: &TabManager) {
    let windows: Vec<WindowInfo> = serde_json::from_value(json!([
        {"id": 1, "focused": true, "tabs": [
            {"id": 10, "windowId": 1, "url": "https://x.test/", "active": true},
            {"id": 11, "windowId": 1, "url": "https://x.test/?utm=1"},
            {"id": 12, "windowId": 1, "url": "https://y.test/"}
        ]},
        {"id": 2, "tabs": [
            {"id": 20, "windowId": 2, "url": "https://y.test/", "active": true},
            {"id": 21, "windowId": 2, "url": "https://z.test/"}
        ]}
    ]))
    .unwrap();
    browser.load(windows).unwrap();
}

#[tokio::test]
async fn test_close_duplicates_in_current_window() {
    let browser = Arc::new(TabManager::new());
    two_windows_with_copies(&browser);
    let (closer, _) = closer_for(browser.clone());

    let report = closer.close_duplicates().await.unwrap();
    assert_eq!(report.closed, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(browser.tab_count().unwrap(), 4, "the copy in the other window is out of scope");
}

#[tokio::test]
async fn test_close_duplicates_across_windows() {
    let browser = Arc::new(TabManager::new());
    two_windows_with_copies(&browser);
    let (closer, settings) = closer_for(browser.clone());
    settings.update(&json!({"duplicateScope": "allWindows"})).await.unwrap();

    let report = closer.close_duplicates().await.unwrap();
    assert_eq!(report.closed, 2);

    let remaining: Vec<TabId> = browser
        .snapshot()
        .unwrap()
        .iter()
        .flat_map(|w| w.tabs.iter().map(|t| t.id))
        .collect();
    assert_eq!(remaining, vec![10, 12, 21]);
}

#[tokio::test]
async fn test_close_duplicates_without_copies_is_empty_report() {
    let browser = Arc::new(TabManager::new());
    browser
        .create_window(&["https://a.test/".to_string(), "https://b.test/".to_string()], true)
        .await
        .unwrap();
    let (closer, _) = closer_for(browser.clone());

    let report = closer.close_duplicates().await.unwrap();
    assert_eq!(report.closed, 0);
    assert_eq!(browser.tab_count().unwrap(), 2);
}

// === Best-effort removal ===

/// Provider whose removals fail in scripted ways.
struct ScriptedRemovals {
    inner: TabManager,
    gone: Vec<TabId>,
    rejected: Vec<TabId>,
}

#[async_trait]
impl TabProvider for ScriptedRemovals {
    async fn current_window(&self) -> Result<WindowInfo, ProviderError> {
        self.inner.current_window().await
    }
    async fn all_windows(&self) -> Result<Vec<WindowInfo>, ProviderError> {
        self.inner.all_windows().await
    }
    async fn create_window(&self, urls: &[String], focused: bool) -> Result<WindowInfo, ProviderError> {
        self.inner.create_window(urls, focused).await
    }
    async fn create_tab(&self, props: CreateTab) -> Result<TabInfo, ProviderError> {
        self.inner.create_tab(props).await
    }
    async fn set_pinned(&self, tab_id: TabId, pinned: bool) -> Result<TabInfo, ProviderError> {
        self.inner.set_pinned(tab_id, pinned).await
    }
    async fn remove_tab(&self, tab_id: TabId) -> Result<(), ProviderError> {
        if self.gone.contains(&tab_id) {
            return Err(ProviderError::TabNotFound(tab_id));
        }
        if self.rejected.contains(&tab_id) {
            return Err(ProviderError::Rejected("tab is locked".to_string()));
        }
        self.inner.remove_tab(tab_id).await
    }
    async fn remove_window(&self, window_id: WindowId) -> Result<(), ProviderError> {
        self.inner.remove_window(window_id).await
    }
    async fn group_tabs(&self, tab_ids: &[TabId], label: &str, collapsed: bool) -> Result<GroupId, ProviderError> {
        self.inner.group_tabs(tab_ids, label, collapsed).await
    }
}

#[tokio::test]
async fn test_remove_tabs_counts_gone_as_removed() {
    let inner = TabManager::new();
    let window = inner
        .create_window(
            &["https://a.test/".to_string(), "https://b.test/".to_string(), "https://c.test/".to_string()],
            true,
        )
        .await
        .unwrap();
    let ids: Vec<TabId> = window.tabs.iter().map(|t| t.id).collect();
    let provider = ScriptedRemovals {
        inner,
        gone: vec![ids[0]],
        rejected: vec![ids[1]],
    };

    let outcome = tab_cleanup::remove_tabs(&provider, &ids).await;
    assert_eq!(outcome.removed, 2);
    assert_eq!(outcome.failed, 1);
}

#[tokio::test]
async fn test_remove_windows_counts_missing_as_removed() {
    let browser = TabManager::new();
    let window = browser.create_window(&["https://a.test/".to_string()], true).await.unwrap();

    let outcome = tab_cleanup::remove_windows(&browser, &[window.id, 999]).await;
    assert_eq!(outcome.removed, 2);
    assert_eq!(outcome.failed, 0);
    assert_eq!(browser.window_count().unwrap(), 0);
}
