//! Property-based tests for the session capture → restore round-trip.
//!
//! These tests verify that capturing a browser layout and restoring it into a
//! fresh browser reproduces every window's tab URLs, order and pin state.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use tabfix::database::Database;
use tabfix::managers::session_manager::{SessionManager, SessionManagerTrait};
use tabfix::managers::tab_manager::{TabManager, TabProvider};
use tabfix::types::config::EngineConfig;
use tabfix::types::session::RestoreMode;
use tabfix::types::tab::{TabInfo, WindowInfo};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

/// (url, pinned) of every tab, per window.
fn layout(windows: &[WindowInfo]) -> Vec<Vec<(String, bool)>> {
    windows
        .iter()
        .map(|w| w.tabs.iter().map(|t| (t.url.clone(), t.pinned)).collect())
        .collect()
}

/// Builds browser windows from pinned/unpinned URL lists; pinned tabs lead.
fn windows_from(plan: &[(Vec<String>, Vec<String>)]) -> Vec<WindowInfo> {
    let mut next_id = 0;
    let mut windows = Vec::with_capacity(plan.len());
    for (pinned, unpinned) in plan {
        next_id += 1;
        let window_id = next_id;
        let ordered = pinned
            .iter()
            .map(|u| (u, true))
            .chain(unpinned.iter().map(|u| (u, false)));

        let mut tabs = Vec::new();
        for (i, (url, is_pinned)) in ordered.enumerate() {
            next_id += 1;
            tabs.push(TabInfo {
                id: next_id,
                window_id,
                url: url.clone(),
                title: String::new(),
                pinned: is_pinned,
                active: i == 0,
                audible: false,
                last_accessed: 0,
                group_id: None,
            });
        }
        windows.push(WindowInfo {
            id: window_id,
            focused: false,
            tabs,
            groups: Vec::new(),
        });
    }
    windows
}

fn arb_url() -> impl Strategy<Value = String> {
    "https://[a-z]{3,8}\\.test/[a-z]{0,6}"
}

fn arb_window() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    (
        prop::collection::vec(arb_url(), 0..3),
        prop::collection::vec(arb_url(), 0..5),
    )
        .prop_filter("window needs a tab", |(p, u)| !p.is_empty() || !u.is_empty())
}

#[test]
fn pinned_and_plain_tab_roundtrip_in_new_window() {
    runtime().block_on(async {
        let store = Arc::new(Database::open_in_memory().unwrap());
        let source = Arc::new(TabManager::new());
        source
            .load(serde_json::from_value(json!([{"id": 1, "tabs": [
                {"id": 2, "windowId": 1, "url": "https://a.test/", "pinned": true, "active": true},
                {"id": 3, "windowId": 1, "url": "https://b.test/"}
            ]}]))
            .unwrap())
            .unwrap();
        SessionManager::new(source.clone(), store.clone(), EngineConfig::default())
            .capture(None)
            .await
            .unwrap();

        let target = Arc::new(TabManager::new());
        let sessions = SessionManager::new(target.clone(), store, EngineConfig::default());
        let report = sessions.restore_last(RestoreMode::NewWindow).await.unwrap();

        assert_eq!(report.tabs_created, 2);
        assert_eq!(report.tabs_failed, 0);
        assert_eq!(
            layout(&target.snapshot().unwrap()),
            vec![vec![
                ("https://a.test/".to_string(), true),
                ("https://b.test/".to_string(), false)
            ]]
        );
    });
}

#[test]
fn pinned_and_plain_tab_roundtrip_in_current_window() {
    runtime().block_on(async {
        let store = Arc::new(Database::open_in_memory().unwrap());
        let source = Arc::new(TabManager::new());
        let window = source.create_window(&["https://b.test/".to_string()], true).await.unwrap();
        source.create_tab(tabfix::types::tab::CreateTab {
            window_id: window.id,
            url: "https://a.test/".to_string(),
            pinned: true,
            active: false,
        })
        .await
        .unwrap();
        SessionManager::new(source.clone(), store.clone(), EngineConfig::default())
            .capture(None)
            .await
            .unwrap();

        let target = Arc::new(TabManager::new());
        target.create_window(&["https://start.test/".to_string()], true).await.unwrap();
        let sessions = SessionManager::new(target.clone(), store, EngineConfig::default());
        sessions.restore_last(RestoreMode::CurrentWindow).await.unwrap();

        let windows = target.snapshot().unwrap();
        assert_eq!(windows.len(), 1);
        let tabs = layout(&windows).remove(0);
        assert!(tabs.contains(&("https://a.test/".to_string(), true)));
        assert!(tabs.contains(&("https://b.test/".to_string(), false)));
        assert!(tabs.contains(&("https://start.test/".to_string(), false)));
    });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn capture_restore_reproduces_layout(windows_plan in prop::collection::vec(arb_window(), 1..4)) {
        let original = windows_from(&windows_plan);
        let restored = runtime().block_on(async {
            let store = Arc::new(Database::open_in_memory().unwrap());
            let source = Arc::new(TabManager::new());
            source.load(original.clone()).unwrap();
            SessionManager::new(source, store.clone(), EngineConfig::default())
                .capture(Some("prop"))
                .await
                .unwrap();

            let target = Arc::new(TabManager::new());
            SessionManager::new(target.clone(), store, EngineConfig::default())
                .restore_last(RestoreMode::NewWindow)
                .await
                .unwrap();
            target.snapshot().unwrap()
        });

        prop_assert_eq!(layout(&restored), layout(&original));
    }

    #[test]
    fn stored_session_json_roundtrip(windows_plan in prop::collection::vec(arb_window(), 1..4)) {
        let session = runtime().block_on(async {
            let store = Arc::new(Database::open_in_memory().unwrap());
            let source = Arc::new(TabManager::new());
            source.load(windows_from(&windows_plan)).unwrap();
            let sessions = SessionManager::new(source, store, EngineConfig::default());
            let captured = sessions.capture(None).await.unwrap();
            let listed = sessions.list().await.unwrap();
            (captured, listed)
        });

        prop_assert_eq!(session.1.len(), 1);
        prop_assert_eq!(&session.1[0], &session.0);
    }
}
