//! Session Manager for Tabfix.
//!
//! Captures the provider's windows into immutable [`Session`] records, keeps them
//! in a bounded newest-first archive in the local store area, and replays them
//! back onto the provider.
//!
//! Restores are best-effort per tab: a tab the provider refuses to open is
//! logged and skipped, the rest of the session still opens.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::store::{self, PersistenceStore, StorageArea};
use crate::managers::tab_manager::TabProvider;
use crate::services::url_normalizer::is_allowed_scheme;
use crate::types::config::EngineConfig;
use crate::types::errors::SessionError;
use crate::types::session::{
    RestoreMode, RestoreReport, Session, TabSnapshot, WindowSnapshot, SESSION_RECORD_VERSION,
};
use crate::types::tab::{CreateTab, TabId, WindowId};

/// Trait defining session management operations.
#[async_trait]
pub trait SessionManagerTrait {
    async fn capture(&self, label: Option<&str>) -> Result<Session, SessionError>;
    async fn restore(&self, session: &Session, mode: RestoreMode) -> Result<RestoreReport, SessionError>;
    async fn restore_by_id(&self, id: &str, mode: RestoreMode) -> Result<RestoreReport, SessionError>;
    async fn restore_last(&self, mode: RestoreMode) -> Result<RestoreReport, SessionError>;
    async fn restore_favorite(&self, mode: RestoreMode) -> Result<RestoreReport, SessionError>;
    async fn lookup_last(&self) -> Result<Session, SessionError>;
    async fn lookup_favorite(&self) -> Result<Session, SessionError>;
    async fn list(&self) -> Result<Vec<Session>, SessionError>;
    async fn get(&self, id: &str) -> Result<Session, SessionError>;
    async fn delete(&self, id: &str) -> Result<Vec<Session>, SessionError>;
    async fn rename(&self, id: &str, name: &str) -> Result<Session, SessionError>;
    async fn set_favorite(&self, id: &str, favorite: bool) -> Result<Session, SessionError>;
    async fn import_batch(&self, sessions: Vec<Session>) -> Result<usize, SessionError>;
    async fn import_json(&self, text: &str) -> Result<usize, SessionError>;
    async fn export_json(&self) -> Result<String, SessionError>;
}

/// Session manager backed by a tab provider and a persistence store.
pub struct SessionManager {
    provider: Arc<dyn TabProvider>,
    store: Arc<dyn PersistenceStore>,
    config: EngineConfig,
}

/// Shape accepted by the importer: current records, or legacy records with a
/// flat `items` tab list instead of windows.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedSession {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    favorite: bool,
    #[serde(default)]
    windows: Option<Vec<WindowSnapshot>>,
    #[serde(default)]
    items: Option<Vec<TabSnapshot>>,
}

impl ImportedSession {
    fn into_session(self, now: DateTime<Utc>) -> Result<Session, String> {
        let version = self.version.unwrap_or(SESSION_RECORD_VERSION);
        if version > SESSION_RECORD_VERSION {
            return Err(format!("unsupported record version {}", version));
        }
        let windows = match (self.windows, self.items) {
            (Some(windows), _) => windows,
            (None, Some(items)) => vec![WindowSnapshot { tabs: items }],
            (None, None) => return Err("record has neither windows nor items".to_string()),
        };
        let created_at = self.created_at.unwrap_or_else(|| now.timestamp_millis());
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_name(created_at));

        Ok(Session {
            version,
            id: self.id.unwrap_or_default(),
            name,
            created_at,
            favorite: self.favorite,
            windows,
        })
    }
}

/// `Session YYYY-MM-DD HH:MM:SS` in UTC.
fn default_name(created_at_ms: i64) -> String {
    let stamp = DateTime::<Utc>::from_timestamp_millis(created_at_ms).unwrap_or_else(Utc::now);
    format!("Session {}", stamp.format("%Y-%m-%d %H:%M:%S"))
}

/// Drops tabs whose scheme is not allowed, then windows left without tabs.
fn keep_allowed_tabs(windows: &[WindowSnapshot], schemes: &[String]) -> Vec<WindowSnapshot> {
    windows
        .iter()
        .filter_map(|w| {
            let tabs: Vec<TabSnapshot> = w
                .tabs
                .iter()
                .filter(|t| is_allowed_scheme(&t.url, schemes))
                .cloned()
                .collect();
            (!tabs.is_empty()).then_some(WindowSnapshot { tabs })
        })
        .collect()
}

/// Clears every favorite flag after the first one.
fn keep_single_favorite(archive: Vec<Session>) -> Vec<Session> {
    let mut seen = false;
    archive
        .into_iter()
        .map(|s| {
            if s.favorite && seen {
                s.with_favorite(false)
            } else {
                seen |= s.favorite;
                s
            }
        })
        .collect()
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn TabProvider>,
        store: Arc<dyn PersistenceStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    /// Loads the archive. Records that no longer decode are dropped.
    async fn load_archive(&self) -> Result<Vec<Session>, SessionError> {
        let raw = self
            .store
            .get(StorageArea::Local, &self.config.sessions_key)
            .await?;

        let items = match raw {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => {
                warn!("stored session archive is not a list, ignoring it");
                return Ok(Vec::new());
            }
        };

        let mut archive = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<Session>(item) {
                Ok(session) => archive.push(session),
                Err(e) => warn!(index = i, error = %e, "dropping malformed archived session"),
            }
        }
        Ok(archive)
    }

    /// Trims the archive to the cap and writes it back.
    async fn persist(&self, mut archive: Vec<Session>) -> Result<Vec<Session>, SessionError> {
        if archive.len() > self.config.archive_cap {
            debug!(evicted = archive.len() - self.config.archive_cap, "trimming session archive");
            archive.truncate(self.config.archive_cap);
        }
        store::save(
            self.store.as_ref(),
            StorageArea::Local,
            &self.config.sessions_key,
            &archive,
        )
        .await?;
        Ok(archive)
    }

    async fn last_session_id(&self) -> Result<Option<String>, SessionError> {
        let value = self
            .store
            .get(StorageArea::Local, &self.config.last_session_key)
            .await?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn set_last_session_id(&self, id: Option<&str>) -> Result<(), SessionError> {
        let value = match id {
            Some(id) => Value::String(id.to_string()),
            None => Value::Null,
        };
        self.store
            .set(StorageArea::Local, &self.config.last_session_key, value)
            .await?;
        Ok(())
    }

    /// Opens one snapshot as a new window. Pins are applied in a second pass.
    async fn restore_into_new_window(
        &self,
        snapshot: &WindowSnapshot,
        focused: bool,
        report: &mut RestoreReport,
    ) {
        let urls: Vec<String> = snapshot.tabs.iter().map(|t| t.url.clone()).collect();

        let created: Vec<(TabId, &TabSnapshot)> = match self.provider.create_window(&urls, focused).await {
            Ok(window) => {
                report.windows_created += 1;
                report.tabs_failed += snapshot.tabs.len().saturating_sub(window.tabs.len());
                window
                    .tabs
                    .iter()
                    .map(|t| t.id)
                    .zip(snapshot.tabs.iter())
                    .collect()
            }
            Err(e) => {
                warn!(error = %e, "seeded window rejected, opening tabs one by one");
                let window = match self.provider.create_window(&[], focused).await {
                    Ok(window) => window,
                    Err(e) => {
                        warn!(error = %e, tabs = snapshot.tabs.len(), "could not open window, skipping it");
                        report.tabs_failed += snapshot.tabs.len();
                        return;
                    }
                };
                report.windows_created += 1;
                self.append_tabs(window.id, snapshot, false, report).await
            }
        };
        report.tabs_created += created.len();

        for (tab_id, tab) in created.iter().filter(|(_, t)| t.pinned) {
            if let Err(e) = self.provider.set_pinned(*tab_id, true).await {
                warn!(tab_id = *tab_id, url = %tab.url, error = %e, "could not pin restored tab");
            }
        }
        self.regroup(&created).await;
    }

    /// Appends a snapshot's tabs to an existing window, in order.
    /// With `pin_each`, a tab's pin state is applied right after it opens.
    async fn append_tabs<'a>(
        &self,
        window_id: WindowId,
        snapshot: &'a WindowSnapshot,
        pin_each: bool,
        report: &mut RestoreReport,
    ) -> Vec<(TabId, &'a TabSnapshot)> {
        let mut created = Vec::with_capacity(snapshot.tabs.len());
        for tab in &snapshot.tabs {
            let props = CreateTab {
                window_id,
                url: tab.url.clone(),
                pinned: false,
                active: false,
            };
            match self.provider.create_tab(props).await {
                Ok(info) => {
                    if pin_each && tab.pinned {
                        if let Err(e) = self.provider.set_pinned(info.id, true).await {
                            warn!(tab_id = info.id, url = %tab.url, error = %e, "could not pin restored tab");
                        }
                    }
                    created.push((info.id, tab));
                }
                Err(e) => {
                    warn!(url = %tab.url, error = %e, "skipping tab the provider rejected");
                    report.tabs_failed += 1;
                }
            }
        }
        created
    }

    /// Re-applies group labels: tabs sharing a label end up in one group.
    async fn regroup(&self, created: &[(TabId, &TabSnapshot)]) {
        let mut groups: Vec<(&str, Vec<TabId>)> = Vec::new();
        for (tab_id, tab) in created {
            let Some(label) = tab.group.as_deref() else {
                continue;
            };
            match groups.iter_mut().find(|(l, _)| *l == label) {
                Some((_, ids)) => ids.push(*tab_id),
                None => groups.push((label, vec![*tab_id])),
            }
        }

        for (label, ids) in groups {
            if let Err(e) = self.provider.group_tabs(&ids, label, false).await {
                warn!(label, error = %e, "could not regroup restored tabs");
            }
        }
    }
}

#[async_trait]
impl SessionManagerTrait for SessionManager {
    /// Snapshots every window's http(s) tabs and stores the session at the
    /// head of the archive.
    async fn capture(&self, label: Option<&str>) -> Result<Session, SessionError> {
        let windows = self.provider.all_windows().await?;
        let schemes = &self.config.allowed_schemes;

        let snapshots: Vec<WindowSnapshot> = windows
            .iter()
            .filter_map(|w| {
                let tabs: Vec<TabSnapshot> = w
                    .tabs
                    .iter()
                    .filter(|t| is_allowed_scheme(&t.url, schemes))
                    .map(|t| TabSnapshot {
                        url: t.url.clone(),
                        pinned: t.pinned,
                        title: Some(t.title.clone()).filter(|s| !s.is_empty()),
                        group: w.group_label(t.group_id).map(str::to_string),
                    })
                    .collect();
                (!tabs.is_empty()).then_some(WindowSnapshot { tabs })
            })
            .collect();

        let created_at = Utc::now().timestamp_millis();
        let name = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_name(created_at));

        let session = Session {
            version: SESSION_RECORD_VERSION,
            id: Uuid::new_v4().to_string(),
            name,
            created_at,
            favorite: false,
            windows: snapshots,
        };

        let mut archive = self.load_archive().await?;
        archive.insert(0, session.clone());
        self.persist(archive).await?;
        self.set_last_session_id(Some(&session.id)).await?;

        info!(
            id = %session.id,
            windows = session.windows.len(),
            tabs = session.tab_count(),
            "session captured"
        );
        Ok(session)
    }

    async fn restore(&self, session: &Session, mode: RestoreMode) -> Result<RestoreReport, SessionError> {
        let mut report = RestoreReport {
            session_id: session.id.clone(),
            ..RestoreReport::default()
        };

        let windows = keep_allowed_tabs(&session.windows, &self.config.allowed_schemes);
        if windows.is_empty() {
            debug!(id = %session.id, "session has no tabs, nothing to restore");
            return Ok(report);
        }

        match mode {
            RestoreMode::NewWindow => {
                for (i, snapshot) in windows.iter().enumerate() {
                    self.restore_into_new_window(snapshot, i == 0, &mut report).await;
                }
            }
            RestoreMode::CurrentWindow => {
                let current = self.provider.current_window().await?;
                for snapshot in &windows {
                    let created = self.append_tabs(current.id, snapshot, true, &mut report).await;
                    report.tabs_created += created.len();
                    self.regroup(&created).await;
                }
            }
        }

        let archived = self.load_archive().await?.iter().any(|s| s.id == session.id);
        if archived {
            self.set_last_session_id(Some(&session.id)).await?;
        }

        info!(
            id = %session.id,
            mode = ?mode,
            windows = report.windows_created,
            tabs = report.tabs_created,
            failed = report.tabs_failed,
            "session restored"
        );
        Ok(report)
    }

    async fn restore_by_id(&self, id: &str, mode: RestoreMode) -> Result<RestoreReport, SessionError> {
        let session = self.get(id).await?;
        self.restore(&session, mode).await
    }

    async fn restore_last(&self, mode: RestoreMode) -> Result<RestoreReport, SessionError> {
        let session = self.lookup_last().await?;
        self.restore(&session, mode).await
    }

    async fn restore_favorite(&self, mode: RestoreMode) -> Result<RestoreReport, SessionError> {
        let session = self.lookup_favorite().await?;
        self.restore(&session, mode).await
    }

    /// Resolves `lastSessionId`; a missing or dangling pointer falls back to
    /// the newest archived session.
    async fn lookup_last(&self) -> Result<Session, SessionError> {
        let archive = self.load_archive().await?;
        if let Some(id) = self.last_session_id().await? {
            if let Some(session) = archive.iter().find(|s| s.id == id) {
                return Ok(session.clone());
            }
            debug!(id = %id, "last session pointer is dangling, using newest session");
        }
        archive
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::NotFound("no saved sessions".to_string()))
    }

    async fn lookup_favorite(&self) -> Result<Session, SessionError> {
        self.load_archive()
            .await?
            .into_iter()
            .find(|s| s.favorite)
            .ok_or_else(|| SessionError::NotFound("no favorite session".to_string()))
    }

    async fn list(&self) -> Result<Vec<Session>, SessionError> {
        self.load_archive().await
    }

    async fn get(&self, id: &str) -> Result<Session, SessionError> {
        self.load_archive()
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Removes a session. Deleting an unknown id changes nothing.
    async fn delete(&self, id: &str) -> Result<Vec<Session>, SessionError> {
        let archive = self.load_archive().await?;
        let before = archive.len();
        let remaining: Vec<Session> = archive.into_iter().filter(|s| s.id != id).collect();
        if remaining.len() == before {
            return Ok(remaining);
        }

        let remaining = self.persist(remaining).await?;
        if self.last_session_id().await?.as_deref() == Some(id) {
            self.set_last_session_id(None).await?;
        }
        info!(id, "session deleted");
        Ok(remaining)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<Session, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidFormat("session name cannot be empty".to_string()));
        }

        let mut archive = self.load_archive().await?;
        let slot = archive
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let renamed = slot.renamed(name);
        *slot = renamed.clone();
        self.persist(archive).await?;
        Ok(renamed)
    }

    /// Sets or clears the favorite flag. Setting it clears every other favorite.
    async fn set_favorite(&self, id: &str, favorite: bool) -> Result<Session, SessionError> {
        let archive = self.load_archive().await?;
        if !archive.iter().any(|s| s.id == id) {
            return Err(SessionError::NotFound(id.to_string()));
        }

        let mut updated = None;
        let archive: Vec<Session> = archive
            .into_iter()
            .map(|s| {
                if s.id == id {
                    let replaced = s.with_favorite(favorite);
                    updated = Some(replaced.clone());
                    replaced
                } else if favorite && s.favorite {
                    s.with_favorite(false)
                } else {
                    s
                }
            })
            .collect();
        self.persist(archive).await?;
        updated.ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Prepends a batch to the archive without deduplication. A record whose
    /// id is empty or already taken gets a fresh one; tabs with schemes that
    /// capture would skip are dropped. Returns the archive size after trimming.
    async fn import_batch(&self, sessions: Vec<Session>) -> Result<usize, SessionError> {
        let imported = sessions.len();
        let existing = self.load_archive().await?;
        let mut taken: HashSet<String> = existing.iter().map(|s| s.id.clone()).collect();

        let mut batch: Vec<Session> = sessions
            .into_iter()
            .map(|mut s| {
                if s.id.trim().is_empty() || taken.contains(&s.id) {
                    s.id = Uuid::new_v4().to_string();
                }
                taken.insert(s.id.clone());
                s.windows = keep_allowed_tabs(&s.windows, &self.config.allowed_schemes);
                s
            })
            .collect();

        batch.extend(existing);
        let archive = self.persist(keep_single_favorite(batch)).await?;
        info!(imported, total = archive.len(), "sessions imported");
        Ok(archive.len())
    }

    /// Decodes and imports an exported archive. The archive is untouched
    /// unless every record decodes.
    async fn import_json(&self, text: &str) -> Result<usize, SessionError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SessionError::InvalidFormat(format!("not valid JSON: {}", e)))?;
        let Value::Array(items) = value else {
            return Err(SessionError::InvalidFormat(
                "expected a JSON array of sessions".to_string(),
            ));
        };

        let now = Utc::now();
        let mut sessions = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let record: ImportedSession = serde_json::from_value(item)
                .map_err(|e| SessionError::InvalidFormat(format!("record {}: {}", i, e)))?;
            let session = record
                .into_session(now)
                .map_err(|e| SessionError::InvalidFormat(format!("record {}: {}", i, e)))?;
            sessions.push(session);
        }

        self.import_batch(sessions).await
    }

    async fn export_json(&self) -> Result<String, SessionError> {
        let archive = self.load_archive().await?;
        serde_json::to_string_pretty(&archive)
            .map_err(|e| SessionError::InvalidFormat(format!("Failed to serialize archive: {}", e)))
    }
}
