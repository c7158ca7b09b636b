//! App Core for Tabfix.
//!
//! Central struct holding the collaborators and every engine built on them.

use std::sync::Arc;

use tracing::{debug, info};

use crate::database::store::PersistenceStore;
use crate::managers::session_manager::{SessionManager, SessionManagerTrait};
use crate::managers::tab_manager::{TabManager, TabProvider};
use crate::services::auto_close::InactivitySweeper;
use crate::services::duplicate_resolver::DuplicateCloser;
use crate::services::focus_engine::FocusEngine;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::config::EngineConfig;
use crate::types::errors::SessionError;
use crate::types::session::{RestoreMode, RestoreReport};
use crate::types::settings::{RestoreTarget, Settings};

/// Central application struct holding all engines.
pub struct App {
    pub config: EngineConfig,
    pub provider: Arc<dyn TabProvider>,
    pub store: Arc<dyn PersistenceStore>,
    pub settings_engine: Arc<SettingsEngine>,
    pub session_manager: SessionManager,
    pub duplicate_closer: DuplicateCloser,
    pub focus_engine: FocusEngine,
    pub sweeper: Arc<InactivitySweeper>,
    /// Set when the provider is the in-memory [`TabManager`], so the command
    /// surface can load and inspect its state.
    pub browser: Option<Arc<TabManager>>,
}

impl App {
    /// Creates a new App over the given collaborators.
    pub fn new(provider: Arc<dyn TabProvider>, store: Arc<dyn PersistenceStore>, config: EngineConfig) -> Self {
        let settings_engine = Arc::new(SettingsEngine::new(store.clone(), &config));
        let session_manager = SessionManager::new(provider.clone(), store.clone(), config.clone());
        let duplicate_closer = DuplicateCloser::new(provider.clone(), settings_engine.clone(), config.clone());
        let focus_engine = FocusEngine::new(provider.clone(), settings_engine.clone(), config.clone());
        let sweeper = Arc::new(InactivitySweeper::new(provider.clone(), settings_engine.clone()));

        Self {
            config,
            provider,
            store,
            settings_engine,
            session_manager,
            duplicate_closer,
            focus_engine,
            sweeper,
            browser: None,
        }
    }

    /// Creates an App driving the in-memory tab provider.
    pub fn with_browser(browser: Arc<TabManager>, store: Arc<dyn PersistenceStore>, config: EngineConfig) -> Self {
        let mut app = Self::new(browser.clone(), store, config);
        app.browser = Some(browser);
        app
    }

    /// Restore mode implied by the settings.
    pub fn default_restore_mode(settings: &Settings) -> RestoreMode {
        if settings.restore_in_new_window {
            RestoreMode::NewWindow
        } else {
            RestoreMode::CurrentWindow
        }
    }

    /// Startup sequence: create the settings record on first run, then
    /// auto-restore when enabled.
    ///
    /// Returns `Ok(None)` when auto-restore is off. A missing target session
    /// is reported as `NotFound` rather than replaced by another session.
    pub async fn startup(&self) -> Result<Option<RestoreReport>, SessionError> {
        let settings = self.settings_engine.initialize().await?;
        if !settings.auto_restore_on_startup {
            debug!("auto-restore disabled");
            return Ok(None);
        }

        let mode = Self::default_restore_mode(&settings);
        let report = match settings.restore_target {
            RestoreTarget::Last => self.session_manager.restore_last(mode).await?,
            RestoreTarget::Favorite => self.session_manager.restore_favorite(mode).await?,
        };
        info!(target = ?settings.restore_target, tabs = report.tabs_created, "startup restore finished");
        Ok(Some(report))
    }
}
