//! App Core for Scrollkeeper.
//!
//! Application root that owns the database, settings and the scroll manager
//! wired to a remote viewport and SQLite-backed session storage.

use std::sync::Arc;

use tracing::{info, warn};

use crate::database::connection::Database;
use crate::managers::scroll_manager::{ScrollManager, ScrollManagerTrait};
use crate::services::session_storage::SqliteSessionStorage;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::viewport::{RemoteViewport, ViewportCommand};
use crate::types::errors::StorageError;
use crate::types::navigation::ScrollAction;

/// Sessions idle longer than this are purged on startup.
const STALE_SESSION_SECS: i64 = 24 * 60 * 60;

/// Concrete manager used by the RPC bridge.
pub type RemoteScrollManager = ScrollManager<RemoteViewport, SqliteSessionStorage>;

/// Central application struct.
pub struct App {
    pub db: Arc<Database>,
    pub settings_engine: SettingsEngine,
    pub scroll_manager: RemoteScrollManager,
}

impl App {
    /// Creates an App with settings at the platform config path.
    pub fn new(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_options(db_path, None, None)
    }

    /// Creates an App.
    ///
    /// `settings_path` overrides the settings file location; `session_id`
    /// resumes an existing browsing session (a new one is started otherwise).
    pub fn with_options(
        db_path: &str,
        settings_path: Option<String>,
        session_id: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open(db_path)?);

        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(e) = settings_engine.load() {
            warn!(error = %e, "using default settings");
        }
        let settings = settings_engine.get_settings().clone();

        let storage = SqliteSessionStorage::new(db.clone(), session_id)
            .with_quota(settings.storage.quota_bytes);
        match storage.purge_stale_sessions(STALE_SESSION_SECS) {
            Ok(0) => {}
            Ok(removed) => info!(removed, "purged stale session rows"),
            Err(e) => warn!(error = %e, "stale session purge failed"),
        }
        info!(session_id = storage.session_id(), "session storage ready");

        let scroll_manager = ScrollManager::new(RemoteViewport::new(), storage, &settings);

        Ok(Self {
            db,
            settings_engine,
            scroll_manager,
        })
    }

    pub fn session_id(&self) -> &str {
        self.scroll_manager.storage().session_id()
    }

    /// Re-applies the current settings to the running manager after `changed_key`
    /// was set. The enabled flag follows the settings only when it is the key
    /// that changed, so a runtime disable survives unrelated edits.
    pub fn apply_settings(&mut self, changed_key: &str) {
        let settings = self.settings_engine.get_settings().clone();
        self.scroll_manager.apply_settings(&settings);
        if changed_key == "restoration.enabled" || changed_key == "restoration" {
            if settings.restoration.enabled {
                self.scroll_manager.enable_restoration();
            } else {
                self.scroll_manager.disable_restoration();
            }
        }
    }

    /// Scheduler tick: applies the pending restore/reset, if any.
    pub fn tick(&mut self) -> Option<ScrollAction> {
        self.scroll_manager.run_pending_restoration()
    }

    pub fn drain_commands(&mut self) -> Vec<ViewportCommand> {
        self.scroll_manager.viewport_mut().drain_commands()
    }

    /// Page reload: volatile state goes, the session's durable positions stay.
    pub fn reload(&mut self) {
        self.scroll_manager.reload();
    }

    /// Browsing session ended: durable positions are dropped and a new
    /// session begins.
    pub fn end_session(&mut self) -> Result<(), StorageError> {
        self.scroll_manager.storage_mut().end_session()?;
        self.scroll_manager.reload();
        info!(session_id = self.session_id(), "new session started");
        Ok(())
    }

    /// Shutdown sequence: snapshot the current route so a reload resumes there.
    pub fn shutdown(&mut self) {
        self.scroll_manager.on_before_unload();
    }
}
