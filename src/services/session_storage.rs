//! Durable session-scoped key/value storage.
//!
//! `SessionStorage` is the capability the position store writes through to.
//! Two backends ship with the crate: an in-process map (embedding, tests) and
//! a SQLite table keyed by browsing session, used by the RPC bridge so that
//! positions survive a page reload until the session ends.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::connection::Database;
use crate::types::errors::StorageError;

/// Trait defining a session-scoped text key/value store.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

// === MemorySessionStorage ===

/// In-process storage with an optional byte quota.
#[derive(Debug, Clone)]
pub struct MemorySessionStorage {
    items: BTreeMap<String, String>,
    quota_bytes: Option<u64>,
    available: bool,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            quota_bytes: None,
            available: true,
        }
    }

    /// Limits the summed key and value lengths to `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Simulates storage being disabled (every operation fails while false).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn used_bytes(&self) -> u64 {
        self.items.iter().map(|(k, v)| entry_size(k, v)).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::Unavailable("session storage is disabled".to_string()))
        }
    }
}

impl Default for MemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.ensure_available()?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        if let Some(quota) = self.quota_bytes {
            let replaced = self.items.get(key).map(|v| entry_size(key, v)).unwrap_or(0);
            let needed = self.used_bytes() - replaced + entry_size(key, value);
            if needed > quota {
                return Err(StorageError::QuotaExceeded(format!(
                    "{} bytes needed, quota is {}",
                    needed, quota
                )));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.ensure_available()?;
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.ensure_available()?;
        Ok(self.items.keys().cloned().collect())
    }
}

// === SqliteSessionStorage ===

/// Storage backed by the `session_storage` table, scoped to one session id.
pub struct SqliteSessionStorage {
    db: Arc<Database>,
    session_id: String,
    quota_bytes: u64,
}

impl SqliteSessionStorage {
    /// Creates storage for `session_id`, or for a fresh uuid v4 session.
    pub fn new(db: Arc<Database>, session_id: Option<&str>) -> Self {
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            db,
            session_id,
            quota_bytes: 0,
        }
    }

    /// Sets the per-session byte quota; 0 disables the check.
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Summed key and value lengths stored for this session.
    pub fn used_bytes(&self) -> Result<u64, StorageError> {
        let used: i64 = self.db.connection().query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0) FROM session_storage WHERE session_id = ?1",
            params![self.session_id],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as u64)
    }

    /// Ends the browsing session: drops its rows and starts a new session id.
    pub fn end_session(&mut self) -> Result<(), StorageError> {
        self.db.connection().execute(
            "DELETE FROM session_storage WHERE session_id = ?1",
            params![self.session_id],
        )?;
        self.session_id = Uuid::new_v4().to_string();
        Ok(())
    }

    /// Deletes rows of other sessions not touched for `max_idle_secs`.
    /// Returns the number of rows removed.
    pub fn purge_stale_sessions(&self, max_idle_secs: i64) -> Result<usize, StorageError> {
        let cutoff = Self::now() - max_idle_secs;
        let removed = self.db.connection().execute(
            "DELETE FROM session_storage WHERE session_id != ?1 AND updated_at < ?2",
            params![self.session_id, cutoff],
        )?;
        Ok(removed)
    }
}

impl SessionStorage for SqliteSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM session_storage WHERE session_id = ?1 AND key = ?2",
                params![self.session_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.quota_bytes > 0 {
            let replaced = self
                .get_item(key)?
                .map(|v| entry_size(key, &v))
                .unwrap_or(0);
            let needed = self.used_bytes()?.saturating_sub(replaced) + entry_size(key, value);
            if needed > self.quota_bytes {
                return Err(StorageError::QuotaExceeded(format!(
                    "{} bytes needed, quota is {}",
                    needed, self.quota_bytes
                )));
            }
        }

        self.db.connection().execute(
            "INSERT INTO session_storage (session_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![self.session_id, key, value, Self::now()],
        )?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.db.connection().execute(
            "DELETE FROM session_storage WHERE session_id = ?1 AND key = ?2",
            params![self.session_id, key],
        )?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.db.connection();
        let mut stmt =
            conn.prepare("SELECT key FROM session_storage WHERE session_id = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![self.session_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}
