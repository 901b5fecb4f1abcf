//! Bounded, ordered store of past analysis sessions.
//!
//! The cache owns its entries exclusively: sessions are copied in at insert
//! time, never aliased. Ordering is strictly newest-first and capacity is
//! enforced on every insert, so the persisted form never exceeds the cap.
//! Storage failures are absorbed here: a corrupt file loads as an empty
//! history, and a failed write is logged and dropped, never surfaced.

use std::path::PathBuf;

use parking_lot::RwLock;

use crate::error::{GeolensError, Result};
use crate::model::HistoryEntry;

/// Maximum number of retained entries; the oldest beyond this are silently
/// discarded.
pub const HISTORY_CAPACITY: usize = 30;

const HISTORY_FILE: &str = "history.json";

/// Durable JSON-file backing for the cache.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location under the config dir, `~/.geolens/history.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".geolens")
            .join(HISTORY_FILE)
    }

    /// Read the persisted list. Fails soft: missing, unreadable, or corrupt
    /// data logs a warning and yields an empty history.
    pub fn load(&self) -> Vec<HistoryEntry> {
        if !self.path.exists() {
            return Vec::new();
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "failed to read history, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryEntry>>(&contents) {
            Ok(mut entries) => {
                entries.truncate(HISTORY_CAPACITY);
                entries
            }
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "history file corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Serialize the full list. Atomic write: temp file, then rename.
    pub fn persist(&self, entries: &[HistoryEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)
            .map_err(|e| GeolensError::Storage(format!("failed to serialize history: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GeolensError::Storage(format!("failed to create history dir: {e}")))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &json)
            .map_err(|e| GeolensError::Storage(format!("failed to write history: {e}")))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| GeolensError::Storage(format!("failed to replace history: {e}")))?;

        Ok(())
    }
}

/// Capacity-capped, newest-first cache of completed sessions, persisted on
/// every mutating operation.
pub struct HistoryCache {
    entries: RwLock<Vec<HistoryEntry>>,
    store: HistoryStore,
}

impl HistoryCache {
    /// Open the cache, loading whatever the store has (fail-soft).
    pub fn open(store: HistoryStore) -> Self {
        let entries = store.load();
        if !entries.is_empty() {
            tracing::info!(count = entries.len(), "loaded analysis history");
        }
        Self {
            entries: RwLock::new(entries),
            store,
        }
    }

    /// Prepend an entry and truncate to capacity. Discarding the oldest
    /// entries beyond the cap is silent, not an error.
    pub fn insert(&self, entry: HistoryEntry) {
        let snapshot = {
            let mut entries = self.entries.write();
            entries.insert(0, entry);
            entries.truncate(HISTORY_CAPACITY);
            entries.clone()
        };
        self.persist(&snapshot);
    }

    /// Apply `mutator` to the entry whose image has the given fingerprint.
    /// No-op when absent: deep analysis on a session that was never
    /// persisted only updates the live session.
    pub fn update_by_fingerprint<F>(&self, fingerprint: &str, mutator: F) -> bool
    where
        F: FnOnce(&mut HistoryEntry),
    {
        let snapshot = {
            let mut entries = self.entries.write();
            match entries.iter_mut().find(|e| e.image.fingerprint == fingerprint) {
                Some(entry) => mutator(entry),
                None => return false,
            }
            entries.clone()
        };
        self.persist(&snapshot);
        true
    }

    /// Remove one entry by id. Idempotent: an unknown id is a no-op.
    pub fn delete(&self, id: &str) {
        let snapshot = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|e| e.id != id);
            if entries.len() == before {
                return;
            }
            entries.clone()
        };
        self.persist(&snapshot);
    }

    /// Empty the list.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.persist(&[]);
    }

    pub fn get(&self, id: &str) -> Option<HistoryEntry> {
        self.entries.read().iter().find(|e| e.id == id).cloned()
    }

    /// Snapshot of the entries, newest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn persist(&self, entries: &[HistoryEntry]) {
        if let Err(e) = self.store.persist(entries) {
            tracing::warn!(error = %e, "failed to persist history");
        }
    }
}
