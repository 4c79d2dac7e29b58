//! Session role registry: pins which role (host or guest) the current user
//! holds in a collaboration session, keyed by (session, resume, user), so
//! the role survives reloads instead of being renegotiated.
//!
//! Storage is an injectable tab-local key-value capability. Everything here
//! is best-effort: a failed write degrades to "renegotiate on next load",
//! and corrupted stored data reads as an empty registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{SessionRole, SessionRoleRecord};

/// Well-known storage key holding the serialized record array.
pub const SESSION_ROLES_KEY: &str = "resume-sync.session-roles";

// ============================================================================
// RoleStore — tab-local key-value capability
// ============================================================================

/// Minimal string key-value store backing the registry.
///
/// Implementations must not panic on quota or serialization problems:
/// `set`/`remove` surface those as [`Error::StorageUnavailable`] and the
/// registry degrades on failure. The store is scoped to one tab — it is
/// shared by every component instance within the tab but never across tabs.
///
/// [`Error::StorageUnavailable`]: crate::error::Error::StorageUnavailable
pub trait RoleStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory `RoleStore`; the native default and the test substrate.
#[derive(Default)]
pub struct MemoryRoleStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleStore for MemoryRoleStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

// ============================================================================
// RoleRegistry
// ============================================================================

/// Registry of pinned session roles over an injected [`RoleStore`].
pub struct RoleRegistry {
    store: Arc<dyn RoleStore>,
}

impl RoleRegistry {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Pin a role for (session, resume, user), replacing any prior record
    /// with the same key. Best-effort: a failed write only logs.
    pub fn remember(&self, session_id: &str, resume_id: &str, user_id: &str, role: SessionRole) {
        let mut records = self.load();
        records.retain(|r| !r.matches(session_id, resume_id, user_id));
        records.push(SessionRoleRecord {
            session_id: session_id.to_string(),
            resume_id: resume_id.to_string(),
            user_id: user_id.to_string(),
            role,
        });
        self.save(&records);
    }

    /// Look up the pinned role. `None` means no role has been established
    /// for this identity in this session; the caller negotiates one.
    pub fn get(&self, session_id: &str, resume_id: &str, user_id: &str) -> Option<SessionRole> {
        self.load()
            .into_iter()
            .find(|r| r.matches(session_id, resume_id, user_id))
            .map(|r| r.role)
    }

    /// Remove the record for (session, resume, user). Safe to call when no
    /// record exists.
    pub fn clear(&self, session_id: &str, resume_id: &str, user_id: &str) {
        let mut records = self.load();
        let before = records.len();
        records.retain(|r| !r.matches(session_id, resume_id, user_id));
        if records.len() != before {
            self.save(&records);
        }
    }

    /// All currently pinned records, malformed entries filtered out.
    pub fn records(&self) -> Vec<SessionRoleRecord> {
        self.load()
    }

    fn load(&self) -> Vec<SessionRoleRecord> {
        let Some(text) = self.store.get(SESSION_ROLES_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<SessionRoleRecord>(item).ok())
                .collect(),
            Ok(_) | Err(_) => {
                tracing::warn!("session role store is corrupt; treating as empty");
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[SessionRoleRecord]) {
        let result = if records.is_empty() {
            self.store.remove(SESSION_ROLES_KEY)
        } else {
            match serde_json::to_string(records) {
                Ok(text) => self.store.set(SESSION_ROLES_KEY, &text),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to serialize session roles");
                    return;
                }
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "session role write failed; role will be renegotiated on next load");
        }
    }
}

/// Fresh session id for a newly created collaboration session.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
