//! Core data types shared across the sync layer: stored binary values,
//! session roles, offline records, and the event surfaces consumed from the
//! merge engine and the realtime channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// StoredBinaryValue — what a relational column may hand back
// ============================================================================

/// A change-log value as received from persistence.
///
/// Depending on the driver and column type, the same logical payload may
/// arrive as raw bytes, as an array of byte-valued integers, or as text
/// (plain Base64, or hex-of-Base64 behind the `\x` escape marker). The
/// codec guarantees all variants of one payload decode to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredBinaryValue {
    /// Native byte sequence (e.g. a BLOB column).
    Bytes(Vec<u8>),
    /// Numeric array; each element must be an unsigned byte (0–255).
    Numbers(Vec<i64>),
    /// Text: plain Base64, or `\x`-prefixed hex of a Base64 string.
    Text(String),
}

impl StoredBinaryValue {
    /// Classify a JSON column value into a stored variant.
    ///
    /// Drivers that surface rows as JSON deliver byte columns as numeric
    /// arrays and text columns as strings. Null and any unclassifiable
    /// shape yield `None` ("no change to apply").
    pub fn from_json(value: &Value) -> Option<StoredBinaryValue> {
        match value {
            Value::Array(items) => {
                let numbers: Option<Vec<i64>> = items.iter().map(|v| v.as_i64()).collect();
                numbers.map(StoredBinaryValue::Numbers)
            }
            Value::String(s) => Some(StoredBinaryValue::Text(s.clone())),
            _ => None,
        }
    }
}

// ============================================================================
// Session roles
// ============================================================================

/// Role a participant holds in a collaboration session.
///
/// The host created the session and carries role-dependent policy (e.g. who
/// can finalize); guests joined it. The role is negotiated once and then
/// pinned by the registry so it survives reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Host,
    Guest,
}

impl SessionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionRole::Host => "host",
            SessionRole::Guest => "guest",
        }
    }
}

/// One pinned role, keyed by (session, resume, user).
///
/// At most one record exists per key; `remember` replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRoleRecord {
    pub session_id: String,
    pub resume_id: String,
    pub user_id: String,
    pub role: SessionRole,
}

impl SessionRoleRecord {
    /// True when this record is for the given (session, resume, user) key.
    pub fn matches(&self, session_id: &str, resume_id: &str, user_id: &str) -> bool {
        self.session_id == session_id && self.resume_id == resume_id && self.user_id == user_id
    }
}

// ============================================================================
// Offline records
// ============================================================================

/// A resume edited while disconnected, pending upload.
///
/// Created on the first disconnected write; cleared only when a resync for
/// it succeeds. A failed resync leaves it pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineResumeRecord {
    pub resume_id: String,
    /// Time of the most recent local mutation.
    pub modified_at: DateTime<Utc>,
    pub pending: bool,
}

// ============================================================================
// Merge engine events
// ============================================================================

/// Where a committed change originated.
///
/// `Unknown` is treated as remote by the reconciliation controller: a
/// spurious notification for one's own echoed write is acceptable, a
/// suppressed peer edit is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Local,
    Remote,
    Unknown,
}

/// A "document changed" event from the merge engine subscription.
#[derive(Debug, Clone)]
pub struct DocChangedEvent {
    pub resume_id: String,
    pub origin: ChangeOrigin,
    /// User id of the editing participant, when the engine can tag it.
    pub actor_id: Option<String>,
}

// ============================================================================
// Realtime channel events
// ============================================================================

/// Events mirrored off the realtime channel for the presence surface.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    PeerJoined { user_id: String },
    PeerLeft { user_id: String },
    /// Cursor/field position broadcast; also announces the peer's identity.
    PeerPosition { user_id: String, field: String },
    Connected,
    Disconnected,
}

// ============================================================================
// Resync reporting
// ============================================================================

/// Per-record outcome of a `resync_all` pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResyncOutcome {
    /// Encoded and durably written; the record left the pending set.
    Synced,
    /// Upload failed; the record stays pending.
    Failed(String),
    /// A previous pass still has this record in flight; not re-submitted.
    InFlight,
}

/// One entry of the result sequence returned by `resync_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResyncReport {
    pub resume_id: String,
    pub outcome: ResyncOutcome,
}
