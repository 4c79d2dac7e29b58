//! Collaborative sync core for a co-edited resume document.
//!
//! The CRDT merge engine, the realtime channel, and the UI are external;
//! this crate supplies the plumbing between them: binary change-log
//! transcoding ([`codec`]), session role bookkeeping ([`session`]),
//! remote-change notification ([`reconcile`]), offline resync ([`offline`]),
//! presence ([`presence`]), and the persistence seam ([`storage`]).

pub mod codec;
pub mod engine;
pub mod error;
pub mod offline;
pub mod presence;
pub mod reconcile;
pub mod session;
pub mod storage;
pub mod types;

pub use engine::{event_channel, EventReceiver, EventSender, MergeEngine};
pub use error::{Error, Result};
pub use offline::OfflineQueue;
pub use presence::PresenceTracker;
pub use reconcile::{Reconciler, ReconcilerOptions, RemoteChangeCallback};
pub use session::{new_session_id, MemoryRoleStore, RoleRegistry, RoleStore, SESSION_ROLES_KEY};
pub use storage::{MemoryStore, ResumeStore};
#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
pub use types::{
    ChangeOrigin, ChannelEvent, DocChangedEvent, OfflineResumeRecord, ResyncOutcome, ResyncReport,
    SessionRole, SessionRoleRecord, StoredBinaryValue,
};
