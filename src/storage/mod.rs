//! Persistence for the binary change-log column, read/written by resume id.
//!
//! The column is allowed to hand back any [`StoredBinaryValue`] variant;
//! writes always store the Base64 text produced by the codec. The store is
//! the durable target of the offline reconciler.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::StoredBinaryValue;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// User-implemented persistence for resume change-logs.
///
/// Implementations over synchronous drivers (e.g. SQLite) will block the
/// calling thread inside these methods; async callers accept that, as the
/// calls are short single-row reads and writes.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Read the stored change-log column for a resume, in whichever
    /// representation the driver surfaces it. `None` when the row is
    /// absent or the column is null.
    async fn load_changes(&self, resume_id: &str) -> Result<Option<StoredBinaryValue>>;

    /// Durably write an encoded (Base64 text) change-log for a resume.
    async fn save_changes(&self, resume_id: &str, encoded: &str) -> Result<()>;
}
