use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A stored change-log value could not be decoded. The codec recovers
    /// locally by returning "no change"; this variant exists for callers
    /// that want the failure itself (tests, diagnostics).
    #[error("decode failure: {0}")]
    Decode(String),

    /// The role registry's backing store refused a read or write.
    /// Degrades to an empty registry, never a crash.
    #[error("role storage unavailable: {0}")]
    StorageUnavailable(String),

    /// One offline record failed to upload. Scoped to that record; other
    /// records in the same resync pass are unaffected.
    #[error("resync failed for resume {resume_id}: {message}")]
    Resync { resume_id: String, message: String },

    /// The merge engine rejected an apply or export call.
    #[error("merge engine error: {0}")]
    Engine(String),

    /// Persistence-layer read/write failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
