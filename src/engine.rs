//! The merge engine seam.
//!
//! The CRDT engine that actually merges concurrent edits is an external
//! capability: this crate only moves its binary change-log and reacts to its
//! change events. Implementations wrap whatever engine the application
//! embeds; the sync layer stays agnostic of the change-graph algebra.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::DocChangedEvent;

/// User-implemented handle to the external document-merge engine.
///
/// `apply` may suspend (the engine's merge step is allowed to be
/// asynchronous); `export` is an in-memory read of the current change-log.
/// Change events are not part of this trait — the application forwards the
/// engine's subscription into the reconciliation controller over an
/// [`EventReceiver`], keeping the state machine testable without a live
/// engine.
#[async_trait]
pub trait MergeEngine: Send + Sync {
    /// Merge a change-log fragment into the named document.
    async fn apply(&self, resume_id: &str, changes: &[u8]) -> Result<()>;

    /// Export the document's current change-log, or `None` when the engine
    /// has never seen this document.
    fn export(&self, resume_id: &str) -> Result<Option<Vec<u8>>>;
}

/// Receiving end of the engine's "document changed" subscription.
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<DocChangedEvent>;

/// Sending end handed to the engine-facing wiring.
pub type EventSender = tokio::sync::mpsc::UnboundedSender<DocChangedEvent>;

/// Create the event channel pair connecting the engine subscription to the
/// reconciliation controller.
pub fn event_channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}
