//! Remote change reconciliation: detects that a merge landed from a peer,
//! raises a dismissible notification, and advances the acknowledged
//! checkpoint on accept/dismiss.
//!
//! The merge itself is unconditional and already applied by the engine
//! before the user is asked anything — this controller never blocks or
//! reverts it. Its whole job is the notification lifecycle. There is no
//! conflict state to return to: per document the machine is `Synced` or
//! `RemoteChangePending`, and the pending state is represented by the
//! presence of the notification string, so `has_remote_changes` and the
//! notification can never disagree.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{EventReceiver, MergeEngine};
use crate::types::{ChangeOrigin, DocChangedEvent};

/// Notification shown when a peer's merge lands. One message covers any
/// number of coalesced edits; the merged content always reflects all of
/// them.
const REMOTE_CHANGE_MESSAGE: &str =
    "A collaborator updated this resume. The changes have been merged into your copy.";

/// Fired when a document first enters the pending state (not again for
/// coalesced follow-up edits). Receives the resume id.
pub type RemoteChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration for [`Reconciler`].
pub struct ReconcilerOptions {
    pub engine: Arc<dyn MergeEngine>,
    /// The local participant's user id, matched against event actors.
    pub user_id: String,
    pub on_remote_change: Option<RemoteChangeCallback>,
}

#[derive(Default)]
struct DocState {
    /// Exported change-log at the last state the user acknowledged.
    /// `None` until the document is opened or first acknowledged.
    checkpoint: Option<Vec<u8>>,
    /// `Some` while a remote merge awaits acknowledgement.
    notification: Option<String>,
}

/// Per-document notification state machine over the merge engine's events.
pub struct Reconciler {
    engine: Arc<dyn MergeEngine>,
    user_id: String,
    docs: Mutex<HashMap<String, DocState>>,
    on_remote_change: Option<RemoteChangeCallback>,
}

impl Reconciler {
    pub fn new(options: ReconcilerOptions) -> Self {
        Self {
            engine: options.engine,
            user_id: options.user_id,
            docs: Mutex::new(HashMap::new()),
            on_remote_change: options.on_remote_change,
        }
    }

    /// Start tracking a document, seeding the checkpoint from the current
    /// content: the state the user just loaded is implicitly acknowledged.
    pub fn open(&self, resume_id: &str) {
        let checkpoint = self.export(resume_id);
        let mut docs = self.docs.lock();
        let doc = docs.entry(resume_id.to_string()).or_default();
        doc.checkpoint = checkpoint;
        doc.notification = None;
    }

    /// True while a remote merge awaits acknowledgement.
    pub fn has_remote_changes(&self, resume_id: &str) -> bool {
        self.notification(resume_id).is_some()
    }

    /// The pending notification, if any.
    pub fn notification(&self, resume_id: &str) -> Option<String> {
        self.docs
            .lock()
            .get(resume_id)
            .and_then(|doc| doc.notification.clone())
    }

    /// Acknowledge the merged content as-is. The merge already happened;
    /// this clears the notification and advances the checkpoint.
    pub fn accept_remote_changes(&self, resume_id: &str) {
        self.acknowledge(resume_id);
    }

    /// Decline to review the explanatory message. Content-wise identical to
    /// accept: the merge was unconditional either way.
    pub fn dismiss_remote_changes(&self, resume_id: &str) {
        self.acknowledge(resume_id);
    }

    /// Process one engine event. Events must be fed in the order the engine
    /// emits them; coalescing into the single pending notification is the
    /// only compression applied.
    pub fn handle_event(&self, event: &DocChangedEvent) {
        if self.is_own_write(event) {
            // The user's own edit is implicitly acknowledged.
            let checkpoint = self.export(&event.resume_id);
            let mut docs = self.docs.lock();
            let doc = docs.entry(event.resume_id.clone()).or_default();
            if let Some(checkpoint) = checkpoint {
                doc.checkpoint = Some(checkpoint);
            }
            return;
        }

        let current = self.export(&event.resume_id);
        let mut docs = self.docs.lock();
        let doc = docs.entry(event.resume_id.clone()).or_default();

        // An export identical to the checkpoint is this tab's own write
        // echoing back through the channel; nothing to surface.
        if current.is_some() && current == doc.checkpoint {
            return;
        }

        let newly_pending = doc.notification.is_none();
        doc.notification = Some(REMOTE_CHANGE_MESSAGE.to_string());
        drop(docs);

        if newly_pending {
            tracing::debug!(resume_id = %event.resume_id, "remote change pending");
            if let Some(ref callback) = self.on_remote_change {
                callback(&event.resume_id);
            }
        }
    }

    /// Drain the engine subscription, processing events in arrival order.
    pub async fn run(self: Arc<Self>, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            self.handle_event(&event);
        }
    }

    fn is_own_write(&self, event: &DocChangedEvent) -> bool {
        match event.origin {
            ChangeOrigin::Local => true,
            // An untagged or unknown-origin event counts as remote: a
            // notification for an echoed write beats a suppressed peer edit.
            ChangeOrigin::Remote | ChangeOrigin::Unknown => {
                event.actor_id.as_deref() == Some(self.user_id.as_str())
            }
        }
    }

    fn acknowledge(&self, resume_id: &str) {
        let checkpoint = self.export(resume_id);
        let mut docs = self.docs.lock();
        let doc = docs.entry(resume_id.to_string()).or_default();
        doc.notification = None;
        if let Some(checkpoint) = checkpoint {
            doc.checkpoint = Some(checkpoint);
        }
    }

    fn export(&self, resume_id: &str) -> Option<Vec<u8>> {
        match self.engine.export(resume_id) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(resume_id, error = %e, "engine export failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic in-memory engine: apply appends, export clones.
    #[derive(Default)]
    struct FakeEngine {
        logs: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl FakeEngine {
        fn seed(&self, resume_id: &str, bytes: &[u8]) {
            self.logs
                .lock()
                .insert(resume_id.to_string(), bytes.to_vec());
        }
    }

    #[async_trait]
    impl MergeEngine for FakeEngine {
        async fn apply(&self, resume_id: &str, changes: &[u8]) -> Result<()> {
            self.logs
                .lock()
                .entry(resume_id.to_string())
                .or_default()
                .extend_from_slice(changes);
            Ok(())
        }

        fn export(&self, resume_id: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.logs.lock().get(resume_id).cloned())
        }
    }

    fn setup() -> (Arc<FakeEngine>, Reconciler) {
        let engine = Arc::new(FakeEngine::default());
        let reconciler = Reconciler::new(ReconcilerOptions {
            engine: engine.clone(),
            user_id: "me".to_string(),
            on_remote_change: None,
        });
        (engine, reconciler)
    }

    fn remote_event(resume_id: &str, actor: &str) -> DocChangedEvent {
        DocChangedEvent {
            resume_id: resume_id.to_string(),
            origin: ChangeOrigin::Remote,
            actor_id: Some(actor.to_string()),
        }
    }

    #[test]
    fn peer_edit_raises_notification() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");

        engine.seed("r1", b"v1+peer");
        reconciler.handle_event(&remote_event("r1", "them"));

        assert!(reconciler.has_remote_changes("r1"));
        assert!(reconciler.notification("r1").is_some());
    }

    #[test]
    fn flag_and_notification_always_agree() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");
        assert_eq!(
            reconciler.has_remote_changes("r1"),
            reconciler.notification("r1").is_some()
        );

        engine.seed("r1", b"v2");
        reconciler.handle_event(&remote_event("r1", "them"));
        assert_eq!(
            reconciler.has_remote_changes("r1"),
            reconciler.notification("r1").is_some()
        );

        reconciler.accept_remote_changes("r1");
        assert_eq!(
            reconciler.has_remote_changes("r1"),
            reconciler.notification("r1").is_some()
        );
    }

    #[test]
    fn own_local_edit_never_notifies() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");

        engine.seed("r1", b"v2");
        reconciler.handle_event(&DocChangedEvent {
            resume_id: "r1".to_string(),
            origin: ChangeOrigin::Local,
            actor_id: Some("me".to_string()),
        });

        assert!(!reconciler.has_remote_changes("r1"));
    }

    #[test]
    fn own_write_echo_by_actor_id_never_notifies() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");

        // Round-trips through the channel tagged Remote, but it's ours.
        engine.seed("r1", b"v2");
        reconciler.handle_event(&remote_event("r1", "me"));

        assert!(!reconciler.has_remote_changes("r1"));
    }

    #[test]
    fn unchanged_export_is_treated_as_echo() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");

        // Peer event but content matches the checkpoint byte-for-byte.
        reconciler.handle_event(&remote_event("r1", "them"));

        assert!(!reconciler.has_remote_changes("r1"));
    }

    #[test]
    fn unknown_origin_is_treated_as_remote() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");

        engine.seed("r1", b"v2");
        reconciler.handle_event(&DocChangedEvent {
            resume_id: "r1".to_string(),
            origin: ChangeOrigin::Unknown,
            actor_id: None,
        });

        assert!(reconciler.has_remote_changes("r1"));
    }

    #[test]
    fn accept_clears_and_advances() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");

        engine.seed("r1", b"v2");
        reconciler.handle_event(&remote_event("r1", "them"));
        reconciler.accept_remote_changes("r1");

        assert!(!reconciler.has_remote_changes("r1"));
        // Checkpoint advanced: the same event replayed is now an echo.
        reconciler.handle_event(&remote_event("r1", "them"));
        assert!(!reconciler.has_remote_changes("r1"));
    }

    #[test]
    fn dismiss_clears_and_advances() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");

        engine.seed("r1", b"v2");
        reconciler.handle_event(&remote_event("r1", "them"));
        reconciler.dismiss_remote_changes("r1");

        assert!(!reconciler.has_remote_changes("r1"));
        reconciler.handle_event(&remote_event("r1", "them"));
        assert!(!reconciler.has_remote_changes("r1"));
    }

    #[test]
    fn accept_does_not_mutate_content() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");
        engine.seed("r1", b"v2");
        reconciler.handle_event(&remote_event("r1", "them"));

        reconciler.accept_remote_changes("r1");
        assert_eq!(engine.export("r1").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn rapid_peer_edits_coalesce_into_one_notification() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();

        let engine = Arc::new(FakeEngine::default());
        let reconciler = Reconciler::new(ReconcilerOptions {
            engine: engine.clone(),
            user_id: "me".to_string(),
            on_remote_change: Some(Arc::new(move |_| {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            })),
        });

        engine.seed("r1", b"v1");
        reconciler.open("r1");

        engine.seed("r1", b"v2");
        reconciler.handle_event(&remote_event("r1", "them"));
        engine.seed("r1", b"v3");
        reconciler.handle_event(&remote_event("r1", "other"));

        assert!(reconciler.has_remote_changes("r1"));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Acknowledging once covers both coalesced edits.
        reconciler.accept_remote_changes("r1");
        assert!(!reconciler.has_remote_changes("r1"));
    }

    #[test]
    fn untracked_document_event_still_notifies() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.handle_event(&remote_event("r1", "them"));
        assert!(reconciler.has_remote_changes("r1"));
    }

    #[tokio::test]
    async fn run_drains_events_in_order() {
        let (engine, reconciler) = setup();
        engine.seed("r1", b"v1");
        reconciler.open("r1");

        let reconciler = Arc::new(reconciler);
        let (tx, rx) = crate::engine::event_channel();
        let task = tokio::spawn(reconciler.clone().run(rx));

        engine.seed("r1", b"v2");
        tx.send(remote_event("r1", "them")).unwrap();
        drop(tx);
        task.await.unwrap();

        assert!(reconciler.has_remote_changes("r1"));
    }
}
