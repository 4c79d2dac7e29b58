//! Offline queue: resumes edited while disconnected, pending a
//! user-initiated bulk resync once connectivity returns.
//!
//! The caller marks a resume on every write that happens without an active
//! connection (the presence surface knows which is which). `resync_all`
//! then pushes each pending record independently — one record failing never
//! aborts the rest, and a failed record stays pending rather than being
//! silently dropped.

use std::collections::HashSet;

use chrono::Utc;
use parking_lot::Mutex;

use crate::codec;
use crate::engine::MergeEngine;
use crate::error::{Error, Result};
use crate::storage::ResumeStore;
use crate::types::{OfflineResumeRecord, ResyncOutcome, ResyncReport};

/// Insertion-ordered set of offline-edited resumes with in-flight gating.
#[derive(Default)]
pub struct OfflineQueue {
    records: Mutex<Vec<OfflineResumeRecord>>,
    in_flight: Mutex<HashSet<String>>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a disconnected write. Re-marking an already-pending resume
    /// refreshes its mutation timestamp but keeps its queue position.
    pub fn mark_modified(&self, resume_id: &str) {
        let mut records = self.records.lock();
        if let Some(record) = records.iter_mut().find(|r| r.resume_id == resume_id) {
            record.modified_at = Utc::now();
            return;
        }
        records.push(OfflineResumeRecord {
            resume_id: resume_id.to_string(),
            modified_at: Utc::now(),
            pending: true,
        });
    }

    pub fn has_pending(&self) -> bool {
        !self.records.lock().is_empty()
    }

    /// Pending records in insertion order.
    pub fn pending(&self) -> Vec<OfflineResumeRecord> {
        self.records.lock().clone()
    }

    /// Push every pending record to persistence, independently.
    ///
    /// A record succeeds when its change-log has been exported, encoded,
    /// and durably written; only then does it leave the pending set. A
    /// record whose save is still in flight from a previous invocation is
    /// skipped, not double-submitted. Safe to call again while an earlier
    /// pass is still working on other records.
    pub async fn resync_all(
        &self,
        engine: &dyn MergeEngine,
        store: &dyn ResumeStore,
    ) -> Vec<ResyncReport> {
        let snapshot = self.pending();
        let mut reports = Vec::with_capacity(snapshot.len());

        for record in snapshot {
            let resume_id = record.resume_id.clone();

            if !self.in_flight.lock().insert(resume_id.clone()) {
                reports.push(ResyncReport {
                    resume_id,
                    outcome: ResyncOutcome::InFlight,
                });
                continue;
            }

            let outcome = match self.resync_one(&resume_id, engine, store).await {
                Ok(()) => {
                    // Drop the record unless a newer local edit landed while
                    // the save was in flight; that edit still needs a pass.
                    self.records.lock().retain(|r| {
                        r.resume_id != resume_id || r.modified_at != record.modified_at
                    });
                    ResyncOutcome::Synced
                }
                Err(e) => {
                    tracing::warn!(error = %e, "offline resync failed; record stays pending");
                    ResyncOutcome::Failed(e.to_string())
                }
            };
            self.in_flight.lock().remove(&resume_id);

            reports.push(ResyncReport { resume_id, outcome });
        }

        reports
    }

    async fn resync_one(
        &self,
        resume_id: &str,
        engine: &dyn MergeEngine,
        store: &dyn ResumeStore,
    ) -> Result<()> {
        let resync_err = |message: String| Error::Resync {
            resume_id: resume_id.to_string(),
            message,
        };

        let bytes = engine
            .export(resume_id)
            .map_err(|e| resync_err(e.to_string()))?
            .ok_or_else(|| resync_err("engine has no change-log for this resume".to_string()))?;

        let encoded = codec::encode(&bytes);
        store
            .save_changes(resume_id, &encoded)
            .await
            .map_err(|e| resync_err(e.to_string()))
    }
}
