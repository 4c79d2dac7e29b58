//! In-memory `ResumeStore` used natively and in tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::storage::ResumeStore;
use crate::types::StoredBinaryValue;

/// HashMap-backed store. Rows can be seeded in any representation, and
/// individual resume ids can be marked as failing to exercise
/// partial-failure resync paths.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, StoredBinaryValue>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row directly, bypassing the codec.
    pub fn seed(&self, resume_id: &str, value: StoredBinaryValue) {
        self.rows.lock().insert(resume_id.to_string(), value);
    }

    /// Make every subsequent save for this resume id fail.
    pub fn fail_saves_for(&self, resume_id: &str) {
        self.failing.lock().insert(resume_id.to_string());
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn load_changes(&self, resume_id: &str) -> Result<Option<StoredBinaryValue>> {
        Ok(self.rows.lock().get(resume_id).cloned())
    }

    async fn save_changes(&self, resume_id: &str, encoded: &str) -> Result<()> {
        if self.failing.lock().contains(resume_id) {
            return Err(Error::Persistence(format!(
                "simulated write failure for {resume_id}"
            )));
        }
        self.rows.lock().insert(
            resume_id.to_string(),
            StoredBinaryValue::Text(encoded.to_string()),
        );
        Ok(())
    }
}
