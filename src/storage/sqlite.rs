//! SQLite-backed `ResumeStore`.
//!
//! One row per resume. The `crdt` column is typeless enough in SQLite that
//! older rows may hold a BLOB while newer writes are Base64 text; loads
//! classify whatever the column actually holds and let the codec sort it
//! out.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::storage::ResumeStore;
use crate::types::StoredBinaryValue;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS resumes (
    id TEXT PRIMARY KEY,
    crdt BLOB,
    updated_at TEXT NOT NULL
)";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Write the change-log as a raw BLOB. Kept for rows produced by
    /// drivers that store native bytes; normal saves go through
    /// [`ResumeStore::save_changes`] with Base64 text.
    pub fn save_changes_binary(&self, resume_id: &str, bytes: &[u8]) -> Result<()> {
        self.upsert(resume_id, rusqlite::types::Value::Blob(bytes.to_vec()))
    }

    fn upsert(&self, resume_id: &str, crdt: rusqlite::types::Value) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO resumes (id, crdt, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET crdt = excluded.crdt, updated_at = excluded.updated_at",
            params![resume_id, crdt, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ResumeStore for SqliteStore {
    async fn load_changes(&self, resume_id: &str) -> Result<Option<StoredBinaryValue>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT crdt FROM resumes WHERE id = ?1",
                params![resume_id],
                |row| {
                    Ok(match row.get_ref(0)? {
                        ValueRef::Blob(bytes) => Some(StoredBinaryValue::Bytes(bytes.to_vec())),
                        ValueRef::Text(text) => Some(StoredBinaryValue::Text(
                            String::from_utf8_lossy(text).into_owned(),
                        )),
                        _ => None,
                    })
                },
            )
            .optional()?;
        Ok(value.flatten())
    }

    async fn save_changes(&self, resume_id: &str, encoded: &str) -> Result<()> {
        self.upsert(
            resume_id,
            rusqlite::types::Value::Text(encoded.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    #[tokio::test]
    async fn save_then_load_text() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_changes("r1", &codec::encode(b"hello")).await.unwrap();

        let loaded = store.load_changes("r1").await.unwrap();
        assert_eq!(codec::decode(loaded.as_ref()), Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn blob_rows_load_as_bytes() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_changes_binary("r1", &[1, 2, 3]).unwrap();

        let loaded = store.load_changes("r1").await.unwrap();
        assert_eq!(loaded, Some(StoredBinaryValue::Bytes(vec![1, 2, 3])));
    }

    #[tokio::test]
    async fn missing_row_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.load_changes("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_replaces_prior_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_changes("r1", "old").await.unwrap();
        store.save_changes("r1", &codec::encode(b"new")).await.unwrap();

        let loaded = store.load_changes("r1").await.unwrap();
        assert_eq!(codec::decode(loaded.as_ref()), Some(b"new".to_vec()));
    }
}
