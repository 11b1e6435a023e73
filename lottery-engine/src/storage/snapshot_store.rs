use crate::error::Result;
use crate::storage::Storage;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;

pub struct SnapshotStore<'a> {
    storage: &'a Storage,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let conn = self.storage.get_connection().await;

        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM snapshots WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}
