pub mod event_store;
pub mod snapshot_store;

pub use event_store::EventStore;
pub use snapshot_store::SnapshotStore;

use crate::error::{LotteryError, Result};
use crate::events::EventRecord;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use tokio::sync::Mutex;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LotteryError::internal(format!("Failed to create directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    pub async fn in_memory() -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // Latest engine state, one row per key
        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Append-only audit log
        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                round_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS events_round ON events (round_id)",
            [],
        )?;

        Ok(())
    }

    /// Writes snapshots and appends events in one transaction
    pub async fn commit_batch(
        &self,
        snapshots: &[(&str, String)],
        records: &[EventRecord],
    ) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp();

        for (key, data) in snapshots {
            tx.execute(
                "INSERT OR REPLACE INTO snapshots (key, data, updated_at) VALUES (?1, ?2, ?3)",
                params![key, data, now],
            )?;
        }
        for record in records {
            event_store::insert_event(&tx, record)?;
        }

        tx.commit()?;
        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
