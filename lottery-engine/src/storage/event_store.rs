use crate::error::{LotteryError, Result};
use crate::events::{EventRecord, LotteryEvent};
use crate::storage::Storage;
use rusqlite::{params, Connection};
use uuid::Uuid;

pub struct EventStore<'a> {
    storage: &'a Storage,
}

impl<'a> EventStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Most recent `limit` events, oldest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<EventRecord>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, round_id, payload, timestamp FROM
               (SELECT seq, id, round_id, payload, timestamp FROM events
                ORDER BY seq DESC LIMIT ?1)
             ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![limit as i64], read_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(parse_row(row?)?);
        }
        Ok(records)
    }

    pub async fn for_round(&self, round_id: u64) -> Result<Vec<EventRecord>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, round_id, payload, timestamp FROM events
             WHERE round_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![round_id as i64], read_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(parse_row(row?)?);
        }
        Ok(records)
    }

    pub async fn count(&self) -> Result<u64> {
        let conn = self.storage.get_connection().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

pub(crate) fn insert_event(conn: &Connection, record: &EventRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO events (id, round_id, kind, payload, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.id.to_string(),
            record.round_id as i64,
            record.event.name(),
            serde_json::to_string(&record.event)?,
            record.timestamp,
        ],
    )?;
    Ok(())
}

type RawRow = (String, i64, String, i64);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn parse_row((id, round_id, payload, timestamp): RawRow) -> Result<EventRecord> {
    let id = Uuid::parse_str(&id)
        .map_err(|e| LotteryError::internal(format!("Invalid event id {}: {}", id, e)))?;
    let event: LotteryEvent = serde_json::from_str(&payload)?;
    Ok(EventRecord {
        id,
        round_id: round_id as u64,
        timestamp,
        event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    #[tokio::test]
    async fn test_batch_insert_and_query() {
        let storage = Storage::in_memory().await.unwrap();
        let store = EventStore::new(&storage);

        let records = vec![
            EventRecord::new(1, 10, LotteryEvent::RoundOpened { closing_time: 100 }),
            EventRecord::new(
                1,
                20,
                LotteryEvent::TrustedPartyChanged {
                    previous: None,
                    current: Address::derive("trusted"),
                },
            ),
            EventRecord::new(2, 30, LotteryEvent::RoundOpened { closing_time: 200 }),
        ];
        storage.commit_batch(&[], &records).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.for_round(1).await.unwrap(), records[..2].to_vec());

        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent, records[1..].to_vec());
    }
}
