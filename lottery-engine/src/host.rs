use crate::config::LotteryConfig;
use crate::credit::TokenLedger;
use crate::engine::{Lottery, LotteryState};
use crate::error::{LotteryError, Result};
use crate::events::EventRecord;
use crate::storage::{SnapshotStore, Storage};
use crate::types::Address;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const STATE_KEY: &str = "lottery_state";
const LEDGER_KEY: &str = "credit_ledger";

/// Serialized execution environment around one engine.
///
/// Calls run one at a time. A call that fails leaves the engine exactly as
/// it was; a call that succeeds is persisted together with its events
/// before the next call starts.
pub struct LotteryHost {
    storage: Arc<Storage>,
    lottery: RwLock<Lottery<TokenLedger>>,
    writer: Mutex<()>,
}

impl LotteryHost {
    /// Creates a new engine and persists its initial state
    pub async fn create(
        storage: Arc<Storage>,
        config: LotteryConfig,
        owner: Address,
    ) -> Result<Self> {
        if SnapshotStore::new(&storage).exists(STATE_KEY).await? {
            return Err(LotteryError::config("Lottery already initialised"));
        }

        let mut lottery = Lottery::with_token(config, owner)?;
        let events = lottery.drain_events();
        persist(&storage, lottery.state(), lottery.ledger(), &events).await?;

        tracing::info!("Initialised lottery owned by {}", owner);
        Ok(Self {
            storage,
            lottery: RwLock::new(lottery),
            writer: Mutex::new(()),
        })
    }

    /// Restores the engine persisted in `storage`
    pub async fn load(storage: Arc<Storage>) -> Result<Self> {
        let snapshots = SnapshotStore::new(&storage);
        let state: LotteryState = snapshots
            .load(STATE_KEY)
            .await?
            .ok_or_else(|| LotteryError::config("Lottery not initialised"))?;
        let ledger: TokenLedger = snapshots
            .load(LEDGER_KEY)
            .await?
            .ok_or_else(|| LotteryError::internal("Lottery state without credit ledger"))?;

        tracing::debug!("Loaded lottery at round {}", state.round.id());
        Ok(Self {
            storage,
            lottery: RwLock::new(Lottery::from_parts(state, ledger)),
            writer: Mutex::new(()),
        })
    }

    /// Opens the database at `db_path` and loads the engine from it
    pub async fn open(db_path: &Path) -> Result<Self> {
        let storage = Arc::new(Storage::new(db_path).await?);
        Self::load(storage).await
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Runs a read-only query against the current state
    pub fn read<T>(&self, f: impl FnOnce(&Lottery<TokenLedger>) -> T) -> T {
        f(&*self.lottery.read())
    }

    /// Runs one engine call atomically
    pub async fn execute<T>(
        &self,
        f: impl FnOnce(&mut Lottery<TokenLedger>) -> Result<T>,
    ) -> Result<T> {
        let _serial = self.writer.lock().await;

        let (value, snapshot, state, ledger, events) = {
            let mut lottery = self.lottery.write();
            let snapshot = lottery.clone();
            match f(&mut *lottery) {
                Ok(value) => {
                    let events = lottery.drain_events();
                    (
                        value,
                        snapshot,
                        lottery.state().clone(),
                        lottery.ledger().clone(),
                        events,
                    )
                }
                Err(e) => {
                    *lottery = snapshot;
                    return Err(e);
                }
            }
        };

        if let Err(e) = persist(&self.storage, &state, &ledger, &events).await {
            tracing::error!("Failed to persist lottery state: {}", e);
            *self.lottery.write() = snapshot;
            return Err(e);
        }
        Ok(value)
    }
}

async fn persist(
    storage: &Storage,
    state: &LotteryState,
    ledger: &TokenLedger,
    events: &[EventRecord],
) -> Result<()> {
    let snapshots = [
        (STATE_KEY, serde_json::to_string(state)?),
        (LEDGER_KEY, serde_json::to_string(ledger)?),
    ];
    storage.commit_batch(&snapshots, events).await
}
