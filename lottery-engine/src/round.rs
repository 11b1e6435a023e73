use crate::commitment::SealedCommitment;
use crate::error::{LotteryError, Result};
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the single live round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundState {
    #[default]
    Closed,
    Open,
    Sealed,
}

impl RoundState {
    pub fn require(self, expected: RoundState, operation: &'static str) -> Result<()> {
        if self != expected {
            return Err(LotteryError::InvalidStateTransition {
                operation,
                state: self.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundState::Closed => "closed",
            RoundState::Open => "open",
            RoundState::Sealed => "sealed",
        };
        f.write_str(name)
    }
}

/// The round record. All state transitions go through this type so the
/// commitment is present exactly while the round is sealed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Round {
    id: u64,
    state: RoundState,
    closing_time: Timestamp,
    commitment: Option<SealedCommitment>,
}

impl Round {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn closing_time(&self) -> Timestamp {
        self.closing_time
    }

    pub fn commitment(&self) -> Option<&SealedCommitment> {
        self.commitment.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.state == RoundState::Open
    }

    /// Open and still before its closing time
    pub fn accepts_bets_at(&self, now: Timestamp) -> bool {
        self.is_open() && now < self.closing_time
    }

    /// Closed -> Open. Returns the new round id.
    pub fn open(&mut self, closing_time: Timestamp) -> Result<u64> {
        self.state.require(RoundState::Closed, "open a round")?;

        self.id += 1;
        self.state = RoundState::Open;
        self.closing_time = closing_time;
        Ok(self.id)
    }

    /// Open -> Sealed
    pub fn seal(&mut self, commitment: SealedCommitment) -> Result<()> {
        self.state.require(RoundState::Open, "seal the round")?;

        self.state = RoundState::Sealed;
        self.commitment = Some(commitment);
        Ok(())
    }

    /// Sealed -> Sealed with a replacement commitment
    pub fn reseal(&mut self, commitment: SealedCommitment) -> Result<()> {
        self.state.require(RoundState::Sealed, "reseal the round")?;

        self.commitment = Some(commitment);
        Ok(())
    }

    /// Sealed -> Closed, handing back the commitment that was cleared
    pub fn close(&mut self) -> Result<SealedCommitment> {
        self.state.require(RoundState::Sealed, "close the round")?;

        let commitment = self
            .commitment
            .take()
            .ok_or_else(|| LotteryError::internal("Sealed round without commitment"))?;
        self.state = RoundState::Closed;
        Ok(commitment)
    }
}
