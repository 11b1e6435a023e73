use crate::error::{LotteryError, Result};
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetEntry {
    pub bettor: Address,
    pub count: u64,
}

/// Bets of the current round in order of first entry, plus the pool they fund
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetRecord {
    entries: Vec<BetEntry>,
    positions: HashMap<Address, usize>,
    total_bets: u64,
    prize_pool: Amount,
}

impl BetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[BetEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.total_bets == 0
    }

    pub fn total_bets(&self) -> u64 {
        self.total_bets
    }

    pub fn prize_pool(&self) -> Amount {
        self.prize_pool
    }

    pub fn bets_of(&self, bettor: &Address) -> u64 {
        self.positions
            .get(bettor)
            .map_or(0, |&index| self.entries[index].count)
    }

    /// Adds `count` bets worth `stake` in total. Nothing changes on error.
    pub fn record(&mut self, bettor: Address, count: u64, stake: Amount) -> Result<()> {
        if count == 0 {
            return Err(LotteryError::invalid_argument("Bet count must be positive"));
        }

        let total_bets = self
            .total_bets
            .checked_add(count)
            .ok_or(LotteryError::Overflow)?;
        let prize_pool = self
            .prize_pool
            .checked_add(stake)
            .ok_or(LotteryError::Overflow)?;

        match self.positions.get(&bettor) {
            Some(&index) => self.entries[index].count += count,
            None => {
                self.positions.insert(bettor, self.entries.len());
                self.entries.push(BetEntry { bettor, count });
            }
        }
        self.total_bets = total_bets;
        self.prize_pool = prize_pool;
        Ok(())
    }

    /// Owner of the `ticket`-th bet when every bet is laid out in entry order
    pub fn ticket_owner(&self, ticket: u64) -> Option<Address> {
        let mut upper = 0u64;
        for entry in &self.entries {
            upper += entry.count;
            if ticket < upper {
                return Some(entry.bettor);
            }
        }
        None
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
        self.total_bets = 0;
        self.prize_pool = Amount::ZERO;
    }
}
