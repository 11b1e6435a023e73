//! Winner selection and pool apportionment.
//!
//! Share `k` of a round draws from `SHA-256(seed || k)`, read as a
//! big-endian 256-bit integer and reduced modulo the number of bets placed.
//! Hashing first keeps short, zero-padded text seeds uniform. Bets are laid
//! out in the order bettors first entered, so a bettor holding `n` of `N`
//! bets owns `n` consecutive tickets and wins with probability `n / N`,
//! independent of where their range sits.

use crate::betting::BetRecord;
use crate::error::{LotteryError, Result};
use crate::types::{Address, Amount, Seed};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Outcome of settling one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// One entry per drawn share, in draw order
    pub payouts: Vec<(Address, Amount)>,
    /// Pool left for winners after the fee
    pub prize: Amount,
    pub fee: Amount,
}

impl Settlement {
    pub fn winners(&self) -> Vec<Address> {
        self.payouts.iter().map(|(winner, _)| *winner).collect()
    }
}

/// Owner's cut: `bet_fee` for every bet, which is `pool * bet_fee / bet_price`
pub fn compute_fee(bets: &BetRecord, bet_fee: Amount) -> Result<Amount> {
    let fee = bet_fee
        .checked_mul(bets.total_bets() as u128)
        .ok_or(LotteryError::Overflow)?;
    Ok(fee.min(bets.prize_pool()))
}

/// `seed mod total`, reading the seed as a big-endian integer
pub fn draw_ticket(seed: &[u8; 32], total: u64) -> u64 {
    let total = total as u128;
    let ticket = seed
        .iter()
        .fold(0u128, |acc, byte| (acc * 256 + *byte as u128) % total);
    ticket as u64
}

/// Randomness for the `k`-th share
pub fn share_seed(seed: &Seed, k: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(k.to_be_bytes());
    hasher.finalize().into()
}

pub fn select_winners(bets: &BetRecord, seed: &Seed, shares: u32) -> Result<Vec<Address>> {
    if bets.is_empty() {
        return Ok(Vec::new());
    }

    (0..shares)
        .map(|k| {
            let ticket = draw_ticket(&share_seed(seed, k), bets.total_bets());
            bets.ticket_owner(ticket)
                .ok_or_else(|| LotteryError::internal(format!("Ticket {} has no owner", ticket)))
        })
        .collect()
}

/// Splits the pool of `bets` into a fee and `shares` equal prizes. The
/// division remainder goes to the first winner so nothing is lost.
pub fn settle(bets: &BetRecord, seed: &Seed, bet_fee: Amount, shares: u32) -> Result<Settlement> {
    let pool = bets.prize_pool();
    if bets.is_empty() {
        return Ok(Settlement {
            payouts: Vec::new(),
            prize: Amount::ZERO,
            fee: Amount::ZERO,
        });
    }
    if shares == 0 {
        return Err(LotteryError::invalid_argument("At least one share must be drawn"));
    }

    let fee = compute_fee(bets, bet_fee)?;
    let prize = pool.checked_sub(fee).ok_or(LotteryError::Overflow)?;
    let winners = select_winners(bets, seed, shares)?;

    let share = prize
        .checked_div(shares as u128)
        .ok_or(LotteryError::Overflow)?;
    let dust = Amount::from_base_units(prize.base_units() % shares as u128);

    let mut payouts = Vec::with_capacity(winners.len());
    for (k, winner) in winners.into_iter().enumerate() {
        let amount = if k == 0 {
            share.checked_add(dust).ok_or(LotteryError::Overflow)?
        } else {
            share
        };
        payouts.push((winner, amount));
    }

    Ok(Settlement {
        payouts,
        prize,
        fee,
    })
}
