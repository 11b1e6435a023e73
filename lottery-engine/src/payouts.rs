use crate::error::{FundsKind, LotteryError, Result};
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Claimable prizes per account and the owner's fee pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrizeLedger {
    prizes: HashMap<Address, Amount>,
    owner_fee_pool: Amount,
}

impl PrizeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claimable(&self, account: &Address) -> Amount {
        self.prizes.get(account).copied().unwrap_or_default()
    }

    pub fn owner_fee_pool(&self) -> Amount {
        self.owner_fee_pool
    }

    /// Sum of all unclaimed prizes
    pub fn outstanding(&self) -> Amount {
        self.prizes
            .values()
            .fold(Amount::ZERO, |acc, prize| acc.checked_add(*prize).unwrap_or(Amount::MAX))
    }

    /// Credits `fee` to the owner pool and every payout to its winner.
    /// All new balances are computed first, so nothing changes on error.
    pub fn credit_settlement(&mut self, fee: Amount, payouts: &[(Address, Amount)]) -> Result<()> {
        let fee_pool = self
            .owner_fee_pool
            .checked_add(fee)
            .ok_or(LotteryError::Overflow)?;

        let mut staged: HashMap<Address, Amount> = HashMap::new();
        for (winner, amount) in payouts {
            let current = staged
                .get(winner)
                .copied()
                .unwrap_or_else(|| self.claimable(winner));
            let balance = current.checked_add(*amount).ok_or(LotteryError::Overflow)?;
            staged.insert(*winner, balance);
        }

        self.owner_fee_pool = fee_pool;
        for (winner, balance) in staged {
            if !balance.is_zero() {
                self.prizes.insert(winner, balance);
            }
        }
        Ok(())
    }

    pub fn debit_prize(&mut self, account: Address, amount: Amount) -> Result<()> {
        let available = self.claimable(&account);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| LotteryError::insufficient(FundsKind::Prize, amount, available))?;
        if remaining.is_zero() {
            self.prizes.remove(&account);
        } else {
            self.prizes.insert(account, remaining);
        }
        Ok(())
    }

    pub fn debit_fee(&mut self, amount: Amount) -> Result<()> {
        let available = self.owner_fee_pool;
        self.owner_fee_pool = available
            .checked_sub(amount)
            .ok_or_else(|| LotteryError::insufficient(FundsKind::FeePool, amount, available))?;
        Ok(())
    }
}
