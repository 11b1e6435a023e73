use crate::error::{FundsKind, LotteryError, Result};
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fungible credit the bets are denominated in
pub trait CreditLedger {
    fn balance_of(&self, owner: &Address) -> Amount;
    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;
    fn total_supply(&self) -> Amount;

    fn approve(&mut self, owner: Address, spender: Address, amount: Amount);
    fn mint(&mut self, to: Address, amount: Amount) -> Result<()>;
    fn burn(&mut self, from: Address, amount: Amount) -> Result<()>;
    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<()>;

    /// Moves `amount` on behalf of `from`, spending `spender`'s allowance
    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()>;
}

/// In-memory credit token. An allowance of `Amount::MAX` never decreases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    name: String,
    symbol: String,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<Address, HashMap<Address, Amount>>,
}

impl TokenLedger {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn debit(&mut self, from: Address, amount: Amount) -> Result<()> {
        let available = self.balance_of(&from);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| LotteryError::insufficient(FundsKind::Balance, amount, available))?;
        if remaining.is_zero() {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, remaining);
        }
        Ok(())
    }

    fn credit(&mut self, to: Address, amount: Amount) -> Result<()> {
        let balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(LotteryError::Overflow)?;
        if !balance.is_zero() {
            self.balances.insert(to, balance);
        }
        Ok(())
    }
}

impl CreditLedger for TokenLedger {
    fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or_default()
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: Amount) {
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);
        tracing::debug!("{} approved {} to spend {} {}", owner, spender, amount, self.symbol);
    }

    fn mint(&mut self, to: Address, amount: Amount) -> Result<()> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LotteryError::Overflow)?;
        self.credit(to, amount)?;
        self.total_supply = supply;
        tracing::debug!("Minted {} {} to {}", amount, self.symbol, to);
        Ok(())
    }

    fn burn(&mut self, from: Address, amount: Amount) -> Result<()> {
        self.debit(from, amount)?;
        self.total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or_else(|| LotteryError::internal("Burn exceeds total supply"))?;
        tracing::debug!("Burned {} {} from {}", amount, self.symbol, from);
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        // the receiver cannot overflow if the sender holds the amount: supply bounds both
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        tracing::debug!("Transferred {} {} from {} to {}", amount, self.symbol, from, to);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        let allowed = self.allowance(&from, &spender);
        if allowed < amount {
            return Err(LotteryError::insufficient(
                FundsKind::Allowance,
                amount,
                allowed,
            ));
        }
        let available = self.balance_of(&from);
        if available < amount {
            return Err(LotteryError::insufficient(
                FundsKind::Balance,
                amount,
                available,
            ));
        }

        self.transfer(from, to, amount)?;
        if allowed != Amount::MAX {
            let remaining = allowed.checked_sub(amount).unwrap_or_default();
            self.approve(from, spender, remaining);
        }
        Ok(())
    }
}
