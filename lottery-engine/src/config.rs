use crate::error::{LotteryError, Result};
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters fixed when the engine is constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryConfig {
    pub token_name: String,
    pub token_symbol: String,
    /// Credits minted per unit of native payment
    pub purchase_ratio: u64,
    /// Stake per bet, added to the prize pool
    pub bet_price: Amount,
    /// Owner's cut per bet, taken out of the pool at settlement
    pub bet_fee: Amount,
    /// Number of prize shares drawn per round
    pub winners: u32,
    /// Account that holds staked credits and pays out prizes
    pub engine_account: Address,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            token_name: "LotteryToken".to_string(),
            token_symbol: "LT0".to_string(),
            purchase_ratio: 1,
            bet_price: Amount::from_whole(1),
            bet_fee: Amount::from_base_units(200_000_000_000_000_000), // 0.2
            winners: 1,
            engine_account: Address::derive("lottery-engine"),
        }
    }
}

impl LotteryConfig {
    pub fn new(bet_price: Amount, bet_fee: Amount) -> Self {
        Self {
            bet_price,
            bet_fee,
            ..Self::default()
        }
    }

    pub fn with_winners(mut self, winners: u32) -> Self {
        self.winners = winners;
        self
    }

    pub fn with_purchase_ratio(mut self, purchase_ratio: u64) -> Self {
        self.purchase_ratio = purchase_ratio;
        self
    }

    /// Fee as a fraction of the prize pool, `bet_fee / bet_price`
    pub fn fee_rate(&self) -> f64 {
        self.bet_fee.base_units() as f64 / self.bet_price.base_units() as f64
    }

    pub fn validate(&self) -> Result<()> {
        if self.token_symbol.is_empty() {
            return Err(LotteryError::config("Token symbol cannot be empty"));
        }

        if self.purchase_ratio == 0 {
            return Err(LotteryError::config("Purchase ratio must be greater than 0"));
        }

        if self.bet_price.is_zero() {
            return Err(LotteryError::config("Bet price must be greater than 0"));
        }

        if self.bet_fee > self.bet_price {
            return Err(LotteryError::config(format!(
                "Bet fee {} cannot exceed bet price {}",
                self.bet_fee, self.bet_price
            )));
        }

        if self.winners == 0 {
            return Err(LotteryError::config("At least one winner must be drawn"));
        }

        if self.engine_account == Address::ZERO {
            return Err(LotteryError::config("Engine account cannot be the zero address"));
        }

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
