use anyhow::{anyhow, Result};
use lottery_engine::Address;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of deterministic dev accounts; index 0 owns the lottery
pub const DEV_ACCOUNTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub account: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lottery"),
            account: 0,
        }
    }
}

impl CliConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("lottery.db")
    }

    /// Settings the lottery was initialised with, reusable with `init --config`
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("lottery.json")
    }

    pub fn accounts() -> Vec<Address> {
        (0..DEV_ACCOUNTS).map(account_address).collect()
    }

    pub fn caller(&self) -> Result<Address> {
        if self.account >= DEV_ACCOUNTS {
            return Err(anyhow!(
                "Account index {} out of range (0-{})",
                self.account,
                DEV_ACCOUNTS - 1
            ));
        }
        Ok(account_address(self.account))
    }

    /// Accepts a dev account index or a 0x address
    pub fn resolve(input: &str) -> Result<Address> {
        match input.parse::<usize>() {
            Ok(index) if index < DEV_ACCOUNTS => Ok(account_address(index)),
            Ok(index) => Err(anyhow!("Account index {} out of range", index)),
            Err(_) => Ok(input.parse::<Address>()?),
        }
    }
}

fn account_address(index: usize) -> Address {
    Address::derive(&format!("account-{}", index))
}
