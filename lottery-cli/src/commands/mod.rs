pub mod account;
pub mod menu;
pub mod round;

pub use account::{
    approve, burn, buy, claim_prize, list_accounts, place_bets, set_trusted_party, show_prize,
    withdraw_fee,
};
pub use menu::run_menu;
pub use round::{
    abandon_round, list_events, open_round, reseal_round, reveal_seed, seal_round, show_status,
};

use crate::config::CliConfig;
use anyhow::{Context, Result};
use lottery_engine::{
    Address, Amount, CallContext, LotteryConfig, LotteryHost, Seed, Storage, Timestamp,
};
use std::path::Path;
use std::sync::Arc;

/// Loaded lottery plus the account commands act as
pub struct Session {
    pub host: LotteryHost,
    pub config: CliConfig,
}

impl Session {
    pub async fn open(config: CliConfig) -> Result<Self> {
        let db_path = config.db_path();
        if !db_path.exists() {
            anyhow::bail!(
                "No lottery in {}, run 'lottery init' first",
                config.data_dir.display()
            );
        }
        let host = LotteryHost::open(&db_path)
            .await
            .with_context(|| format!("Failed to load lottery from {}", db_path.display()))?;
        tracing::debug!("Opened lottery database at {}", db_path.display());
        Ok(Self { host, config })
    }

    pub fn caller(&self) -> Result<Address> {
        self.config.caller()
    }

    pub fn ctx(&self) -> Result<CallContext> {
        Ok(CallContext::now(self.caller()?))
    }

    /// Token name and symbol
    pub fn token(&self) -> (String, String) {
        self.host.read(|l| {
            (
                l.ledger().name().to_string(),
                l.ledger().symbol().to_string(),
            )
        })
    }

    pub fn symbol(&self) -> String {
        self.host.read(|l| l.ledger().symbol().to_string())
    }
}

pub async fn init(
    config: &CliConfig,
    config_file: Option<&Path>,
    bet_price: Option<String>,
    bet_fee: Option<String>,
    winners: Option<u32>,
    purchase_ratio: Option<u64>,
) -> Result<()> {
    let mut lottery_config = match config_file {
        Some(path) => LotteryConfig::load(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => LotteryConfig::default(),
    };
    if let Some(price) = bet_price {
        lottery_config.bet_price = parse_amount(&price)?;
    }
    if let Some(fee) = bet_fee {
        lottery_config.bet_fee = parse_amount(&fee)?;
    }
    if let Some(winners) = winners {
        lottery_config = lottery_config.with_winners(winners);
    }
    if let Some(ratio) = purchase_ratio {
        lottery_config = lottery_config.with_purchase_ratio(ratio);
    }

    let owner = config.caller()?;
    let storage = Arc::new(Storage::new(&config.db_path()).await?);
    let host = LotteryHost::create(storage, lottery_config, owner).await?;
    let (settings, token_name) =
        host.read(|l| (l.config().clone(), l.ledger().name().to_string()));
    settings.save(&config.config_path())?;

    println!("Lottery initialised in {}", config.data_dir.display());
    println!("Owner: {}", owner);
    println!("Token: {} ({})", token_name, settings.token_symbol);
    println!("Bet price: {} {}", settings.bet_price, settings.token_symbol);
    println!(
        "Bet fee: {} {} ({:.1}%)",
        settings.bet_fee,
        settings.token_symbol,
        settings.fee_rate() * 100.0
    );
    println!("Winners per round: {}", settings.winners);
    println!("Purchase ratio: {}", settings.purchase_ratio);

    Ok(())
}

pub fn parse_amount(input: &str) -> Result<Amount> {
    input
        .parse::<Amount>()
        .with_context(|| format!("Invalid amount '{}'", input))
}

/// 0x-prefixed 64-digit hex, or text of at most 32 bytes
pub fn parse_seed(input: &str) -> Result<Seed> {
    let seed = if input.starts_with("0x") && input.len() == 66 {
        Seed::from_hex(input)?
    } else {
        Seed::from_text(input)?
    };
    Ok(seed)
}

pub fn format_time(timestamp: Timestamp) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_text_and_hex() {
        let text = parse_seed("seed1").unwrap();
        assert_eq!(text, Seed::from_text("seed1").unwrap());

        let hex_form = format!("0x{}", "ab".repeat(32));
        assert_eq!(parse_seed(&hex_form).unwrap(), Seed::new([0xab; 32]));
    }

    #[tokio::test]
    async fn test_init_writes_config_and_opens() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            data_dir: dir.path().to_path_buf(),
            account: 0,
        };

        init(&config, None, None, Some("0.1".to_string()), Some(2), None)
            .await
            .unwrap();

        let saved = LotteryConfig::load(&config.config_path()).unwrap();
        assert_eq!(saved.bet_fee, parse_amount("0.1").unwrap());
        assert_eq!(saved.winners, 2);

        let session = Session::open(config).await.unwrap();
        let (name, symbol) = session.token();
        assert_eq!(name, saved.token_name);
        assert_eq!(symbol, saved.token_symbol);
    }

    #[tokio::test]
    async fn test_open_without_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            data_dir: dir.path().to_path_buf(),
            account: 0,
        };
        assert!(Session::open(config).await.is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1.5").unwrap(), Amount::from_base_units(15 * 10u128.pow(17)));
        assert!(parse_amount("abc").is_err());
    }
}
