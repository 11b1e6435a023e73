mod commands;
mod config;

use clap::{Parser, Subcommand};
use commands::Session;
use config::CliConfig;
use lottery_engine::LotteryError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lottery")]
#[command(about = "Commit-reveal betting pool")]
#[command(version)]
struct Cli {
    /// Data directory for the lottery database
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Dev account to act as (0 is the owner)
    #[arg(short, long, global = true, default_value_t = 0)]
    account: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new lottery owned by the active account
    Init {
        /// JSON lottery config to start from
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Price of one bet in credits
        #[arg(long)]
        bet_price: Option<String>,
        /// Owner's cut of every bet
        #[arg(long)]
        bet_fee: Option<String>,
        /// Winners drawn per round
        #[arg(long)]
        winners: Option<u32>,
        /// Credits minted per unit of payment
        #[arg(long)]
        purchase_ratio: Option<u64>,
    },
    /// List dev accounts with their balances
    Accounts,
    /// Show the current round
    Status,
    /// Open a round for bets
    Open {
        /// Seconds until bets close
        duration: i64,
    },
    /// Buy credits
    Buy {
        /// Native payment
        payment: String,
    },
    /// Let the lottery spend the active account's credits
    Approve {
        /// Allowance; unlimited when omitted
        amount: Option<String>,
    },
    /// Place bets in the open round
    Bet {
        /// Number of bets
        #[arg(default_value_t = 1)]
        count: u64,
    },
    /// Close bets and commit to a seed
    Seal {
        /// Seed text or 0x-prefixed 32-byte hex
        seed: Option<String>,
        /// Generate a random seed and print it
        #[arg(short, long)]
        random: bool,
    },
    /// Reveal the sealed seed and pay out the round
    Reveal {
        /// Seed given to seal
        seed: String,
    },
    /// Replace the commitment of a sealed round
    Reseal {
        seed: Option<String>,
        #[arg(short, long)]
        random: bool,
    },
    /// Close a sealed round without a draw and refund every bet
    Abandon,
    /// Show a claimable prize
    Prize {
        /// Account index or address; the active account when omitted
        account: Option<String>,
    },
    /// Withdraw prize credits
    Claim {
        /// Amount; the whole prize when omitted
        amount: Option<String>,
    },
    /// Withdraw from the owner fee pool
    WithdrawFee {
        /// Amount; the whole pool when omitted
        amount: Option<String>,
    },
    /// Return credits for a native refund
    Burn {
        amount: String,
    },
    /// Set the party whose address seeds are bound to
    SetTrustedParty {
        /// Account index or address
        party: String,
    },
    /// Show the event log
    Events {
        /// Only events of this round
        #[arg(short, long)]
        round: Option<u64>,
        /// Most recent events to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Interactive menu
    Menu,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "lottery={},lottery_engine={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = CliConfig {
        account: cli.account,
        ..CliConfig::default()
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    // Ensure data directory exists
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let result = match cli.command {
        Commands::Init {
            config: config_file,
            bet_price,
            bet_fee,
            winners,
            purchase_ratio,
        } => {
            commands::init(
                &config,
                config_file.as_deref(),
                bet_price,
                bet_fee,
                winners,
                purchase_ratio,
            )
            .await
        }
        command => run(command, config).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<LotteryError>() {
            Some(LotteryError::InsufficientFunds {
                kind,
                need,
                available,
            }) => {
                eprintln!("Error: Insufficient {}", kind);
                eprintln!("Need: {}, Available: {}", need, available);
            }
            Some(LotteryError::Authorization { .. }) => {
                eprintln!("Error: {}", e);
                eprintln!("Use '--account <index>' to act as another account");
            }
            Some(LotteryError::CommitmentMismatch) => {
                eprintln!("Error: {}", e);
                eprintln!("The round stays sealed; reveal the seed that was sealed");
            }
            _ => {
                eprintln!("Error: {:#}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, config: CliConfig) -> anyhow::Result<()> {
    let mut session = Session::open(config).await?;
    let session = &mut session;

    match command {
        Commands::Init { .. } => unreachable!(),
        Commands::Accounts => commands::list_accounts(session).await,
        Commands::Status => commands::show_status(session).await,
        Commands::Open { duration } => commands::open_round(session, duration).await,
        Commands::Buy { payment } => commands::buy(session, &payment).await,
        Commands::Approve { amount } => commands::approve(session, amount).await,
        Commands::Bet { count } => commands::place_bets(session, count).await,
        Commands::Seal { seed, random } => commands::seal_round(session, seed, random).await,
        Commands::Reveal { seed } => commands::reveal_seed(session, &seed).await,
        Commands::Reseal { seed, random } => commands::reseal_round(session, seed, random).await,
        Commands::Abandon => commands::abandon_round(session).await,
        Commands::Prize { account } => commands::show_prize(session, account).await,
        Commands::Claim { amount } => commands::claim_prize(session, amount).await,
        Commands::WithdrawFee { amount } => commands::withdraw_fee(session, amount).await,
        Commands::Burn { amount } => commands::burn(session, &amount).await,
        Commands::SetTrustedParty { party } => commands::set_trusted_party(session, &party).await,
        Commands::Events { round, limit } => commands::list_events(session, round, limit).await,
        Commands::Menu => commands::run_menu(session).await,
    }
}
