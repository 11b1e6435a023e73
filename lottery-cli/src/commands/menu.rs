use super::{account, round, Session};
use crate::config::DEV_ACCOUNTS;
use anyhow::Result;
use dialoguer::{Confirm, Input, Select};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    CheckState,
    OpenBets,
    TopUp,
    Bet,
    Seal,
    Reveal,
    CheckPrize,
    WithdrawPrize,
    CheckOwnerPool,
    WithdrawOwnerPool,
    Burn,
    SetTrustedParty,
    ListAccounts,
    SwitchAccount,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 15] = [
        MenuAction::CheckState,
        MenuAction::OpenBets,
        MenuAction::TopUp,
        MenuAction::Bet,
        MenuAction::Seal,
        MenuAction::Reveal,
        MenuAction::CheckPrize,
        MenuAction::WithdrawPrize,
        MenuAction::CheckOwnerPool,
        MenuAction::WithdrawOwnerPool,
        MenuAction::Burn,
        MenuAction::SetTrustedParty,
        MenuAction::ListAccounts,
        MenuAction::SwitchAccount,
        MenuAction::Exit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuAction::CheckState => "Check state",
            MenuAction::OpenBets => "Open bets",
            MenuAction::TopUp => "Top up account tokens",
            MenuAction::Bet => "Bet with account",
            MenuAction::Seal => "Close bets (seal)",
            MenuAction::Reveal => "Reveal seed and settle",
            MenuAction::CheckPrize => "Check player prize",
            MenuAction::WithdrawPrize => "Withdraw prize",
            MenuAction::CheckOwnerPool => "Check owner pool",
            MenuAction::WithdrawOwnerPool => "Withdraw from owner pool",
            MenuAction::Burn => "Burn tokens",
            MenuAction::SetTrustedParty => "Set trusted party",
            MenuAction::ListAccounts => "List accounts",
            MenuAction::SwitchAccount => "Switch account",
            MenuAction::Exit => "Exit",
        }
    }
}

/// Interactive loop over the same operations the subcommands expose
pub async fn run_menu(session: &mut Session) -> Result<()> {
    let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();
    loop {
        println!();
        let choice = Select::new()
            .with_prompt(format!("Account {} | choose an action", session.config.account))
            .items(&labels)
            .default(0)
            .interact()?;

        let result = match MenuAction::ALL[choice] {
            MenuAction::CheckState => round::show_status(session).await,
            MenuAction::OpenBets => {
                let duration: i64 = Input::new()
                    .with_prompt("Seconds until bets close")
                    .default(60)
                    .interact_text()?;
                round::open_round(session, duration).await
            }
            MenuAction::TopUp => {
                let payment: String = Input::new()
                    .with_prompt("Payment to convert")
                    .interact_text()?;
                account::buy(session, &payment).await
            }
            MenuAction::Bet => {
                let count: u64 = Input::new()
                    .with_prompt("Number of bets")
                    .default(1)
                    .interact_text()?;
                account::place_bets(session, count).await
            }
            MenuAction::Seal => {
                let random = Confirm::new()
                    .with_prompt("Generate a random seed?")
                    .default(true)
                    .interact()?;
                let seed = if random {
                    None
                } else {
                    Some(Input::<String>::new().with_prompt("Seed").interact_text()?)
                };
                round::seal_round(session, seed, random).await
            }
            MenuAction::Reveal => {
                let seed: String = Input::new().with_prompt("Seed").interact_text()?;
                round::reveal_seed(session, &seed).await
            }
            MenuAction::CheckPrize => {
                let who: String = Input::new()
                    .with_prompt("Account index or address")
                    .default(session.config.account.to_string())
                    .interact_text()?;
                account::show_prize(session, Some(who)).await
            }
            MenuAction::WithdrawPrize => account::claim_prize(session, None).await,
            MenuAction::CheckOwnerPool => {
                let pool = session.host.read(|l| l.owner_fee_pool());
                println!("Owner pool has {} {}", pool, session.symbol());
                Ok(())
            }
            MenuAction::WithdrawOwnerPool => account::withdraw_fee(session, None).await,
            MenuAction::Burn => {
                let amount: String = Input::new()
                    .with_prompt("Credits to burn")
                    .interact_text()?;
                account::burn(session, &amount).await
            }
            MenuAction::SetTrustedParty => {
                let party: String = Input::new()
                    .with_prompt("Trusted party (account index or address)")
                    .interact_text()?;
                account::set_trusted_party(session, &party).await
            }
            MenuAction::ListAccounts => account::list_accounts(session).await,
            MenuAction::SwitchAccount => {
                let index: usize = Input::new()
                    .with_prompt(format!("Account index (0-{})", DEV_ACCOUNTS - 1))
                    .validate_with(|index: &usize| {
                        if *index < DEV_ACCOUNTS {
                            Ok(())
                        } else {
                            Err("Index out of range")
                        }
                    })
                    .interact_text()?;
                session.config.account = index;
                println!("Now acting as account {}", index);
                Ok(())
            }
            MenuAction::Exit => return Ok(()),
        };

        if let Err(e) = result {
            println!("Error: {:#}", e);
        }
    }
}
