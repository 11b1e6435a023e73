use super::{parse_amount, Session};
use crate::config::CliConfig;
use anyhow::{bail, Result};
use comfy_table::{presets::UTF8_FULL, Table};
use lottery_engine::{Amount, CreditLedger, LotteryError};

pub async fn list_accounts(session: &Session) -> Result<()> {
    let symbol = session.symbol();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Address", "Role", "Credits", "Prize", "Bets"]);

    for (index, address) in CliConfig::accounts().iter().enumerate() {
        let (role, credits, prize, bets) = session.host.read(|l| {
            let role = if l.owner() == *address {
                "owner"
            } else if l.trusted_party() == Some(*address) {
                "trusted party"
            } else {
                ""
            };
            (
                role,
                l.credit_balance(address),
                l.claimable_prize(address),
                l.bets_of(address),
            )
        });
        let marker = if index == session.config.account {
            format!("{}*", index)
        } else {
            index.to_string()
        };

        table.add_row(vec![
            marker,
            address.to_string(),
            role.to_string(),
            format!("{} {}", credits, symbol),
            format!("{} {}", prize, symbol),
            bets.to_string(),
        ]);
    }

    println!("{}", table);
    println!("* active account, switch with --account <index>");
    Ok(())
}

pub async fn buy(session: &Session, payment: &str) -> Result<()> {
    let payment = parse_amount(payment)?;
    let ctx = session.ctx()?;
    let minted = session
        .host
        .execute(|l| l.purchase_tokens(&ctx, payment))
        .await?;

    println!("Bought {} {} for {}", minted, session.symbol(), payment);
    println!(
        "Balance: {} {}",
        session.host.read(|l| l.credit_balance(&ctx.caller)),
        session.symbol()
    );
    Ok(())
}

pub async fn approve(session: &Session, amount: Option<String>) -> Result<()> {
    let amount = match amount {
        Some(amount) => parse_amount(&amount)?,
        None => Amount::MAX,
    };
    let ctx = session.ctx()?;
    session
        .host
        .execute(|l| {
            l.approve(&ctx, amount);
            Ok(())
        })
        .await?;

    if amount == Amount::MAX {
        println!("Lottery may spend all of {}'s credits", ctx.caller);
    } else {
        println!("Lottery may spend {} {} of {}'s credits", amount, session.symbol(), ctx.caller);
    }
    Ok(())
}

/// Places `count` bets, approving the lottery first when the allowance is short
pub async fn place_bets(session: &Session, count: u64) -> Result<()> {
    let ctx = session.ctx()?;
    session
        .host
        .execute(|l| {
            let stake = l
                .config()
                .bet_price
                .checked_mul(count as u128)
                .ok_or(LotteryError::Overflow)?;
            if l.ledger().allowance(&ctx.caller, &l.engine_account()) < stake {
                l.approve(&ctx, Amount::MAX);
            }
            l.place_bets(&ctx, count)
        })
        .await?;

    let (mine, pool) = session
        .host
        .read(|l| (l.bets_of(&ctx.caller), l.prize_pool()));
    println!("Placed {} bet(s)", count);
    println!("Your bets this round: {}", mine);
    println!("Prize pool: {} {}", pool, session.symbol());
    Ok(())
}

pub async fn show_prize(session: &Session, account: Option<String>) -> Result<()> {
    let account = match account {
        Some(account) => CliConfig::resolve(&account)?,
        None => session.caller()?,
    };
    let prize = session.host.read(|l| l.claimable_prize(&account));

    if prize.is_zero() {
        println!("No prize to claim for {}", account);
    } else {
        println!("{} can claim {} {}", account, prize, session.symbol());
    }
    Ok(())
}

/// Withdraws `amount` of the caller's prize, or all of it
pub async fn claim_prize(session: &Session, amount: Option<String>) -> Result<()> {
    let ctx = session.ctx()?;
    let amount = match amount {
        Some(amount) => parse_amount(&amount)?,
        None => session.host.read(|l| l.claimable_prize(&ctx.caller)),
    };
    if amount.is_zero() {
        bail!("No prize to claim for {}", ctx.caller);
    }
    session
        .host
        .execute(|l| l.withdraw_prize(&ctx, amount))
        .await?;

    println!("Claimed {} {}", amount, session.symbol());
    Ok(())
}

pub async fn withdraw_fee(session: &Session, amount: Option<String>) -> Result<()> {
    let ctx = session.ctx()?;
    let amount = match amount {
        Some(amount) => parse_amount(&amount)?,
        None => session.host.read(|l| l.owner_fee_pool()),
    };
    if amount.is_zero() {
        bail!("Owner fee pool is empty");
    }
    session
        .host
        .execute(|l| l.withdraw_fee(&ctx, amount))
        .await?;

    println!("Withdrew {} {} from the owner pool", amount, session.symbol());
    Ok(())
}

/// Returns credits for their native refund
pub async fn burn(session: &Session, amount: &str) -> Result<()> {
    let amount = parse_amount(amount)?;
    let ctx = session.ctx()?;
    let refund = session
        .host
        .execute(|l| l.return_tokens(&ctx, amount))
        .await?;

    println!("Burned {} {}, refund of {} owed", amount, session.symbol(), refund);
    Ok(())
}

pub async fn set_trusted_party(session: &Session, party: &str) -> Result<()> {
    let party = CliConfig::resolve(party)?;
    let ctx = session.ctx()?;
    session
        .host
        .execute(|l| l.set_trusted_party(&ctx, party))
        .await?;

    println!("Trusted party is now {}", party);
    println!("Seeds sealed from now on are bound to this address");
    Ok(())
}
