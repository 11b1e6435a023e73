use super::{format_time, parse_seed, Session};
use anyhow::{bail, Result};
use comfy_table::{presets::UTF8_FULL, Table};
use lottery_engine::storage::EventStore;
use lottery_engine::{commit, LotteryEvent, RoundState, Seed, Settlement};

pub async fn show_status(session: &Session) -> Result<()> {
    let (token_name, symbol) = session.token();
    let (round, bets, pool, fee_pool, owner, trusted, party) = session.host.read(|l| {
        (
            l.round().clone(),
            l.bets().clone(),
            l.prize_pool(),
            l.owner_fee_pool(),
            l.owner(),
            l.trusted_party(),
            l.commitment_party(),
        )
    });

    println!("Round {}", round.id());
    println!("═══════════════════════════════════");
    println!("State: {}", round.state());
    if round.state() == RoundState::Open {
        let now = chrono::Utc::now().timestamp();
        let closing = format_time(round.closing_time());
        if now < round.closing_time() {
            println!("Bets close at: {}", closing);
        } else {
            println!("Closing time passed at {}, waiting for seal", closing);
        }
    }
    println!("Token: {} ({})", token_name, symbol);
    println!("Prize pool: {} {}", pool, symbol);
    println!("Bets placed: {}", bets.total_bets());
    println!("Owner fee pool: {} {}", fee_pool, symbol);
    println!("Owner: {}", owner);
    match trusted {
        Some(trusted) => println!("Trusted party: {}", trusted),
        None => println!("Trusted party: not set (owner seals)"),
    }
    match round.commitment() {
        Some(commitment) => {
            println!("Sealed digest: {}", commitment.digest);
            println!("Bound to: {}", commitment.party);
            println!("Sealed at: {}", format_time(commitment.sealed_at));
        }
        None => println!("Next seal binds to: {}", party),
    }

    if !bets.is_empty() {
        println!();
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Bettor", "Bets", "Chance"]);

        for entry in bets.entries() {
            let chance = entry.count as f64 / bets.total_bets() as f64 * 100.0;
            table.add_row(vec![
                entry.bettor.to_string(),
                entry.count.to_string(),
                format!("{:.1}%", chance),
            ]);
        }
        println!("{}", table);
    }

    Ok(())
}

pub async fn open_round(session: &Session, duration: i64) -> Result<()> {
    if duration <= 0 {
        bail!("Duration must be a positive number of seconds");
    }
    let ctx = session.ctx()?;
    let closing_time = ctx.now + duration;
    let round_id = session
        .host
        .execute(|l| l.open_round(&ctx, closing_time))
        .await?;

    println!("Round {} is open for bets", round_id);
    println!("Bets close at: {}", format_time(closing_time));
    Ok(())
}

pub async fn seal_round(session: &Session, seed: Option<String>, random: bool) -> Result<()> {
    let seed = pick_seed(seed, random)?;
    let ctx = session.ctx()?;
    let digest = session
        .host
        .execute(|l| {
            let digest = commit(&l.commitment_party(), &seed);
            l.seal_round(&ctx, digest)?;
            Ok(digest)
        })
        .await?;

    println!("Bets are closed, round sealed");
    println!("Digest: {}", digest);
    if random {
        println!("Seed (save this for reveal): {}", seed);
    }
    Ok(())
}

pub async fn reseal_round(session: &Session, seed: Option<String>, random: bool) -> Result<()> {
    let seed = pick_seed(seed, random)?;
    let ctx = session.ctx()?;
    let digest = session
        .host
        .execute(|l| {
            let digest = commit(&l.commitment_party(), &seed);
            l.reseal_round(&ctx, digest)?;
            Ok(digest)
        })
        .await?;

    println!("Round resealed with digest {}", digest);
    if random {
        println!("Seed (save this for reveal): {}", seed);
    }
    Ok(())
}

pub async fn reveal_seed(session: &Session, seed: &str) -> Result<()> {
    let seed = parse_seed(seed)?;
    let ctx = session.ctx()?;
    let settlement = session
        .host
        .execute(|l| l.settle_round(&ctx, seed))
        .await?;

    print_settlement(&settlement, &session.symbol());
    Ok(())
}

pub async fn abandon_round(session: &Session) -> Result<()> {
    let ctx = session.ctx()?;
    let refunded = session.host.execute(|l| l.abandon_round(&ctx)).await?;

    println!("Round abandoned");
    println!(
        "{} {} returned to bettors as claimable prizes",
        refunded,
        session.symbol()
    );
    Ok(())
}

pub async fn list_events(session: &Session, round: Option<u64>, limit: usize) -> Result<()> {
    let store = EventStore::new(session.host.storage());
    let records = match round {
        Some(round_id) => store.for_round(round_id).await?,
        None => store.recent(limit).await?,
    };

    if records.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Time", "Round", "Event", "Details"]);

    for record in &records {
        table.add_row(vec![
            format_time(record.timestamp),
            record.round_id.to_string(),
            record.event.name().to_string(),
            describe(&record.event),
        ]);
    }

    println!("{}", table);
    println!("Showing {} of {} events", records.len(), store.count().await?);
    Ok(())
}

fn pick_seed(seed: Option<String>, random: bool) -> Result<Seed> {
    match (seed, random) {
        (Some(_), true) => bail!("Pass either a seed or --random, not both"),
        (Some(seed), false) => parse_seed(&seed),
        (None, true) => Ok(Seed::random()),
        (None, false) => bail!("A seed is required, or pass --random"),
    }
}

fn print_settlement(settlement: &Settlement, symbol: &str) {
    println!();
    println!("------ ROUND SETTLED ------");
    println!("═══════════════════════════════════");

    if settlement.payouts.is_empty() {
        println!("No bets were placed, nothing to pay out");
        return;
    }

    println!("Prize: {} {}", settlement.prize, symbol);
    println!("Owner fee: {} {}", settlement.fee, symbol);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Share", "Winner", "Amount"]);
    for (k, (winner, amount)) in settlement.payouts.iter().enumerate() {
        table.add_row(vec![
            (k + 1).to_string(),
            winner.to_string(),
            format!("{} {}", amount, symbol),
        ]);
    }
    println!("{}", table);
    println!("Winners can claim with 'lottery claim'");
}

fn describe(event: &LotteryEvent) -> String {
    match event {
        LotteryEvent::RoundOpened { closing_time } => {
            format!("closes {}", format_time(*closing_time))
        }
        LotteryEvent::BetPlaced {
            bettor,
            count,
            prize_pool,
            ..
        } => format!("{} x{}, pool {}", bettor, count, prize_pool),
        LotteryEvent::SeedSealed {
            digest, resealed, ..
        } => {
            if *resealed {
                format!("resealed {}", digest)
            } else {
                digest.to_string()
            }
        }
        LotteryEvent::RoundSettled {
            winners,
            prize,
            fee,
        } => {
            let winners: Vec<String> = winners.iter().map(|w| w.to_string()).collect();
            format!("prize {} to [{}], fee {}", prize, winners.join(", "), fee)
        }
        LotteryEvent::RoundAbandoned { refunded } => format!("refunded {}", refunded),
        LotteryEvent::PrizeWithdrawn { account, amount } => format!("{} took {}", account, amount),
        LotteryEvent::FeeWithdrawn { amount } => amount.to_string(),
        LotteryEvent::TrustedPartyChanged { current, .. } => current.to_string(),
        LotteryEvent::TokensPurchased {
            buyer,
            payment,
            minted,
        } => format!("{} paid {} for {}", buyer, payment, minted),
        LotteryEvent::TokensReturned {
            account,
            burned,
            refund,
        } => format!("{} burned {} for {}", account, burned, refund),
    }
}
