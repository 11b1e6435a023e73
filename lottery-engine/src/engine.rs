use crate::access::Roles;
use crate::betting::BetRecord;
use crate::commitment::{HashCommitment, SealedCommitment};
use crate::config::LotteryConfig;
use crate::credit::{CreditLedger, TokenLedger};
use crate::error::{FundsKind, LotteryError, Result};
use crate::events::{EventRecord, LotteryEvent};
use crate::payouts::PrizeLedger;
use crate::round::{Round, RoundState};
use crate::settlement::{self, Settlement};
use crate::types::{Address, Amount, CallContext, Digest, Seed, Timestamp};
use serde::{Deserialize, Serialize};

/// Everything the engine owns, in one record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryState {
    pub config: LotteryConfig,
    pub roles: Roles,
    pub round: Round,
    pub bets: BetRecord,
    pub payouts: PrizeLedger,
    /// Native payment received for credits and not yet refunded
    pub reserve: Amount,
}

impl LotteryState {
    pub fn new(config: LotteryConfig, owner: Address) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            roles: Roles::new(owner),
            round: Round::new(),
            bets: BetRecord::new(),
            payouts: PrizeLedger::new(),
            reserve: Amount::ZERO,
        })
    }
}

/// Betting pool with a commit-reveal draw.
///
/// Every operation either applies completely or returns an error without
/// touching state: inputs and balances are checked before the first write.
#[derive(Debug, Clone)]
pub struct Lottery<L: CreditLedger = TokenLedger> {
    state: LotteryState,
    ledger: L,
    events: Vec<EventRecord>,
}

impl Lottery<TokenLedger> {
    /// Engine with a fresh in-memory credit token named after the config
    pub fn with_token(config: LotteryConfig, owner: Address) -> Result<Self> {
        let ledger = TokenLedger::new(&config.token_name, &config.token_symbol);
        Self::new(config, owner, ledger)
    }
}

impl<L: CreditLedger> Lottery<L> {
    pub fn new(config: LotteryConfig, owner: Address, ledger: L) -> Result<Self> {
        let state = LotteryState::new(config, owner)?;
        tracing::info!(
            "Lottery created by {} (bet price {}, bet fee {})",
            owner,
            state.config.bet_price,
            state.config.bet_fee
        );
        Ok(Self::from_parts(state, ledger))
    }

    pub fn from_parts(state: LotteryState, ledger: L) -> Self {
        Self {
            state,
            ledger,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &LotteryState {
        &self.state
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &LotteryConfig {
        &self.state.config
    }

    pub fn round(&self) -> &Round {
        &self.state.round
    }

    pub fn round_id(&self) -> u64 {
        self.state.round.id()
    }

    pub fn round_state(&self) -> RoundState {
        self.state.round.state()
    }

    pub fn closing_time(&self) -> Timestamp {
        self.state.round.closing_time()
    }

    pub fn bets(&self) -> &BetRecord {
        &self.state.bets
    }

    pub fn total_bets(&self) -> u64 {
        self.state.bets.total_bets()
    }

    pub fn owner(&self) -> Address {
        self.state.roles.owner()
    }

    pub fn trusted_party(&self) -> Option<Address> {
        self.state.roles.trusted_party()
    }

    /// Address the next sealed digest must be bound to
    pub fn commitment_party(&self) -> Address {
        self.state.roles.commitment_party()
    }

    pub fn engine_account(&self) -> Address {
        self.state.config.engine_account
    }

    pub fn prize_pool(&self) -> Amount {
        self.state.bets.prize_pool()
    }

    pub fn owner_fee_pool(&self) -> Amount {
        self.state.payouts.owner_fee_pool()
    }

    pub fn reserve(&self) -> Amount {
        self.state.reserve
    }

    pub fn bets_of(&self, bettor: &Address) -> u64 {
        self.state.bets.bets_of(bettor)
    }

    pub fn claimable_prize(&self, account: &Address) -> Amount {
        self.state.payouts.claimable(account)
    }

    pub fn credit_balance(&self, account: &Address) -> Amount {
        self.ledger.balance_of(account)
    }

    pub fn is_round_open(&self) -> bool {
        self.state.round.is_open()
    }

    /// Events emitted since the last drain
    pub fn pending_events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, now: Timestamp, event: LotteryEvent) {
        tracing::debug!("Event {} in round {}", event.name(), self.state.round.id());
        self.events
            .push(EventRecord::new(self.state.round.id(), now, event));
    }

    /// Closed -> Open
    pub fn open_round(&mut self, ctx: &CallContext, closing_time: Timestamp) -> Result<u64> {
        let round_id = self.state.round.open(closing_time)?;
        self.state.bets.clear();

        tracing::info!(
            "Round {} opened by {}, closing at {}",
            round_id,
            ctx.caller,
            closing_time
        );
        self.emit(ctx.now, LotteryEvent::RoundOpened { closing_time });
        Ok(round_id)
    }

    /// Mints `payment * purchase_ratio` credits to the caller
    pub fn purchase_tokens(&mut self, ctx: &CallContext, payment: Amount) -> Result<Amount> {
        if payment.is_zero() {
            return Err(LotteryError::invalid_argument("Payment must be positive"));
        }
        let minted = payment
            .checked_mul(self.state.config.purchase_ratio as u128)
            .ok_or(LotteryError::Overflow)?;
        let reserve = self
            .state
            .reserve
            .checked_add(payment)
            .ok_or(LotteryError::Overflow)?;

        self.ledger.mint(ctx.caller, minted)?;
        self.state.reserve = reserve;

        tracing::info!("{} bought {} credits for {}", ctx.caller, minted, payment);
        self.emit(
            ctx.now,
            LotteryEvent::TokensPurchased {
                buyer: ctx.caller,
                payment,
                minted,
            },
        );
        Ok(minted)
    }

    /// Burns `amount` credits from the caller and returns the native refund owed
    pub fn return_tokens(&mut self, ctx: &CallContext, amount: Amount) -> Result<Amount> {
        if amount.is_zero() {
            return Err(LotteryError::invalid_argument("Amount must be positive"));
        }
        let refund = amount
            .checked_div(self.state.config.purchase_ratio as u128)
            .ok_or(LotteryError::Overflow)?;
        let reserve = self.state.reserve.checked_sub(refund).ok_or_else(|| {
            LotteryError::insufficient(FundsKind::Reserve, refund, self.state.reserve)
        })?;

        self.ledger.burn(ctx.caller, amount)?;
        self.state.reserve = reserve;

        tracing::info!("{} returned {} credits for {}", ctx.caller, amount, refund);
        self.emit(
            ctx.now,
            LotteryEvent::TokensReturned {
                account: ctx.caller,
                burned: amount,
                refund,
            },
        );
        Ok(refund)
    }

    /// Lets the engine pull up to `amount` of the caller's credits for bets
    pub fn approve(&mut self, ctx: &CallContext, amount: Amount) {
        let engine = self.engine_account();
        self.ledger.approve(ctx.caller, engine, amount);
    }

    pub fn place_bet(&mut self, ctx: &CallContext) -> Result<()> {
        self.place_bets(ctx, 1)
    }

    /// Stakes `count * bet_price` of the caller's credits in the current round
    pub fn place_bets(&mut self, ctx: &CallContext, count: u64) -> Result<()> {
        self.state
            .round
            .state()
            .require(RoundState::Open, "place bets")?;
        if !self.state.round.accepts_bets_at(ctx.now) {
            return Err(LotteryError::InvalidStateTransition {
                operation: "place bets",
                state: "past its closing time".to_string(),
            });
        }
        if count == 0 {
            return Err(LotteryError::invalid_argument("Bet count must be positive"));
        }

        let stake = self
            .state
            .config
            .bet_price
            .checked_mul(count as u128)
            .ok_or(LotteryError::Overflow)?;
        let prize_pool = self
            .prize_pool()
            .checked_add(stake)
            .ok_or(LotteryError::Overflow)?;
        self.state
            .bets
            .total_bets()
            .checked_add(count)
            .ok_or(LotteryError::Overflow)?;

        let engine = self.engine_account();
        self.ledger
            .transfer_from(engine, ctx.caller, engine, stake)?;
        self.state.bets.record(ctx.caller, count, stake)?;

        tracing::info!(
            "{} placed {} bet(s) in round {}, pool is {}",
            ctx.caller,
            count,
            self.state.round.id(),
            prize_pool
        );
        self.emit(
            ctx.now,
            LotteryEvent::BetPlaced {
                bettor: ctx.caller,
                count,
                stake,
                prize_pool,
            },
        );
        Ok(())
    }

    /// Open -> Sealed. Closes betting and stores the digest of the seed to be revealed.
    pub fn seal_round(&mut self, ctx: &CallContext, digest: Digest) -> Result<()> {
        self.state.roles.require_sealer(&ctx.caller, "seal the round")?;

        let party = self.state.roles.commitment_party();
        self.state
            .round
            .seal(SealedCommitment::new(digest, party, ctx.now))?;

        tracing::info!(
            "Round {} sealed by {} with digest {}",
            self.state.round.id(),
            ctx.caller,
            digest
        );
        self.emit(
            ctx.now,
            LotteryEvent::SeedSealed {
                digest,
                party,
                resealed: false,
            },
        );
        Ok(())
    }

    /// Replaces the commitment of a sealed round whose reveal cannot be produced
    pub fn reseal_round(&mut self, ctx: &CallContext, digest: Digest) -> Result<()> {
        self.state.roles.require_owner(&ctx.caller, "reseal the round")?;

        let party = self.state.roles.commitment_party();
        self.state
            .round
            .reseal(SealedCommitment::new(digest, party, ctx.now))?;

        tracing::warn!(
            "Round {} resealed by {} with digest {}",
            self.state.round.id(),
            ctx.caller,
            digest
        );
        self.emit(
            ctx.now,
            LotteryEvent::SeedSealed {
                digest,
                party,
                resealed: true,
            },
        );
        Ok(())
    }

    /// Sealed -> Closed. Verifies `seed` against the commitment, draws the
    /// winners and moves the pool into the prize and fee ledgers.
    pub fn settle_round(&mut self, ctx: &CallContext, seed: Seed) -> Result<Settlement> {
        self.state
            .round
            .state()
            .require(RoundState::Sealed, "settle the round")?;

        let commitment = self
            .state
            .round
            .commitment()
            .ok_or_else(|| LotteryError::internal("Sealed round without commitment"))?;
        if !commitment.matches::<HashCommitment>(&seed) {
            tracing::warn!(
                "Rejected reveal from {} for round {}",
                ctx.caller,
                self.state.round.id()
            );
            return Err(LotteryError::CommitmentMismatch);
        }

        let outcome = settlement::settle(
            &self.state.bets,
            &seed,
            self.state.config.bet_fee,
            self.state.config.winners,
        )?;

        self.state
            .payouts
            .credit_settlement(outcome.fee, &outcome.payouts)?;
        self.state.bets.clear();
        self.state.round.close()?;

        tracing::info!(
            "Round {} settled: {} to {:?}, fee {}",
            self.state.round.id(),
            outcome.prize,
            outcome.winners(),
            outcome.fee
        );
        self.emit(
            ctx.now,
            LotteryEvent::RoundSettled {
                winners: outcome.winners(),
                prize: outcome.prize,
                fee: outcome.fee,
            },
        );
        Ok(outcome)
    }

    /// Sealed -> Closed without a draw; every stake becomes claimable by its bettor
    pub fn abandon_round(&mut self, ctx: &CallContext) -> Result<Amount> {
        self.state.roles.require_owner(&ctx.caller, "abandon the round")?;
        self.state
            .round
            .state()
            .require(RoundState::Sealed, "abandon the round")?;

        let price = self.state.config.bet_price;
        let mut refunds = Vec::with_capacity(self.state.bets.entries().len());
        for entry in self.state.bets.entries() {
            let stake = price
                .checked_mul(entry.count as u128)
                .ok_or(LotteryError::Overflow)?;
            refunds.push((entry.bettor, stake));
        }

        if self.state.round.commitment().is_none() {
            return Err(LotteryError::internal("Sealed round without commitment"));
        }

        let refunded = self.prize_pool();
        self.state
            .payouts
            .credit_settlement(Amount::ZERO, &refunds)?;
        self.state.bets.clear();
        self.state.round.close()?;

        tracing::warn!(
            "Round {} abandoned by {}, {} refunded",
            self.state.round.id(),
            ctx.caller,
            refunded
        );
        self.emit(ctx.now, LotteryEvent::RoundAbandoned { refunded });
        Ok(refunded)
    }

    /// Pays `amount` of the caller's prize out in credits
    pub fn withdraw_prize(&mut self, ctx: &CallContext, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Err(LotteryError::invalid_argument("Amount must be positive"));
        }
        let available = self.claimable_prize(&ctx.caller);
        if available < amount {
            return Err(LotteryError::insufficient(FundsKind::Prize, amount, available));
        }

        let engine = self.engine_account();
        self.ledger.transfer(engine, ctx.caller, amount)?;
        self.state.payouts.debit_prize(ctx.caller, amount)?;

        tracing::info!("{} withdrew prize of {}", ctx.caller, amount);
        self.emit(
            ctx.now,
            LotteryEvent::PrizeWithdrawn {
                account: ctx.caller,
                amount,
            },
        );
        Ok(())
    }

    /// Pays `amount` of the fee pool to the owner
    pub fn withdraw_fee(&mut self, ctx: &CallContext, amount: Amount) -> Result<()> {
        self.state.roles.require_owner(&ctx.caller, "withdraw fees")?;
        if amount.is_zero() {
            return Err(LotteryError::invalid_argument("Amount must be positive"));
        }
        let available = self.owner_fee_pool();
        if available < amount {
            return Err(LotteryError::insufficient(FundsKind::FeePool, amount, available));
        }

        let engine = self.engine_account();
        self.ledger.transfer(engine, ctx.caller, amount)?;
        self.state.payouts.debit_fee(amount)?;

        tracing::info!("Owner withdrew {} in fees", amount);
        self.emit(ctx.now, LotteryEvent::FeeWithdrawn { amount });
        Ok(())
    }

    pub fn set_trusted_party(&mut self, ctx: &CallContext, party: Address) -> Result<()> {
        self.state
            .roles
            .require_owner(&ctx.caller, "set the trusted party")?;
        // the pending reveal is verified against the party the round was sealed with
        if self.state.round.state() == RoundState::Sealed {
            return Err(LotteryError::InvalidStateTransition {
                operation: "set the trusted party",
                state: RoundState::Sealed.to_string(),
            });
        }
        if party == Address::ZERO {
            return Err(LotteryError::invalid_argument(
                "Trusted party cannot be the zero address",
            ));
        }

        let previous = self.state.roles.set_trusted_party(party);

        tracing::info!("Trusted party set to {}", party);
        self.emit(
            ctx.now,
            LotteryEvent::TrustedPartyChanged {
                previous,
                current: party,
            },
        );
        Ok(())
    }

    /// Checks the accounting invariants: the pool equals the stakes recorded,
    /// and the engine account holds at least the pool plus every unpaid prize
    /// and fee.
    pub fn audit(&self) -> Result<()> {
        let stakes = self
            .state
            .config
            .bet_price
            .checked_mul(self.state.bets.total_bets() as u128)
            .ok_or(LotteryError::Overflow)?;
        if stakes != self.prize_pool() {
            return Err(LotteryError::internal(format!(
                "Prize pool {} does not match recorded stakes {}",
                self.prize_pool(),
                stakes
            )));
        }

        let owed = self
            .prize_pool()
            .checked_add(self.state.payouts.outstanding())
            .and_then(|owed| owed.checked_add(self.owner_fee_pool()))
            .ok_or(LotteryError::Overflow)?;
        let held = self.ledger.balance_of(&self.engine_account());
        if held < owed {
            return Err(LotteryError::internal(format!(
                "Engine holds {} but owes {}",
                held, owed
            )));
        }

        if self.state.round.state() == RoundState::Sealed {
            let commitment = self
                .state
                .round
                .commitment()
                .ok_or_else(|| LotteryError::internal("Sealed round without commitment"))?;
            if commitment.party != self.commitment_party() {
                return Err(LotteryError::internal(format!(
                    "Round sealed for {} but the commitment party is {}",
                    commitment.party,
                    self.commitment_party()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::commit;
    use crate::error::ErrorKind;

    const NOW: Timestamp = 1_700_000_000;

    struct Fixture {
        lottery: Lottery,
        owner: Address,
        alice: Address,
        bob: Address,
    }

    fn fixture(config: LotteryConfig) -> Fixture {
        let owner = Address::derive("owner");
        Fixture {
            lottery: Lottery::with_token(config, owner).unwrap(),
            owner,
            alice: Address::derive("alice"),
            bob: Address::derive("bob"),
        }
    }

    fn ctx(caller: Address) -> CallContext {
        CallContext::new(caller, NOW)
    }

    fn whole(n: u64) -> Amount {
        Amount::from_whole(n)
    }

    fn seed(text: &str) -> Seed {
        Seed::from_text(text).unwrap()
    }

    /// Buys credits, approves the engine and bets `count` times
    fn fund_and_bet(lottery: &mut Lottery, bettor: Address, count: u64) {
        let price = lottery.config().bet_price;
        lottery
            .purchase_tokens(&ctx(bettor), price.checked_mul(count as u128).unwrap())
            .unwrap();
        lottery.approve(&ctx(bettor), Amount::MAX);
        lottery.place_bets(&ctx(bettor), count).unwrap();
    }

    fn seal_with(lottery: &mut Lottery, sealer: Address, text: &str) {
        let digest = commit(&lottery.commitment_party(), &seed(text));
        lottery.seal_round(&ctx(sealer), digest).unwrap();
    }

    #[test]
    fn test_lottery_starts_closed() {
        let f = fixture(LotteryConfig::default());
        assert!(!f.lottery.is_round_open());
        assert_eq!(f.lottery.round().state(), RoundState::Closed);
    }

    #[test]
    fn test_open_round() {
        let mut f = fixture(LotteryConfig::default());
        let round_id = f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();

        assert_eq!(round_id, 1);
        assert_eq!(f.lottery.round_id(), 1);
        assert!(f.lottery.is_round_open());
        assert_eq!(f.lottery.round_state(), RoundState::Open);
        assert_eq!(f.lottery.closing_time(), NOW + 100);
    }

    #[test]
    fn test_open_round_twice_fails() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();

        let err = f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);

        seal_with(&mut f.lottery, f.owner, "seed1");
        let err = f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[test]
    fn test_place_bets_updates_pool() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();

        fund_and_bet(&mut f.lottery, f.alice, 3);
        assert_eq!(f.lottery.prize_pool(), whole(3));
        assert_eq!(f.lottery.bets_of(&f.alice), 3);

        fund_and_bet(&mut f.lottery, f.alice, 2);
        assert_eq!(f.lottery.prize_pool(), whole(5));
        assert_eq!(f.lottery.bets_of(&f.alice), 5);
        assert_eq!(f.lottery.total_bets(), 5);
        assert_eq!(f.lottery.credit_balance(&f.alice), Amount::ZERO);
        f.lottery.audit().unwrap();
    }

    #[test]
    fn test_single_bet() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        f.lottery.purchase_tokens(&ctx(f.alice), whole(1)).unwrap();
        f.lottery.approve(&ctx(f.alice), whole(1));

        f.lottery.place_bet(&ctx(f.alice)).unwrap();
        assert_eq!(f.lottery.bets_of(&f.alice), 1);
    }

    #[test]
    fn test_bet_requires_open_round() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.purchase_tokens(&ctx(f.alice), whole(1)).unwrap();
        f.lottery.approve(&ctx(f.alice), Amount::MAX);

        let err = f.lottery.place_bets(&ctx(f.alice), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        assert_eq!(f.lottery.credit_balance(&f.alice), whole(1));
    }

    #[test]
    fn test_bet_after_closing_time_rejected() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        f.lottery.purchase_tokens(&ctx(f.alice), whole(1)).unwrap();
        f.lottery.approve(&ctx(f.alice), Amount::MAX);

        let late = CallContext::new(f.alice, NOW + 100);
        let err = f.lottery.place_bets(&late, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        assert!(f.lottery.is_round_open());
        assert_eq!(f.lottery.prize_pool(), Amount::ZERO);
    }

    #[test]
    fn test_zero_bets_rejected() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();

        let err = f.lottery.place_bets(&ctx(f.alice), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_bet_without_allowance_or_balance() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        f.lottery.purchase_tokens(&ctx(f.alice), whole(2)).unwrap();

        let err = f.lottery.place_bets(&ctx(f.alice), 1).unwrap_err();
        assert!(matches!(
            err,
            LotteryError::InsufficientFunds {
                kind: FundsKind::Allowance,
                ..
            }
        ));

        f.lottery.approve(&ctx(f.alice), Amount::MAX);
        let err = f.lottery.place_bets(&ctx(f.alice), 3).unwrap_err();
        assert!(matches!(
            err,
            LotteryError::InsufficientFunds {
                kind: FundsKind::Balance,
                ..
            }
        ));
        assert_eq!(f.lottery.bets_of(&f.alice), 0);
        assert_eq!(f.lottery.prize_pool(), Amount::ZERO);
        assert_eq!(f.lottery.credit_balance(&f.alice), whole(2));
    }

    #[test]
    fn test_seal_requires_role() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        let digest = commit(&f.owner, &seed("seed1"));

        let err = f.lottery.seal_round(&ctx(f.alice), digest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(f.lottery.is_round_open());

        let trusted = Address::derive("trusted");
        f.lottery.set_trusted_party(&ctx(f.owner), trusted).unwrap();
        let digest = commit(&trusted, &seed("seed1"));
        f.lottery.seal_round(&ctx(trusted), digest).unwrap();
        assert_eq!(f.lottery.round().state(), RoundState::Sealed);
    }

    #[test]
    fn test_seal_requires_open_round() {
        let mut f = fixture(LotteryConfig::default());
        let digest = commit(&f.owner, &seed("seed1"));

        let err = f.lottery.seal_round(&ctx(f.owner), digest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[test]
    fn test_reveal_scenario() {
        let mut f = fixture(LotteryConfig::default());
        let trusted = Address::derive("trusted");
        f.lottery.set_trusted_party(&ctx(f.owner), trusted).unwrap();
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        fund_and_bet(&mut f.lottery, f.alice, 3);
        assert_eq!(f.lottery.prize_pool(), whole(3));

        let digest = commit(&trusted, &seed("seed1"));
        f.lottery.seal_round(&ctx(f.owner), digest).unwrap();

        let err = f
            .lottery
            .settle_round(&ctx(f.owner), seed("seed2"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommitmentMismatch);
        assert_eq!(f.lottery.round().state(), RoundState::Sealed);
        assert_eq!(f.lottery.prize_pool(), whole(3));
        assert_eq!(f.lottery.round().commitment().unwrap().digest, digest);

        let outcome = f
            .lottery
            .settle_round(&ctx(f.owner), seed("seed1"))
            .unwrap();
        assert_eq!(outcome.winners(), vec![f.alice]);
        assert_eq!(f.lottery.round().state(), RoundState::Closed);
        assert!(f.lottery.round().commitment().is_none());
    }

    #[test]
    fn test_settlement_conserves_value() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        fund_and_bet(&mut f.lottery, f.alice, 3);
        fund_and_bet(&mut f.lottery, f.bob, 7);
        seal_with(&mut f.lottery, f.owner, "seed1");

        let pool_before = f.lottery.prize_pool();
        let outcome = f
            .lottery
            .settle_round(&ctx(f.owner), seed("seed1"))
            .unwrap();

        let prizes = f
            .lottery
            .claimable_prize(&f.alice)
            .checked_add(f.lottery.claimable_prize(&f.bob))
            .unwrap();
        assert_eq!(
            prizes.checked_add(f.lottery.owner_fee_pool()).unwrap(),
            pool_before
        );
        assert_eq!(outcome.fee, whole(2));
        assert_eq!(outcome.prize, whole(8));
        assert_eq!(f.lottery.prize_pool(), Amount::ZERO);
        assert_eq!(f.lottery.bets_of(&f.alice), 0);
        f.lottery.audit().unwrap();
    }

    #[test]
    fn test_settlement_with_several_winners() {
        let config = LotteryConfig::default().with_winners(3);
        let mut f = fixture(config);
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        fund_and_bet(&mut f.lottery, f.alice, 4);
        fund_and_bet(&mut f.lottery, f.bob, 5);
        seal_with(&mut f.lottery, f.owner, "three");

        let outcome = f
            .lottery
            .settle_round(&ctx(f.owner), seed("three"))
            .unwrap();
        assert_eq!(outcome.payouts.len(), 3);

        let prizes = f
            .lottery
            .claimable_prize(&f.alice)
            .checked_add(f.lottery.claimable_prize(&f.bob))
            .unwrap();
        assert_eq!(prizes, outcome.prize);
        f.lottery.audit().unwrap();
    }

    #[test]
    fn test_same_seed_same_winner() {
        let run = |text: &str| {
            let mut f = fixture(LotteryConfig::default());
            f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
            fund_and_bet(&mut f.lottery, f.alice, 2);
            fund_and_bet(&mut f.lottery, f.bob, 3);
            seal_with(&mut f.lottery, f.owner, text);
            f.lottery
                .settle_round(&ctx(f.owner), seed(text))
                .unwrap()
                .winners()
        };

        for text in ["a", "b", "c", "d"] {
            assert_eq!(run(text), run(text));
        }
    }

    #[test]
    fn test_win_frequency_follows_bets() {
        let mut f = fixture(LotteryConfig::default());
        let mut bob_wins = 0;

        for i in 0..1000 {
            f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
            fund_and_bet(&mut f.lottery, f.alice, 1);
            fund_and_bet(&mut f.lottery, f.bob, 9);

            let text = format!("round-{}", i);
            seal_with(&mut f.lottery, f.owner, &text);
            let outcome = f
                .lottery
                .settle_round(&ctx(f.owner), seed(&text))
                .unwrap();
            if outcome.winners() == vec![f.bob] {
                bob_wins += 1;
            }
        }

        // 9x as often as alice, within sampling noise
        assert!((850..=950).contains(&bob_wins), "bob won {} of 1000", bob_wins);
        f.lottery.audit().unwrap();
    }

    #[test]
    fn test_empty_round_settles() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        seal_with(&mut f.lottery, f.owner, "seed1");

        let outcome = f
            .lottery
            .settle_round(&ctx(f.owner), seed("seed1"))
            .unwrap();
        assert!(outcome.payouts.is_empty());
        assert_eq!(f.lottery.owner_fee_pool(), Amount::ZERO);
        assert_eq!(f.lottery.round().state(), RoundState::Closed);
    }

    #[test]
    fn test_trusted_party_locked_while_sealed() {
        let mut f = fixture(LotteryConfig::default());
        let trusted = Address::derive("trusted");
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        seal_with(&mut f.lottery, f.owner, "seed1");

        let err = f
            .lottery
            .set_trusted_party(&ctx(f.owner), trusted)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        assert_eq!(f.lottery.trusted_party(), None);

        // the stored digest still verifies against the current commitment party
        let stored = f.lottery.round().commitment().unwrap().digest;
        assert!(crate::commitment::verify(
            &stored,
            &f.lottery.commitment_party(),
            &seed("seed1")
        ));
        f.lottery
            .settle_round(&ctx(f.alice), seed("seed1"))
            .unwrap();

        f.lottery.set_trusted_party(&ctx(f.owner), trusted).unwrap();
        assert_eq!(f.lottery.commitment_party(), trusted);
    }

    #[test]
    fn test_reseal_and_abandon() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        fund_and_bet(&mut f.lottery, f.alice, 2);
        fund_and_bet(&mut f.lottery, f.bob, 1);
        seal_with(&mut f.lottery, f.owner, "lost");

        let digest = commit(&f.owner, &seed("found"));
        let err = f
            .lottery
            .reseal_round(&ctx(f.alice), digest)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        f.lottery.reseal_round(&ctx(f.owner), digest).unwrap();
        assert!(f.lottery.settle_round(&ctx(f.owner), seed("lost")).is_err());

        let err = f.lottery.abandon_round(&ctx(f.bob)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let refunded = f.lottery.abandon_round(&ctx(f.owner)).unwrap();
        assert_eq!(refunded, whole(3));
        assert_eq!(f.lottery.claimable_prize(&f.alice), whole(2));
        assert_eq!(f.lottery.claimable_prize(&f.bob), whole(1));
        assert_eq!(f.lottery.owner_fee_pool(), Amount::ZERO);
        assert_eq!(f.lottery.round().state(), RoundState::Closed);
        f.lottery.audit().unwrap();
    }

    #[test]
    fn test_withdraw_prize() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        fund_and_bet(&mut f.lottery, f.alice, 5);
        seal_with(&mut f.lottery, f.owner, "seed1");
        f.lottery
            .settle_round(&ctx(f.owner), seed("seed1"))
            .unwrap();

        let prize = f.lottery.claimable_prize(&f.alice);
        assert_eq!(prize, whole(4));

        let too_much = prize.checked_add(whole(1)).unwrap();
        let err = f
            .lottery
            .withdraw_prize(&ctx(f.alice), too_much)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(f.lottery.claimable_prize(&f.alice), prize);

        f.lottery.withdraw_prize(&ctx(f.alice), prize).unwrap();
        assert_eq!(f.lottery.claimable_prize(&f.alice), Amount::ZERO);
        assert_eq!(f.lottery.credit_balance(&f.alice), prize);

        let err = f
            .lottery
            .withdraw_prize(&ctx(f.bob), whole(1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        f.lottery.audit().unwrap();
    }

    #[test]
    fn test_withdraw_fee() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        fund_and_bet(&mut f.lottery, f.alice, 5);
        seal_with(&mut f.lottery, f.owner, "seed1");
        f.lottery
            .settle_round(&ctx(f.owner), seed("seed1"))
            .unwrap();
        assert_eq!(f.lottery.owner_fee_pool(), whole(1));

        let err = f
            .lottery
            .withdraw_fee(&ctx(f.alice), whole(1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = f
            .lottery
            .withdraw_fee(&ctx(f.owner), whole(2))
            .unwrap_err();
        assert!(matches!(
            err,
            LotteryError::InsufficientFunds {
                kind: FundsKind::FeePool,
                ..
            }
        ));
        assert_eq!(f.lottery.owner_fee_pool(), whole(1));

        f.lottery.withdraw_fee(&ctx(f.owner), whole(1)).unwrap();
        assert_eq!(f.lottery.owner_fee_pool(), Amount::ZERO);
        assert_eq!(f.lottery.credit_balance(&f.owner), whole(1));
    }

    #[test]
    fn test_withdraw_zero_rejected() {
        let mut f = fixture(LotteryConfig::default());
        let err = f
            .lottery
            .withdraw_prize(&ctx(f.alice), Amount::ZERO)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_set_trusted_party_owner_only() {
        let mut f = fixture(LotteryConfig::default());
        let err = f
            .lottery
            .set_trusted_party(&ctx(f.alice), f.alice)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(f.lottery.trusted_party(), None);

        let err = f
            .lottery
            .set_trusted_party(&ctx(f.owner), Address::ZERO)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_purchase_and_return_tokens() {
        let config = LotteryConfig::default().with_purchase_ratio(10);
        let mut f = fixture(config);

        let minted = f.lottery.purchase_tokens(&ctx(f.alice), whole(2)).unwrap();
        assert_eq!(minted, whole(20));
        assert_eq!(f.lottery.reserve(), whole(2));

        let refund = f.lottery.return_tokens(&ctx(f.alice), whole(10)).unwrap();
        assert_eq!(refund, whole(1));
        assert_eq!(f.lottery.credit_balance(&f.alice), whole(10));
        assert_eq!(f.lottery.reserve(), whole(1));

        let err = f
            .lottery
            .return_tokens(&ctx(f.bob), whole(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(f.lottery.reserve(), whole(1));
    }

    #[test]
    fn test_events_emitted() {
        let mut f = fixture(LotteryConfig::default());
        f.lottery.open_round(&ctx(f.owner), NOW + 100).unwrap();
        fund_and_bet(&mut f.lottery, f.alice, 1);
        seal_with(&mut f.lottery, f.owner, "seed1");
        f.lottery
            .settle_round(&ctx(f.owner), seed("seed1"))
            .unwrap();

        let names: Vec<&str> = f
            .lottery
            .drain_events()
            .iter()
            .map(|record| record.event.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "round_opened",
                "tokens_purchased",
                "bet_placed",
                "seed_sealed",
                "round_settled"
            ]
        );
        assert!(f.lottery.pending_events().is_empty());
    }

    #[test]
    fn test_failed_operations_emit_nothing() {
        let mut f = fixture(LotteryConfig::default());
        let _ = f.lottery.place_bets(&ctx(f.alice), 1);
        let _ = f.lottery.withdraw_fee(&ctx(f.alice), whole(1));
        assert!(f.lottery.pending_events().is_empty());
    }
}
