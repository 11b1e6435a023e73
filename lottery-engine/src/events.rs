use crate::types::{Address, Amount, Digest, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit record of a state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LotteryEvent {
    RoundOpened {
        closing_time: Timestamp,
    },
    BetPlaced {
        bettor: Address,
        count: u64,
        stake: Amount,
        prize_pool: Amount,
    },
    SeedSealed {
        digest: Digest,
        party: Address,
        resealed: bool,
    },
    RoundSettled {
        winners: Vec<Address>,
        prize: Amount,
        fee: Amount,
    },
    RoundAbandoned {
        refunded: Amount,
    },
    PrizeWithdrawn {
        account: Address,
        amount: Amount,
    },
    FeeWithdrawn {
        amount: Amount,
    },
    TrustedPartyChanged {
        previous: Option<Address>,
        current: Address,
    },
    TokensPurchased {
        buyer: Address,
        payment: Amount,
        minted: Amount,
    },
    TokensReturned {
        account: Address,
        burned: Amount,
        refund: Amount,
    },
}

impl LotteryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LotteryEvent::RoundOpened { .. } => "round_opened",
            LotteryEvent::BetPlaced { .. } => "bet_placed",
            LotteryEvent::SeedSealed { .. } => "seed_sealed",
            LotteryEvent::RoundSettled { .. } => "round_settled",
            LotteryEvent::RoundAbandoned { .. } => "round_abandoned",
            LotteryEvent::PrizeWithdrawn { .. } => "prize_withdrawn",
            LotteryEvent::FeeWithdrawn { .. } => "fee_withdrawn",
            LotteryEvent::TrustedPartyChanged { .. } => "trusted_party_changed",
            LotteryEvent::TokensPurchased { .. } => "tokens_purchased",
            LotteryEvent::TokensReturned { .. } => "tokens_returned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub round_id: u64,
    pub timestamp: Timestamp,
    pub event: LotteryEvent,
}

impl EventRecord {
    pub fn new(round_id: u64, timestamp: Timestamp, event: LotteryEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            round_id,
            timestamp,
            event,
        }
    }
}
