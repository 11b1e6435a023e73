//! Commit-reveal betting pool
//!
//! Bettors stake credits in a round. A trusted party seals the round with the
//! hash of a secret seed, then reveals the seed to draw winners in proportion
//! to the bets they placed. The owner keeps a fixed fee per bet.

pub mod access;
pub mod betting;
pub mod commitment;
pub mod config;
pub mod credit;
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod payouts;
pub mod round;
pub mod settlement;
pub mod storage;
pub mod types;

pub use commitment::{commit, verify, CommitmentScheme, HashCommitment, SealedCommitment};
pub use config::LotteryConfig;
pub use credit::{CreditLedger, TokenLedger};
pub use engine::{Lottery, LotteryState};
pub use error::{ErrorKind, FundsKind, LotteryError, Result};
pub use events::{EventRecord, LotteryEvent};
pub use host::LotteryHost;
pub use round::{Round, RoundState};
pub use settlement::Settlement;
pub use storage::Storage;
pub use types::{Address, Amount, CallContext, Digest, Seed, Timestamp};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_round() {
        let owner = Address::derive("owner");
        let alice = Address::derive("alice");
        let mut lottery = Lottery::with_token(LotteryConfig::default(), owner).unwrap();

        let at = |caller| CallContext::new(caller, 10);
        lottery.open_round(&at(owner), 20).unwrap();
        lottery.purchase_tokens(&at(alice), Amount::from_whole(1)).unwrap();
        lottery.approve(&at(alice), Amount::MAX);
        lottery.place_bet(&at(alice)).unwrap();

        let seed = Seed::from_text("seed1").unwrap();
        lottery.seal_round(&at(owner), commit(&owner, &seed)).unwrap();
        let outcome = lottery.settle_round(&at(alice), seed).unwrap();

        assert_eq!(outcome.winners(), vec![alice]);
        assert_eq!(lottery.claimable_prize(&alice), "0.8".parse::<Amount>().unwrap());
    }
}
