use crate::types::{Address, Digest, Seed, Timestamp};
use serde::{Deserialize, Serialize};

/// Trait for commitment schemes
pub trait CommitmentScheme {
    fn commit(party: &Address, seed: &Seed) -> Digest;

    fn verify(digest: &Digest, party: &Address, seed: &Seed) -> bool {
        Self::commit(party, seed) == *digest
    }
}

/// Commitment stored while a round is sealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedCommitment {
    pub digest: Digest,
    /// Address the digest is bound to, captured when the round was sealed
    pub party: Address,
    pub sealed_at: Timestamp,
}

impl SealedCommitment {
    pub fn new(digest: Digest, party: Address, sealed_at: Timestamp) -> Self {
        Self {
            digest,
            party,
            sealed_at,
        }
    }

    pub fn matches<S: CommitmentScheme>(&self, seed: &Seed) -> bool {
        S::verify(&self.digest, &self.party, seed)
    }
}
