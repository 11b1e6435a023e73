pub mod scheme;

pub use scheme::{CommitmentScheme, SealedCommitment};

use crate::types::{Address, Digest, Seed};
use sha2::{Digest as _, Sha256};

/// SHA-256 over the party address (left-padded to a word) followed by the seed
#[derive(Debug, Clone, Copy, Default)]
pub struct HashCommitment;

impl CommitmentScheme for HashCommitment {
    fn commit(party: &Address, seed: &Seed) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(party.to_word());
        hasher.update(seed.as_bytes());
        Digest::new(hasher.finalize().into())
    }
}

/// Digest an operator publishes before revealing `seed`
pub fn commit(party: &Address, seed: &Seed) -> Digest {
    HashCommitment::commit(party, seed)
}

pub fn verify(digest: &Digest, party: &Address, seed: &Seed) -> bool {
    HashCommitment::verify(digest, party, seed)
}
