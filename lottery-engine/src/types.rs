use crate::error::{LotteryError, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

/// Unix seconds, as reported by the host for the call being executed
pub type Timestamp = i64;

pub const AMOUNT_DECIMALS: u32 = 18;
const AMOUNT_SCALE: u128 = 10u128.pow(AMOUNT_DECIMALS);

/// 20-byte account identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Deterministic address from a label, used for dev accounts and the engine account
    pub fn derive(label: &str) -> Self {
        let hash = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Address left-padded to a 32-byte word
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)
            .map_err(|e| LotteryError::invalid_argument(format!("Invalid address {}: {}", s, e)))?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|_| {
            LotteryError::invalid_argument(format!("Address must be 20 bytes: {}", s))
        })?;
        Ok(Self(bytes))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = LotteryError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Credit amount in base units with 18 decimals
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(u128::MAX);

    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Whole credits, e.g. `from_whole(3)` is 3.0
    pub fn from_whole(whole: u64) -> Self {
        Self(whole as u128 * AMOUNT_SCALE)
    }

    pub const fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn checked_mul(self, factor: u128) -> Option<Amount> {
        self.0.checked_mul(factor).map(Amount)
    }

    pub fn checked_div(self, divisor: u128) -> Option<Amount> {
        self.0.checked_div(divisor).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / AMOUNT_SCALE;
        let frac = self.0 % AMOUNT_SCALE;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:0width$}", frac, width = AMOUNT_DECIMALS as usize);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self)
    }
}

impl FromStr for Amount {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LotteryError::invalid_argument(format!("Invalid amount: '{}'", s));
        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac.len() > AMOUNT_DECIMALS as usize {
            return Err(LotteryError::invalid_argument(format!(
                "Amount '{}' has more than {} decimals",
                s, AMOUNT_DECIMALS
            )));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_units: u128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = AMOUNT_DECIMALS as usize);
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(AMOUNT_SCALE)
            .and_then(|units| units.checked_add(frac_units))
            .map(Amount)
            .ok_or(LotteryError::Overflow)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl TryFrom<String> for Amount {
    type Error = LotteryError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// 32-byte value revealed to settle a round
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed([u8; 32]);

impl Seed {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// UTF-8 text right-padded with zeros, the way short strings are packed into a word
    pub fn from_text(text: &str) -> Result<Self> {
        let raw = text.as_bytes();
        if raw.len() > 32 {
            return Err(LotteryError::invalid_argument(format!(
                "Seed text is {} bytes, at most 32 allowed",
                raw.len()
            )));
        }
        let mut bytes = [0u8; 32];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)
            .map_err(|e| LotteryError::invalid_argument(format!("Invalid seed hex: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| LotteryError::invalid_argument("Seed must be 32 bytes"))?;
        Ok(Self(bytes))
    }

    /// Fresh seed from the thread RNG, for operators who do not bring their own
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the secret in debug output
        f.write_str("Seed(..)")
    }
}

/// 32-byte SHA-256 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

impl FromStr for Digest {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)
            .map_err(|e| LotteryError::invalid_argument(format!("Invalid digest hex: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| LotteryError::invalid_argument("Digest must be 32 bytes"))?;
        Ok(Self(bytes))
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_string()
    }
}

impl TryFrom<String> for Digest {
    type Error = LotteryError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Ambient inputs the host supplies with every call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// Caller with the wall-clock time
    pub fn now(caller: Address) -> Self {
        Self::new(caller, chrono::Utc::now().timestamp())
    }
}
