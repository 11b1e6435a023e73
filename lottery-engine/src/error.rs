use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LotteryError>;

/// Which balance was short when a transfer or withdrawal was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundsKind {
    Allowance,
    Balance,
    Prize,
    FeePool,
    Reserve,
}

impl fmt::Display for FundsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FundsKind::Allowance => "allowance",
            FundsKind::Balance => "balance",
            FundsKind::Prize => "prize balance",
            FundsKind::FeePool => "fee pool",
            FundsKind::Reserve => "reserve",
        };
        f.write_str(name)
    }
}

/// Coarse error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidStateTransition,
    Authorization,
    InsufficientFunds,
    CommitmentMismatch,
    InvalidArgument,
    Other,
}

#[derive(Error, Debug)]
pub enum LotteryError {
    #[error("Cannot {operation} while round is {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: String,
    },

    #[error("{caller} is not allowed to {operation}")]
    Authorization {
        operation: &'static str,
        caller: Address,
    },

    #[error("Insufficient {kind}: need {need}, have {available}")]
    InsufficientFunds {
        kind: FundsKind,
        need: Amount,
        available: Amount,
    },

    #[error("Revealed seed does not match the sealed commitment")]
    CommitmentMismatch,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LotteryError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn insufficient(kind: FundsKind, need: Amount, available: Amount) -> Self {
        Self::InsufficientFunds {
            kind,
            need,
            available,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LotteryError::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            LotteryError::Authorization { .. } => ErrorKind::Authorization,
            LotteryError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LotteryError::CommitmentMismatch => ErrorKind::CommitmentMismatch,
            LotteryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            _ => ErrorKind::Other,
        }
    }
}
