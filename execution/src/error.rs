use gamba_types::ledger::{AccountId, CoinId, HolderId, UserId};
use thiserror::Error;

use crate::ConfigError;

/// Failure of a ledger operation. Any error returned from an atomic unit
/// leaves committed state untouched, except that a game consumed before an
/// [Error::InsufficientBalance] stays consumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: i64, required: u64 },
    #[error("unknown holder {0}")]
    UnknownHolder(HolderId),
    #[error("unknown account {0}")]
    UnknownAccount(AccountId),
    #[error("unknown coin {0}")]
    UnknownCoin(CoinId),
    #[error("unknown coin name {0}")]
    UnknownCoinName(String),
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("user {0} already registered")]
    UserExists(UserId),
    #[error("coin {0} already registered")]
    CoinExists(String),
    #[error("holder {holder} does not own account {account}")]
    NotOwner { holder: HolderId, account: AccountId },
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("{field} exceeds {max} bytes")]
    TooLong { field: &'static str, max: usize },
    #[error("game not found")]
    GameNotFound,
    #[error("game already used")]
    GameAlreadyUsed,
    #[error("transaction not found")]
    NotFound,
    #[error("prefix {prefix} matches {matches} transactions")]
    AmbiguousLookup { prefix: String, matches: usize },
    #[error("prefix must be at least {min} hex characters")]
    PrefixTooShort { min: usize },
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
    #[error("chain broken at sequence {sequence}")]
    ChainBroken { sequence: u64 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
