use gamba_types::ledger::{
    CoinId, DEFAULT_COIN, INITIAL_STAKE, MAX_NAME_LENGTH, MAX_SECRET_LENGTH,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coin seeded at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CoinConfig {
    pub unique_name: String,
    pub display_name: String,
}

/// Configuration for the [crate::Engine].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Amount granted to every new account. Zero disables the grant.
    #[serde(default = "default_initial_stake")]
    pub initial_stake: u64,
    #[serde(default = "default_stake_coin")]
    pub stake_coin: CoinId,
    /// Coins registered at genesis; the first one receives [DEFAULT_COIN].
    #[serde(default = "default_coins")]
    pub coins: Vec<CoinConfig>,
    /// Random bytes behind each game id and server secret (rendered as hex).
    #[serde(default = "default_secret_bytes")]
    pub secret_bytes: usize,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: usize },
    #[error("{field} must be <= {max} (got {value})")]
    TooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },
    #[error("at least one coin must be configured")]
    NoCoins,
    #[error("duplicate coin name: {0}")]
    DuplicateCoin(String),
    #[error("coin name is invalid: {0:?}")]
    InvalidCoinName(String),
    #[error("stake coin {0} is not configured")]
    UnknownStakeCoin(CoinId),
}

fn default_initial_stake() -> u64 {
    INITIAL_STAKE
}

fn default_stake_coin() -> CoinId {
    DEFAULT_COIN
}

fn default_coins() -> Vec<CoinConfig> {
    vec![CoinConfig {
        unique_name: "credit".to_string(),
        display_name: "Credit".to_string(),
    }]
}

fn default_secret_bytes() -> usize {
    512
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_stake: default_initial_stake(),
            stake_coin: default_stake_coin(),
            coins: default_coins(),
            secret_bytes: default_secret_bytes(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_bytes == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "secret_bytes",
                value: self.secret_bytes,
            });
        }
        if self.secret_bytes * 2 > MAX_SECRET_LENGTH {
            return Err(ConfigError::TooLarge {
                field: "secret_bytes",
                value: self.secret_bytes,
                max: MAX_SECRET_LENGTH / 2,
            });
        }
        if self.coins.is_empty() {
            return Err(ConfigError::NoCoins);
        }
        for (i, coin) in self.coins.iter().enumerate() {
            for name in [&coin.unique_name, &coin.display_name] {
                if name.is_empty() || name.len() > MAX_NAME_LENGTH {
                    return Err(ConfigError::InvalidCoinName(name.clone()));
                }
            }
            if self.coins[..i]
                .iter()
                .any(|other| other.unique_name == coin.unique_name)
            {
                return Err(ConfigError::DuplicateCoin(coin.unique_name.clone()));
            }
        }
        // Genesis coins take ids in configuration order
        if self.stake_coin.get() >= self.coins.len() as u64 {
            return Err(ConfigError::UnknownStakeCoin(self.stake_coin));
        }
        Ok(())
    }
}
