pub mod chain;
pub mod fair;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod tests;

mod config;
mod engine;
mod error;
mod layer;
mod state;

pub use config::{CoinConfig, Config, ConfigError};
pub use engine::Engine;
pub use error::Error;
pub use layer::{Layer, Savepoint, Settlement};
pub use state::{Memory, State, Status};
