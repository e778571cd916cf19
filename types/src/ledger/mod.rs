mod account;
mod codec;
mod constants;
mod game;
mod ids;
mod transaction;

pub use account::*;
pub use codec::{digest_hex, read_string, string_encode_size, write_string};
pub use constants::*;
pub use game::*;
pub use ids::*;
pub use transaction::*;

#[cfg(test)]
mod tests;
