mod consolidation;
mod game;
mod ledger;
mod registry;
mod transfer;

pub use game::Settlement;
