pub mod api;
pub mod execution;
pub mod ledger;
