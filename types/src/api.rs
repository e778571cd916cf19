//! Read-side views handed to callers. Digests are rendered as lowercase hex.

use crate::ledger::{
    digest_hex, AccountId, ChainEntry, Coin, CoinSide, GameDetail, RewardDetail, TransactionId,
    TransactionKind, TransactionRecord,
};
use commonware_cryptography::sha256::Digest;
use serde::{Deserialize, Serialize};

/// Detail record joined to a transaction through its kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Detail {
    Game(GameDetail),
    Reward(RewardDetail),
}

/// A transaction joined with its chain entry, coin metadata and detail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: TransactionId,
    pub src: AccountId,
    pub dst: AccountId,
    pub coin: Coin,
    pub amount: u64,
    pub kind: TransactionKind,
    pub reason: String,
    pub inner_hash: Option<String>,
    pub created_at: u64,
    pub self_hash: String,
    pub chain_hash: String,
    pub sequence: u64,
    pub detail: Option<Detail>,
}

impl TransactionView {
    pub fn new(
        record: &TransactionRecord,
        entry: &ChainEntry,
        coin: Coin,
        detail: Option<Detail>,
    ) -> Self {
        Self {
            id: record.id,
            src: record.src,
            dst: record.dst,
            coin,
            amount: record.amount,
            kind: record.kind,
            reason: record.reason.clone(),
            inner_hash: record.inner_hash.as_ref().map(digest_hex),
            created_at: record.created_at,
            self_hash: digest_hex(&record.self_hash),
            chain_hash: digest_hex(&entry.chain_hash),
            sequence: entry.sequence,
            detail,
        }
    }
}

/// Balance of one coin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub coin: Coin,
    pub amount: i64,
}

/// Commitment disclosed to a player before they play.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCommitment {
    pub game_id: String,
    pub game_hash: String,
}

impl GameCommitment {
    pub fn new(game_id: String, game_hash: &Digest) -> Self {
        Self {
            game_id,
            game_hash: digest_hex(game_hash),
        }
    }
}

/// Settled result of a play.
///
/// When the caller omits a client secret the server generates one. The outcome
/// is then still bound to the commitment but no longer to player-chosen input,
/// so the fairness guarantee is weaker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayOutcome {
    pub win: bool,
    pub side: CoinSide,
    /// `+amount` on a win, `-amount` on a loss
    pub net_delta: i64,
    pub client_secret: String,
    pub transaction: TransactionView,
}

/// Result of walking the whole chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub verified: u64,
    pub head: Option<String>,
}
