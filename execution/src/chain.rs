//! Tamper-evident linking of ledger records.
//!
//! Each record carries `self_hash = H(payload)`. Chain entry `n` stores
//! `H(hex(chain_hash[n-1]) "::" hex(self_hash[n]))`, where the predecessor of
//! the first entry is [SENTINEL].

use commonware_cryptography::{sha256::Digest, Hasher, Sha256};
use gamba_types::ledger::{digest_hex, ChainEntry, TransactionRecord};
use tracing::warn;

use crate::Error;

/// Predecessor of the first chain entry.
pub const SENTINEL: Digest = Digest([0u8; 32]);

/// Hash over every field of `record` except `self_hash`.
pub fn self_hash(record: &TransactionRecord) -> Digest {
    Sha256::hash(&record.payload())
}

/// `H(left "::" right)`.
pub fn commitment(left: &str, right: &str) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(b"::");
    hasher.update(right.as_bytes());
    hasher.finalize()
}

pub fn next_chain_hash(prev: &Digest, self_hash: &Digest) -> Digest {
    commitment(&digest_hex(prev), &digest_hex(self_hash))
}

/// Recomputes every link in order and returns the number of entries checked.
///
/// Fails at the first entry whose sequence, record hash, or chain hash
/// disagrees with what is stored.
pub fn verify_chain<'a, I>(links: I) -> Result<u64, Error>
where
    I: IntoIterator<Item = (&'a ChainEntry, &'a TransactionRecord)>,
{
    let mut prev = SENTINEL;
    let mut verified = 0u64;
    for (entry, record) in links {
        let intact = entry.sequence == verified
            && entry.transaction == record.id
            && self_hash(record) == record.self_hash
            && next_chain_hash(&prev, &record.self_hash) == entry.chain_hash;
        if !intact {
            warn!(sequence = entry.sequence, transaction = %record.id, "chain link mismatch");
            return Err(Error::ChainBroken {
                sequence: entry.sequence,
            });
        }
        prev = entry.chain_hash;
        verified += 1;
    }
    Ok(verified)
}
