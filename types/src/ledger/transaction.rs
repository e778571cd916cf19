use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::sha256::Digest;
use serde::{Deserialize, Serialize};

use super::{
    read_string, string_encode_size, write_string, AccountId, CoinId, TransactionId,
    MAX_REASON_LENGTH,
};

/// Tag describing which detail record (if any) a transaction joins to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TransactionKind {
    None = 0,
    Reward = 1,
    Game = 2,
    /// Internal move between two accounts of the same holder.
    Consolidation = 3,
}

impl Write for TransactionKind {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for TransactionKind {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Reward),
            2 => Ok(Self::Game),
            3 => Ok(Self::Consolidation),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for TransactionKind {
    const SIZE: usize = 1;
}

/// Immutable ledger entry.
///
/// `self_hash` is the SHA-256 of [TransactionRecord::payload], which covers
/// every other field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub src: AccountId,
    pub dst: AccountId,
    pub coin: CoinId,
    pub amount: u64,
    pub kind: TransactionKind,
    pub reason: String,
    pub inner_hash: Option<Digest>,
    pub created_at: u64,
    pub self_hash: Digest,
}

impl TransactionRecord {
    /// Canonical encoding of the immutable fields.
    pub fn payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.encode_size());
        self.write_payload(&mut payload);
        payload
    }

    fn write_payload(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.src.write(writer);
        self.dst.write(writer);
        self.coin.write(writer);
        self.amount.write(writer);
        self.kind.write(writer);
        write_string(&self.reason, writer);
        self.inner_hash.write(writer);
        self.created_at.write(writer);
    }

    /// Signed change this record applies to `account`'s balance of its coin.
    pub fn delta_for(&self, account: AccountId) -> i128 {
        let amount = self.amount as i128;
        match (self.src == account, self.dst == account) {
            (true, true) | (false, false) => 0,
            (true, false) => -amount,
            (false, true) => amount,
        }
    }
}

impl Write for TransactionRecord {
    fn write(&self, writer: &mut impl BufMut) {
        self.write_payload(writer);
        self.self_hash.write(writer);
    }
}

impl Read for TransactionRecord {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: TransactionId::read(reader)?,
            src: AccountId::read(reader)?,
            dst: AccountId::read(reader)?,
            coin: CoinId::read(reader)?,
            amount: u64::read(reader)?,
            kind: TransactionKind::read(reader)?,
            reason: read_string(reader, MAX_REASON_LENGTH)?,
            inner_hash: Option::<Digest>::read(reader)?,
            created_at: u64::read(reader)?,
            self_hash: Digest::read(reader)?,
        })
    }
}

impl EncodeSize for TransactionRecord {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.src.encode_size()
            + self.dst.encode_size()
            + self.coin.encode_size()
            + self.amount.encode_size()
            + self.kind.encode_size()
            + string_encode_size(&self.reason)
            + self.inner_hash.encode_size()
            + self.created_at.encode_size()
            + self.self_hash.encode_size()
    }
}

/// Link in the hash chain. `sequence` starts at zero and has no gaps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainEntry {
    pub sequence: u64,
    pub chain_hash: Digest,
    pub transaction: TransactionId,
}

impl Write for ChainEntry {
    fn write(&self, writer: &mut impl BufMut) {
        self.sequence.write(writer);
        self.chain_hash.write(writer);
        self.transaction.write(writer);
    }
}

impl Read for ChainEntry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            sequence: u64::read(reader)?,
            chain_hash: Digest::read(reader)?,
            transaction: TransactionId::read(reader)?,
        })
    }
}

impl FixedSize for ChainEntry {
    const SIZE: usize = u64::SIZE + Digest::SIZE + TransactionId::SIZE;
}

/// Detail record behind a `reward` transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDetail {
    pub reason: String,
    pub transaction: TransactionId,
}

impl RewardDetail {
    /// Bytes hashed into the settlement's `inner_hash`.
    pub fn payload(reason: &str) -> Vec<u8> {
        let mut payload = Vec::with_capacity(string_encode_size(reason));
        write_string(reason, &mut payload);
        payload
    }
}

impl Write for RewardDetail {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.reason, writer);
        self.transaction.write(writer);
    }
}

impl Read for RewardDetail {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            reason: read_string(reader, MAX_REASON_LENGTH)?,
            transaction: TransactionId::read(reader)?,
        })
    }
}

impl EncodeSize for RewardDetail {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.reason) + self.transaction.encode_size()
    }
}
