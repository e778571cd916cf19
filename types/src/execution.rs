use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::sha256::Digest;

use crate::ledger::{
    read_string, string_encode_size, write_string, Account, AccountId, ChainEntry, Coin, CoinId,
    GameDetail, GameInstance, Holder, HolderId, RewardDetail, TransactionId, TransactionRecord,
    User, UserId, MAX_INDEX_ENTRIES, MAX_NAME_LENGTH, MAX_SECRET_LENGTH,
};

/// Allocation state. Holder, account, and coin ids start at zero; transaction
/// ids start at one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Counters {
    pub holders: u64,
    pub accounts: u64,
    pub coins: u64,
    pub transactions: u64,
    /// Number of chain entries; the tail is at `chain_length - 1`.
    pub chain_length: u64,
}

impl Write for Counters {
    fn write(&self, writer: &mut impl BufMut) {
        self.holders.write(writer);
        self.accounts.write(writer);
        self.coins.write(writer);
        self.transactions.write(writer);
        self.chain_length.write(writer);
    }
}

impl Read for Counters {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            holders: u64::read(reader)?,
            accounts: u64::read(reader)?,
            coins: u64::read(reader)?,
            transactions: u64::read(reader)?,
            chain_length: u64::read(reader)?,
        })
    }
}

impl FixedSize for Counters {
    const SIZE: usize = 5 * u64::SIZE;
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Id allocation (tag 0)
    Counters,

    // Registry keys (tags 1-5)
    Coin(CoinId),
    CoinName(String),
    Holder(HolderId),
    Account(AccountId),
    User(UserId),

    // Ledger keys (tags 10-15)
    Transaction(TransactionId),
    Chain(u64),
    ChainHash(Digest),
    /// Chain entries whose hex hash starts with this fixed-width prefix
    ChainPrefix(String),
    Sequence(TransactionId),
    History(AccountId),

    // Detail keys (tags 20-22)
    Game(String),
    GameDetail(TransactionId),
    RewardDetail(TransactionId),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Counters => 0u8.write(writer),

            // Registry keys (tags 1-5)
            Self::Coin(id) => {
                1u8.write(writer);
                id.write(writer);
            }
            Self::CoinName(name) => {
                2u8.write(writer);
                write_string(name, writer);
            }
            Self::Holder(id) => {
                3u8.write(writer);
                id.write(writer);
            }
            Self::Account(id) => {
                4u8.write(writer);
                id.write(writer);
            }
            Self::User(id) => {
                5u8.write(writer);
                id.write(writer);
            }

            // Ledger keys (tags 10-15)
            Self::Transaction(id) => {
                10u8.write(writer);
                id.write(writer);
            }
            Self::Chain(sequence) => {
                11u8.write(writer);
                sequence.write(writer);
            }
            Self::ChainHash(digest) => {
                12u8.write(writer);
                digest.write(writer);
            }
            Self::ChainPrefix(prefix) => {
                13u8.write(writer);
                write_string(prefix, writer);
            }
            Self::Sequence(id) => {
                14u8.write(writer);
                id.write(writer);
            }
            Self::History(id) => {
                15u8.write(writer);
                id.write(writer);
            }

            // Detail keys (tags 20-22)
            Self::Game(game_id) => {
                20u8.write(writer);
                write_string(game_id, writer);
            }
            Self::GameDetail(id) => {
                21u8.write(writer);
                id.write(writer);
            }
            Self::RewardDetail(id) => {
                22u8.write(writer);
                id.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Counters,

            1 => Self::Coin(CoinId::read(reader)?),
            2 => Self::CoinName(read_string(reader, MAX_NAME_LENGTH)?),
            3 => Self::Holder(HolderId::read(reader)?),
            4 => Self::Account(AccountId::read(reader)?),
            5 => Self::User(UserId::read(reader)?),

            10 => Self::Transaction(TransactionId::read(reader)?),
            11 => Self::Chain(u64::read(reader)?),
            12 => Self::ChainHash(Digest::read(reader)?),
            13 => Self::ChainPrefix(read_string(reader, MAX_NAME_LENGTH)?),
            14 => Self::Sequence(TransactionId::read(reader)?),
            15 => Self::History(AccountId::read(reader)?),

            20 => Self::Game(read_string(reader, MAX_SECRET_LENGTH)?),
            21 => Self::GameDetail(TransactionId::read(reader)?),
            22 => Self::RewardDetail(TransactionId::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Counters => 0,

                Self::Coin(_) => CoinId::SIZE,
                Self::CoinName(name) => string_encode_size(name),
                Self::Holder(_) => HolderId::SIZE,
                Self::Account(_) => AccountId::SIZE,
                Self::User(_) => UserId::SIZE,

                Self::Transaction(_) => TransactionId::SIZE,
                Self::Chain(_) => u64::SIZE,
                Self::ChainHash(_) => Digest::SIZE,
                Self::ChainPrefix(prefix) => string_encode_size(prefix),
                Self::Sequence(_) => TransactionId::SIZE,
                Self::History(_) => AccountId::SIZE,

                Self::Game(game_id) => string_encode_size(game_id),
                Self::GameDetail(_) => TransactionId::SIZE,
                Self::RewardDetail(_) => TransactionId::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Value {
    Counters(Counters),

    // Registry values (tags 1-5)
    Coin(Coin),
    CoinRef(CoinId),
    Holder(Holder),
    Account(Account),
    User(User),

    // Ledger values (tags 10-14)
    Transaction(TransactionRecord),
    Chain(ChainEntry),
    Sequence(u64),
    Sequences(Vec<u64>),
    Transactions(Vec<TransactionId>),

    // Detail values (tags 20-22)
    Game(GameInstance),
    GameDetail(GameDetail),
    RewardDetail(RewardDetail),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Counters(counters) => {
                0u8.write(writer);
                counters.write(writer);
            }

            // Registry values (tags 1-5)
            Self::Coin(coin) => {
                1u8.write(writer);
                coin.write(writer);
            }
            Self::CoinRef(id) => {
                2u8.write(writer);
                id.write(writer);
            }
            Self::Holder(holder) => {
                3u8.write(writer);
                holder.write(writer);
            }
            Self::Account(account) => {
                4u8.write(writer);
                account.write(writer);
            }
            Self::User(user) => {
                5u8.write(writer);
                user.write(writer);
            }

            // Ledger values (tags 10-14)
            Self::Transaction(record) => {
                10u8.write(writer);
                record.write(writer);
            }
            Self::Chain(entry) => {
                11u8.write(writer);
                entry.write(writer);
            }
            Self::Sequence(sequence) => {
                12u8.write(writer);
                sequence.write(writer);
            }
            Self::Sequences(sequences) => {
                13u8.write(writer);
                sequences.write(writer);
            }
            Self::Transactions(ids) => {
                14u8.write(writer);
                ids.write(writer);
            }

            // Detail values (tags 20-22)
            Self::Game(instance) => {
                20u8.write(writer);
                instance.write(writer);
            }
            Self::GameDetail(detail) => {
                21u8.write(writer);
                detail.write(writer);
            }
            Self::RewardDetail(detail) => {
                22u8.write(writer);
                detail.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Counters(Counters::read(reader)?),

            1 => Self::Coin(Coin::read(reader)?),
            2 => Self::CoinRef(CoinId::read(reader)?),
            3 => Self::Holder(Holder::read(reader)?),
            4 => Self::Account(Account::read(reader)?),
            5 => Self::User(User::read(reader)?),

            10 => Self::Transaction(TransactionRecord::read(reader)?),
            11 => Self::Chain(ChainEntry::read(reader)?),
            12 => Self::Sequence(u64::read(reader)?),
            13 => Self::Sequences(Vec::<u64>::read_range(reader, 0..=MAX_INDEX_ENTRIES)?),
            14 => Self::Transactions(Vec::<TransactionId>::read_range(
                reader,
                0..=MAX_INDEX_ENTRIES,
            )?),

            20 => Self::Game(GameInstance::read(reader)?),
            21 => Self::GameDetail(GameDetail::read(reader)?),
            22 => Self::RewardDetail(RewardDetail::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Counters(counters) => counters.encode_size(),

                Self::Coin(coin) => coin.encode_size(),
                Self::CoinRef(id) => id.encode_size(),
                Self::Holder(holder) => holder.encode_size(),
                Self::Account(account) => account.encode_size(),
                Self::User(user) => user.encode_size(),

                Self::Transaction(record) => record.encode_size(),
                Self::Chain(entry) => entry.encode_size(),
                Self::Sequence(sequence) => sequence.encode_size(),
                Self::Sequences(sequences) => sequences.encode_size(),
                Self::Transactions(ids) => ids.encode_size(),

                Self::Game(instance) => instance.encode_size(),
                Self::GameDetail(detail) => detail.encode_size(),
                Self::RewardDetail(detail) => detail.encode_size(),
            }
    }
}
