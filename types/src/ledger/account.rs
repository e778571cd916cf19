use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, ReadRangeExt, Write};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
};

use super::{
    read_string, string_encode_size, write_string, AccountId, CoinId, HolderId, UserId,
    MAX_NAME_LENGTH, MAX_RECORD_ENTRIES, SYSTEM_ACCOUNT,
};

/// Currency or asset class. Two coins are the same coin iff their ids match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Coin {
    pub id: CoinId,
    pub unique_name: String,
    pub display_name: String,
}

impl PartialEq for Coin {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Coin {}

impl Hash for Coin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Write for Coin {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        write_string(&self.unique_name, writer);
        write_string(&self.display_name, writer);
    }
}

impl Read for Coin {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: CoinId::read(reader)?,
            unique_name: read_string(reader, MAX_NAME_LENGTH)?,
            display_name: read_string(reader, MAX_NAME_LENGTH)?,
        })
    }
}

impl EncodeSize for Coin {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + string_encode_size(&self.unique_name)
            + string_encode_size(&self.display_name)
    }
}

/// Balance container. Balances of every account other than the system account
/// never go below zero.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Account {
    pub id: AccountId,
    pub holder: HolderId,
    pub balances: BTreeMap<CoinId, i64>,
}

impl Account {
    pub fn new(id: AccountId, holder: HolderId) -> Self {
        Self {
            id,
            holder,
            balances: BTreeMap::new(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.id == SYSTEM_ACCOUNT
    }

    /// Balance of `coin`, zero when the account never held it.
    pub fn balance(&self, coin: CoinId) -> i64 {
        self.balances.get(&coin).copied().unwrap_or(0)
    }

    /// Adds `delta` to the balance of `coin` and returns the new balance, or
    /// `None` on overflow (the account is left untouched).
    pub fn apply_delta(&mut self, coin: CoinId, delta: i64) -> Option<i64> {
        let updated = self.balance(coin).checked_add(delta)?;
        self.balances.insert(coin, updated);
        Some(updated)
    }
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.holder.write(writer);
        (self.balances.len() as u32).write(writer);
        for (coin, amount) in &self.balances {
            coin.write(writer);
            amount.write(writer);
        }
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let id = AccountId::read(reader)?;
        let holder = HolderId::read(reader)?;
        let len = u32::read(reader)? as usize;
        if len > MAX_RECORD_ENTRIES {
            return Err(Error::Invalid("Account", "too many balances"));
        }
        let mut balances = BTreeMap::new();
        for _ in 0..len {
            let coin = CoinId::read(reader)?;
            let amount = i64::read(reader)?;
            if balances.insert(coin, amount).is_some() {
                return Err(Error::Invalid("Account", "duplicate coin"));
            }
        }
        Ok(Self {
            id,
            holder,
            balances,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.holder.encode_size()
            + u32::SIZE
            + self.balances.len() * (CoinId::SIZE + i64::SIZE)
    }
}

/// Owner of accounts. `accounts` is kept sorted ascending.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Holder {
    pub id: HolderId,
    pub accounts: Vec<AccountId>,
}

impl Holder {
    pub fn new(id: HolderId) -> Self {
        Self {
            id,
            accounts: Vec::new(),
        }
    }

    pub fn owns(&self, account: AccountId) -> bool {
        self.accounts.binary_search(&account).is_ok()
    }

    pub fn add_account(&mut self, account: AccountId) {
        if let Err(idx) = self.accounts.binary_search(&account) {
            self.accounts.insert(idx, account);
        }
    }
}

impl Write for Holder {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.accounts.write(writer);
    }
}

impl Read for Holder {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: HolderId::read(reader)?,
            accounts: Vec::<AccountId>::read_range(reader, 0..=MAX_RECORD_ENTRIES)?,
        })
    }
}

impl EncodeSize for Holder {
    fn encode_size(&self) -> usize {
        self.id.encode_size() + self.accounts.encode_size()
    }
}

/// Link between an authenticated external identity and its holder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub holder: HolderId,
    pub created_at: u64,
}

impl Write for User {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.holder.write(writer);
        self.created_at.write(writer);
    }
}

impl Read for User {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: UserId::read(reader)?,
            holder: HolderId::read(reader)?,
            created_at: u64::read(reader)?,
        })
    }
}

impl FixedSize for User {
    const SIZE: usize = UserId::SIZE + HolderId::SIZE + u64::SIZE;
}
