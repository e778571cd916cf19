use commonware_cryptography::sha256::Digest;
use gamba_types::{
    execution::{Counters, Key, Value},
    ledger::{
        Account, AccountId, Coin, CoinId, Holder, HolderId, TransactionKind, TransactionRecord,
    },
};
use std::collections::BTreeMap;
use tracing::{debug, error};

use crate::{
    state::{State, Status},
    Config, Error,
};

mod handlers;

pub use handlers::Settlement;

/// Pending changes captured by [Layer::savepoint].
pub struct Savepoint {
    pending: BTreeMap<Key, Status>,
}

/// Write layer over committed state.
///
/// All mutations are buffered in `pending`. Handing [Layer::commit] to
/// [State::apply] commits them; dropping the layer discards them.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    config: &'a Config,
    now: u64,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, config: &'a Config, now: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            config,
            now,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    pub fn savepoint(&self) -> Savepoint {
        Savepoint {
            pending: self.pending.clone(),
        }
    }

    /// Discards everything written since `savepoint` was taken.
    pub fn rollback_to(&mut self, savepoint: Savepoint) {
        self.pending = savepoint.pending;
    }

    async fn counters(&self) -> Counters {
        match self.get(&Key::Counters).await {
            Some(Value::Counters(counters)) => counters,
            _ => Counters::default(),
        }
    }

    fn set_counters(&mut self, counters: Counters) {
        self.insert(Key::Counters, Value::Counters(counters));
    }

    fn store_account(&mut self, account: Account) {
        self.insert(Key::Account(account.id), Value::Account(account));
    }

    fn store_holder(&mut self, holder: Holder) {
        self.insert(Key::Holder(holder.id), Value::Holder(holder));
    }

    fn store_coin(&mut self, coin: Coin) {
        self.insert(
            Key::CoinName(coin.unique_name.clone()),
            Value::CoinRef(coin.id),
        );
        self.insert(Key::Coin(coin.id), Value::Coin(coin));
    }

    /// The only primitive that changes a balance.
    ///
    /// Fails with [Error::IntegrityViolation] if a non-system account would
    /// go negative or a balance would overflow.
    async fn apply_delta(
        &mut self,
        account: AccountId,
        coin: CoinId,
        delta: i64,
    ) -> Result<i64, Error> {
        let mut stored = self.account(account).await?;
        let Some(updated) = stored.apply_delta(coin, delta) else {
            error!(%account, %coin, delta, "balance overflow");
            return Err(Error::IntegrityViolation(format!(
                "balance overflow on account {account}"
            )));
        };
        if updated < 0 && !stored.is_system() {
            error!(%account, %coin, delta, updated, "negative balance rejected");
            return Err(Error::IntegrityViolation(format!(
                "account {account} would hold {updated} of coin {coin}"
            )));
        }
        debug!(%account, %coin, delta, updated, "applied delta");
        self.store_account(stored);
        Ok(updated)
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Option<Value> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn delete(&mut self, key: &Key) {
        self.pending.insert(key.clone(), Status::Delete);
    }
}
