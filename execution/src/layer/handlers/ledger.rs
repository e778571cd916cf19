use super::super::*;
use commonware_codec::DecodeExt;
use commonware_utils::from_hex;
use gamba_types::{
    api::{Detail, TransactionView},
    ledger::{
        digest_hex, ChainEntry, TransactionId, DIGEST_HEX_LENGTH, MAX_REASON_LENGTH,
        MIN_PREFIX_LENGTH,
    },
};

use crate::chain::{next_chain_hash, self_hash, SENTINEL};

impl<'a, S: State> Layer<'a, S> {
    // === Ledger Handlers ===

    /// Appends a record and its chain entry, updating every index.
    ///
    /// Only reachable from inside a layer, so an append always belongs to the
    /// caller's atomic unit.
    #[allow(clippy::too_many_arguments)]
    pub(in crate::layer) async fn append(
        &mut self,
        src: AccountId,
        dst: AccountId,
        coin: CoinId,
        amount: u64,
        kind: TransactionKind,
        reason: &str,
        inner_hash: Option<Digest>,
    ) -> Result<TransactionRecord, Error> {
        if reason.len() > MAX_REASON_LENGTH {
            return Err(Error::TooLong {
                field: "reason",
                max: MAX_REASON_LENGTH,
            });
        }
        let mut counters = self.counters().await;
        let id = TransactionId(counters.transactions + 1);
        let mut record = TransactionRecord {
            id,
            src,
            dst,
            coin,
            amount,
            kind,
            reason: reason.to_string(),
            inner_hash,
            created_at: self.now,
            self_hash: SENTINEL,
        };
        record.self_hash = self_hash(&record);

        // Link to the tail
        let sequence = counters.chain_length;
        let prev = match sequence {
            0 => SENTINEL,
            _ => self.chain_entry(sequence - 1).await?.chain_hash,
        };
        let chain_hash = next_chain_hash(&prev, &record.self_hash);
        let entry = ChainEntry {
            sequence,
            chain_hash,
            transaction: id,
        };

        // Indexes
        let rendered = digest_hex(&chain_hash);
        let bucket = Key::ChainPrefix(rendered[..MIN_PREFIX_LENGTH].to_string());
        let mut sequences = match self.get(&bucket).await {
            Some(Value::Sequences(sequences)) => sequences,
            _ => Vec::new(),
        };
        sequences.push(sequence);
        self.insert(bucket, Value::Sequences(sequences));
        self.insert(Key::ChainHash(chain_hash), Value::Sequence(sequence));
        self.insert(Key::Sequence(id), Value::Sequence(sequence));
        self.push_history(src, id).await;
        if dst != src {
            self.push_history(dst, id).await;
        }

        self.insert(Key::Chain(sequence), Value::Chain(entry));
        self.insert(Key::Transaction(id), Value::Transaction(record.clone()));
        counters.transactions = id.get();
        counters.chain_length = sequence + 1;
        self.set_counters(counters);

        debug!(
            %id,
            sequence,
            %src,
            %dst,
            %coin,
            amount,
            chain_hash = %rendered,
            "appended transaction"
        );
        Ok(record)
    }

    async fn push_history(&mut self, account: AccountId, id: TransactionId) {
        let key = Key::History(account);
        let mut history = match self.get(&key).await {
            Some(Value::Transactions(history)) => history,
            _ => Vec::new(),
        };
        history.push(id);
        self.insert(key, Value::Transactions(history));
    }

    async fn history(&self, account: AccountId) -> Vec<TransactionId> {
        match self.get(&Key::History(account)).await {
            Some(Value::Transactions(history)) => history,
            _ => Vec::new(),
        }
    }

    pub async fn chain_length(&self) -> u64 {
        self.counters().await.chain_length
    }

    pub async fn chain_entry(&self, sequence: u64) -> Result<ChainEntry, Error> {
        match self.get(&Key::Chain(sequence)).await {
            Some(Value::Chain(entry)) => Ok(entry),
            _ => Err(Error::NotFound),
        }
    }

    pub async fn transaction(&self, id: TransactionId) -> Result<TransactionRecord, Error> {
        match self.get(&Key::Transaction(id)).await {
            Some(Value::Transaction(record)) => Ok(record),
            _ => Err(Error::NotFound),
        }
    }

    /// Chain entry recorded for transaction `id`.
    pub async fn entry_of(&self, id: TransactionId) -> Result<ChainEntry, Error> {
        let sequence = match self.get(&Key::Sequence(id)).await {
            Some(Value::Sequence(sequence)) => sequence,
            _ => return Err(Error::NotFound),
        };
        self.chain_entry(sequence).await
    }

    pub async fn by_chain_hash(&self, chain_hash: &Digest) -> Result<TransactionRecord, Error> {
        let sequence = match self.get(&Key::ChainHash(*chain_hash)).await {
            Some(Value::Sequence(sequence)) => sequence,
            _ => return Err(Error::NotFound),
        };
        let entry = self.chain_entry(sequence).await?;
        self.transaction(entry.transaction).await
    }

    /// Every record whose hex chain hash starts with `prefix` (case-insensitive).
    pub async fn by_prefix(&self, prefix: &str) -> Result<Vec<TransactionRecord>, Error> {
        if prefix.len() < MIN_PREFIX_LENGTH {
            return Err(Error::PrefixTooShort {
                min: MIN_PREFIX_LENGTH,
            });
        }
        let prefix = prefix.to_ascii_lowercase();
        let Some(bucket) = prefix.get(..MIN_PREFIX_LENGTH) else {
            return Ok(Vec::new());
        };
        let sequences = match self.get(&Key::ChainPrefix(bucket.to_string())).await {
            Some(Value::Sequences(sequences)) => sequences,
            _ => return Ok(Vec::new()),
        };
        let mut matches = Vec::new();
        for sequence in sequences {
            let entry = self.chain_entry(sequence).await?;
            if digest_hex(&entry.chain_hash).starts_with(&prefix) {
                matches.push(self.transaction(entry.transaction).await?);
            }
        }
        Ok(matches)
    }

    /// Resolves a numeric id, a full chain hash, or a unique chain-hash prefix.
    pub async fn lookup(&self, query: &str) -> Result<TransactionRecord, Error> {
        let query = query.trim();
        if let Ok(id) = query.parse::<u64>() {
            if let Ok(record) = self.transaction(TransactionId(id)).await {
                return Ok(record);
            }
            // Short numeric strings that are not ids cannot be prefixes
            if query.len() < MIN_PREFIX_LENGTH {
                return Err(Error::NotFound);
            }
        }
        if query.len() == DIGEST_HEX_LENGTH {
            let digest = from_hex(query).and_then(|bytes| Digest::decode(bytes.as_ref()).ok());
            if let Some(digest) = digest {
                if let Ok(record) = self.by_chain_hash(&digest).await {
                    return Ok(record);
                }
            }
        }
        let mut matches = self.by_prefix(query).await?;
        match matches.len() {
            0 => Err(Error::NotFound),
            1 => Ok(matches.remove(0)),
            n => Err(Error::AmbiguousLookup {
                prefix: query.to_ascii_lowercase(),
                matches: n,
            }),
        }
    }

    /// Transactions touching `account`, newest first.
    pub async fn account_transactions(
        &self,
        account: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransactionRecord>, Error> {
        self.account(account).await?;
        let mut records = Vec::new();
        let history = self.history(account).await;
        for id in history.into_iter().rev().skip(offset).take(limit) {
            records.push(self.transaction(id).await?);
        }
        Ok(records)
    }

    /// Net effect of `account`'s history on its balance of `coin`.
    pub async fn replayed_balance(&self, account: AccountId, coin: CoinId) -> Result<i128, Error> {
        self.account(account).await?;
        let mut total = 0i128;
        for id in self.history(account).await {
            let record = self.transaction(id).await?;
            if record.coin == coin {
                total += record.delta_for(account);
            }
        }
        Ok(total)
    }

    /// Newest `limit` transactions touching any account of `holder`.
    pub async fn holder_transactions(
        &self,
        holder: HolderId,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, Error> {
        let holder = self.holder(holder).await?;
        if holder.accounts.is_empty() {
            return Err(Error::UnknownHolder(holder.id));
        }
        let mut ids = Vec::new();
        for account in &holder.accounts {
            ids.extend(self.history(*account).await);
        }
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.dedup();

        let mut records = Vec::new();
        for id in ids.into_iter().take(limit) {
            records.push(self.transaction(id).await?);
        }
        Ok(records)
    }

    /// Joins `record` with its chain entry, coin, and detail record.
    pub async fn view(&self, record: &TransactionRecord) -> Result<TransactionView, Error> {
        let entry = self.entry_of(record.id).await?;
        let coin = self.coin(record.coin).await?;
        let detail = match record.kind {
            TransactionKind::Game => match self.get(&Key::GameDetail(record.id)).await {
                Some(Value::GameDetail(detail)) => Some(Detail::Game(detail)),
                _ => None,
            },
            TransactionKind::Reward => match self.get(&Key::RewardDetail(record.id)).await {
                Some(Value::RewardDetail(detail)) => Some(Detail::Reward(detail)),
                _ => None,
            },
            TransactionKind::None | TransactionKind::Consolidation => None,
        };
        Ok(TransactionView::new(record, &entry, coin, detail))
    }
}
