use commonware_runtime::Clock;
use futures::lock::Mutex;
use gamba_types::{
    api::{Balance, ChainReport, GameCommitment, PlayOutcome, TransactionView},
    ledger::{
        digest_hex, Account, AccountId, Coin, CoinId, CoinSide, HolderId, TransactionKind,
        TransactionRecord, User, UserId, SYSTEM_ACCOUNT,
    },
};
use rand::{CryptoRng, RngCore};
use std::time::UNIX_EPOCH;
use tracing::{error, info, warn};

use crate::{chain, fair::generate_secret, Config, Error, Layer, State};

struct Inner<E, S> {
    context: E,
    state: S,
}

/// Serializes every operation behind one write lock.
///
/// Each operation builds a [Layer] over the committed state and applies its
/// changes only on success. Returning early, or dropping the future before
/// the apply, discards them.
pub struct Engine<E: Clock + RngCore + CryptoRng, S: State> {
    config: Config,
    inner: Mutex<Inner<E, S>>,
}

fn now<E: Clock>(context: &E) -> u64 {
    context
        .current()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

impl<E: Clock + RngCore + CryptoRng, S: State> Engine<E, S> {
    /// Validates `config` and runs genesis if `state` is empty.
    pub async fn new(context: E, mut state: S, config: Config) -> Result<Self, Error> {
        config.validate()?;
        let mut layer = Layer::new(&state, &config, now(&context));
        if !layer.is_initialized().await {
            layer.genesis().await?;
            let changes = layer.commit();
            state.apply(changes).await;
        }
        Ok(Self {
            config,
            inner: Mutex::new(Inner { context, state }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn create_holder(&self) -> Result<HolderId, Error> {
        let mut inner = self.inner.lock().await;
        let Inner { context, state } = &mut *inner;
        let mut layer = Layer::new(&*state, &self.config, now(context));
        let holder = layer.create_holder().await?;
        let changes = layer.commit();
        state.apply(changes).await;
        Ok(holder)
    }

    /// Opens an account for `holder` and grants the configured stake.
    pub async fn create_account(&self, holder: HolderId) -> Result<Account, Error> {
        let mut inner = self.inner.lock().await;
        let Inner { context, state } = &mut *inner;
        let mut layer = Layer::new(&*state, &self.config, now(context));
        let account = layer.create_account(holder).await?;
        let changes = layer.commit();
        state.apply(changes).await;
        Ok(account)
    }

    pub async fn register_user(&self, user: UserId) -> Result<User, Error> {
        let mut inner = self.inner.lock().await;
        let Inner { context, state } = &mut *inner;
        let mut layer = Layer::new(&*state, &self.config, now(context));
        let user = layer.register_user(user).await?;
        let changes = layer.commit();
        state.apply(changes).await;
        Ok(user)
    }

    pub async fn register_coin(
        &self,
        unique_name: &str,
        display_name: &str,
    ) -> Result<Coin, Error> {
        let mut inner = self.inner.lock().await;
        let Inner { context, state } = &mut *inner;
        let mut layer = Layer::new(&*state, &self.config, now(context));
        let coin = layer.register_coin(unique_name, display_name).await?;
        let changes = layer.commit();
        state.apply(changes).await;
        Ok(coin)
    }

    /// Checked payment from an account owned by `holder`.
    pub async fn pay(
        &self,
        holder: HolderId,
        src: AccountId,
        dst: AccountId,
        coin: CoinId,
        amount: u64,
    ) -> Result<TransactionView, Error> {
        let mut inner = self.inner.lock().await;
        let Inner { context, state } = &mut *inner;
        let mut layer = Layer::new(&*state, &self.config, now(context));
        if !layer.holder(holder).await?.owns(src) {
            return Err(Error::NotOwner {
                holder,
                account: src,
            });
        }
        let record = layer
            .transfer(src, dst, coin, amount, None, TransactionKind::None, None)
            .await?;
        let view = layer.view(&record).await?;
        let changes = layer.commit();
        state.apply(changes).await;
        Ok(view)
    }

    /// Pays out of the combined balance of `holder`'s accounts. The payment
    /// is the last returned view.
    pub async fn holder_pay(
        &self,
        holder: HolderId,
        dst: AccountId,
        coin: CoinId,
        amount: u64,
    ) -> Result<Vec<TransactionView>, Error> {
        let mut inner = self.inner.lock().await;
        let Inner { context, state } = &mut *inner;
        let mut layer = Layer::new(&*state, &self.config, now(context));
        let records = layer
            .holder_transfer(holder, dst, coin, amount, None, TransactionKind::None, None)
            .await?;
        let views = Self::views(&layer, &records).await?;
        let changes = layer.commit();
        state.apply(changes).await;
        Ok(views)
    }

    /// Pays a reward from the system account.
    pub async fn reward(
        &self,
        dst: AccountId,
        coin: CoinId,
        amount: u64,
        reason: &str,
    ) -> Result<TransactionView, Error> {
        let mut inner = self.inner.lock().await;
        let Inner { context, state } = &mut *inner;
        let mut layer = Layer::new(&*state, &self.config, now(context));
        let record = layer
            .reward_transfer(SYSTEM_ACCOUNT, dst, coin, amount, reason)
            .await?;
        let view = layer.view(&record).await?;
        let changes = layer.commit();
        state.apply(changes).await;
        Ok(view)
    }

    /// Creates a game and returns its commitment.
    pub async fn init_game(&self) -> Result<GameCommitment, Error> {
        let mut inner = self.inner.lock().await;
        let Inner { context, state } = &mut *inner;
        let game_id = generate_secret(context, self.config.secret_bytes);
        let server_secret = generate_secret(context, self.config.secret_bytes);
        let mut layer = Layer::new(&*state, &self.config, now(context));
        let instance = layer.init_game(game_id, server_secret).await?;
        let changes = layer.commit();
        state.apply(changes).await;
        Ok(GameCommitment::new(instance.game_id, &instance.game_hash))
    }

    /// Plays and settles a game.
    ///
    /// Without a `client_secret` the server generates one, so the outcome no
    /// longer depends on player input. A game consumed by a play that fails
    /// with [Error::InsufficientBalance] stays consumed.
    pub async fn play_game(
        &self,
        game_id: &str,
        holder: HolderId,
        client_secret: Option<String>,
        amount: u64,
        coin: CoinId,
        choice: CoinSide,
    ) -> Result<PlayOutcome, Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let net_delta = i64::try_from(amount).map_err(|_| Error::InvalidAmount)?;
        let mut inner = self.inner.lock().await;
        let Inner { context, state } = &mut *inner;
        let client_secret = match client_secret {
            Some(secret) => secret,
            None => generate_secret(context, self.config.secret_bytes),
        };
        let mut layer = Layer::new(&*state, &self.config, now(context));
        layer.accounts_of_holder(holder).await?;
        layer.coin(coin).await?;

        let instance = layer.consume_game(game_id).await?;
        let consumed = layer.savepoint();
        let settlement = match layer
            .settle_game(&instance, holder, &client_secret, amount, coin, choice)
            .await
        {
            Ok(settlement) => settlement,
            Err(err @ Error::InsufficientBalance { .. }) => {
                // Keep only the used flag
                layer.rollback_to(consumed);
                let changes = layer.commit();
                state.apply(changes).await;
                warn!(%holder, amount, "game consumed without settlement");
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let transaction = layer.view(&settlement.record).await?;
        let changes = layer.commit();
        state.apply(changes).await;

        info!(
            %holder,
            win = settlement.win,
            amount,
            transaction = %settlement.record.id,
            "played game"
        );
        Ok(PlayOutcome {
            win: settlement.win,
            side: settlement.side,
            net_delta: if settlement.win { net_delta } else { -net_delta },
            client_secret,
            transaction,
        })
    }

    /// Resolves a numeric id, a full chain hash, or a unique prefix of one.
    pub async fn get_transaction(&self, query: &str) -> Result<TransactionView, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        let record = layer.lookup(query).await?;
        layer.view(&record).await
    }

    pub async fn user(&self, user: UserId) -> Result<User, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        layer.user(user).await
    }

    pub async fn coin(&self, coin: CoinId) -> Result<Coin, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        layer.coin(coin).await
    }

    pub async fn get_holder_balances(&self, holder: HolderId) -> Result<Vec<Balance>, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        layer.holder_balances(holder).await
    }

    /// Newest `limit` transactions touching any of `holder`'s accounts.
    pub async fn get_holder_transactions(
        &self,
        holder: HolderId,
        limit: usize,
    ) -> Result<Vec<TransactionView>, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        let records = layer.holder_transactions(holder, limit).await?;
        Self::views(&layer, &records).await
    }

    pub async fn account_transactions(
        &self,
        account: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransactionView>, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        let records = layer.account_transactions(account, limit, offset).await?;
        Self::views(&layer, &records).await
    }

    pub async fn accounts_of_holder(&self, holder: HolderId) -> Result<Vec<Account>, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        layer.accounts_of_holder(holder).await
    }

    pub async fn holder_of_account(&self, account: AccountId) -> Result<HolderId, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        layer.holder_of_account(account).await
    }

    pub async fn balance_of(&self, account: AccountId, coin: CoinId) -> Result<i64, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        layer.balance_of(account, coin).await
    }

    pub async fn combined_balance(&self, holder: HolderId, coin: CoinId) -> Result<i64, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        layer.combined_balance(holder, coin).await
    }

    /// Sum of `coin` over every account, system account included. Zero
    /// unless value was created or destroyed outside the ledger.
    pub async fn total_supply(&self, coin: CoinId) -> Result<i128, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        layer.coin(coin).await?;
        Ok(layer
            .accounts()
            .await?
            .iter()
            .map(|account| i128::from(account.balance(coin)))
            .sum())
    }

    /// Replays every account's history and compares it with the stored
    /// balance of `coin`. Returns the number of accounts checked.
    pub async fn audit_balances(&self, coin: CoinId) -> Result<u64, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        layer.coin(coin).await?;
        let accounts = layer.accounts().await?;
        for account in &accounts {
            let replayed = layer.replayed_balance(account.id, coin).await?;
            let stored = i128::from(account.balance(coin));
            if replayed != stored {
                error!(
                    account = %account.id,
                    %coin,
                    %stored,
                    %replayed,
                    "balance diverges from history"
                );
                return Err(Error::IntegrityViolation(format!(
                    "account {} holds {stored} of coin {coin} but its history sums to {replayed}",
                    account.id
                )));
            }
        }
        Ok(accounts.len() as u64)
    }

    /// Recomputes every chain link from the stored records.
    pub async fn verify_chain(&self) -> Result<ChainReport, Error> {
        let inner = self.inner.lock().await;
        let layer = Layer::new(&inner.state, &self.config, now(&inner.context));
        let length = layer.chain_length().await;
        let mut links = Vec::with_capacity(length as usize);
        for sequence in 0..length {
            let entry = layer.chain_entry(sequence).await?;
            let record = layer.transaction(entry.transaction).await?;
            links.push((entry, record));
        }
        let verified = chain::verify_chain(links.iter().map(|(entry, record)| (entry, record)))?;
        Ok(ChainReport {
            verified,
            head: links.last().map(|(entry, _)| digest_hex(&entry.chain_hash)),
        })
    }

    async fn views(
        layer: &Layer<'_, S>,
        records: &[TransactionRecord],
    ) -> Result<Vec<TransactionView>, Error> {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(layer.view(record).await?);
        }
        Ok(views)
    }
}
