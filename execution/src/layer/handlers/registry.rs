use super::super::*;
use gamba_types::{
    api::Balance,
    ledger::{User, UserId, MAX_NAME_LENGTH, SYSTEM_ACCOUNT, SYSTEM_HOLDER},
};
use tracing::info;

impl<'a, S: State> Layer<'a, S> {
    // === Registry Handlers ===

    pub async fn coin(&self, id: CoinId) -> Result<Coin, Error> {
        match self.get(&Key::Coin(id)).await {
            Some(Value::Coin(coin)) => Ok(coin),
            _ => Err(Error::UnknownCoin(id)),
        }
    }

    pub async fn coin_by_name(&self, unique_name: &str) -> Result<Coin, Error> {
        match self.get(&Key::CoinName(unique_name.to_string())).await {
            Some(Value::CoinRef(id)) => self.coin(id).await,
            _ => Err(Error::UnknownCoinName(unique_name.to_string())),
        }
    }

    pub async fn holder(&self, id: HolderId) -> Result<Holder, Error> {
        match self.get(&Key::Holder(id)).await {
            Some(Value::Holder(holder)) => Ok(holder),
            _ => Err(Error::UnknownHolder(id)),
        }
    }

    pub async fn account(&self, id: AccountId) -> Result<Account, Error> {
        match self.get(&Key::Account(id)).await {
            Some(Value::Account(account)) => Ok(account),
            _ => Err(Error::UnknownAccount(id)),
        }
    }

    pub async fn user(&self, id: UserId) -> Result<User, Error> {
        match self.get(&Key::User(id)).await {
            Some(Value::User(user)) => Ok(user),
            _ => Err(Error::UnknownUser(id)),
        }
    }

    /// Accounts of `holder`, ascending by id. A holder without accounts
    /// cannot pay or be paid and resolves as [Error::UnknownHolder].
    pub async fn accounts_of_holder(&self, holder: HolderId) -> Result<Vec<Account>, Error> {
        let holder = self.holder(holder).await?;
        if holder.accounts.is_empty() {
            return Err(Error::UnknownHolder(holder.id));
        }
        let mut accounts = Vec::with_capacity(holder.accounts.len());
        for id in holder.accounts {
            accounts.push(self.account(id).await?);
        }
        Ok(accounts)
    }

    /// Every account ever created, ascending by id.
    pub async fn accounts(&self) -> Result<Vec<Account>, Error> {
        let count = self.counters().await.accounts;
        let mut accounts = Vec::new();
        for id in 0..count {
            accounts.push(self.account(AccountId(id)).await?);
        }
        Ok(accounts)
    }

    pub async fn holder_of_account(&self, account: AccountId) -> Result<HolderId, Error> {
        Ok(self.account(account).await?.holder)
    }

    pub async fn balance_of(&self, account: AccountId, coin: CoinId) -> Result<i64, Error> {
        self.coin(coin).await?;
        Ok(self.account(account).await?.balance(coin))
    }

    pub async fn combined_balance(&self, holder: HolderId, coin: CoinId) -> Result<i64, Error> {
        self.coin(coin).await?;
        let accounts = self.accounts_of_holder(holder).await?;
        Ok(accounts
            .iter()
            .fold(0i64, |total, account| total.saturating_add(account.balance(coin))))
    }

    /// Combined balance of every coin `holder` has held, ordered by coin id.
    pub async fn holder_balances(&self, holder: HolderId) -> Result<Vec<Balance>, Error> {
        let mut totals = BTreeMap::<CoinId, i64>::new();
        for account in self.accounts_of_holder(holder).await? {
            for (coin, amount) in account.balances {
                let total = totals.entry(coin).or_default();
                *total = total.saturating_add(amount);
            }
        }
        let mut balances = Vec::with_capacity(totals.len());
        for (coin, amount) in totals {
            balances.push(Balance {
                coin: self.coin(coin).await?,
                amount,
            });
        }
        Ok(balances)
    }

    /// Whether the system holder and account have been created.
    pub async fn is_initialized(&self) -> bool {
        self.account(SYSTEM_ACCOUNT).await.is_ok()
    }

    /// Creates the system holder, the system account, and the configured coins.
    pub async fn genesis(&mut self) -> Result<(), Error> {
        if self.is_initialized().await {
            return Ok(());
        }
        let holder = self.create_holder().await?;
        let account = self.allocate_account(holder).await?;
        if holder != SYSTEM_HOLDER || account.id != SYSTEM_ACCOUNT {
            return Err(Error::IntegrityViolation(
                "genesis on non-empty state".to_string(),
            ));
        }
        let config = self.config;
        for coin in &config.coins {
            self.register_coin(&coin.unique_name, &coin.display_name)
                .await?;
        }
        info!(coins = config.coins.len(), "genesis complete");
        Ok(())
    }

    pub async fn register_coin(
        &mut self,
        unique_name: &str,
        display_name: &str,
    ) -> Result<Coin, Error> {
        for name in [unique_name, display_name] {
            if name.is_empty() {
                return Err(Error::InvalidName(name.to_string()));
            }
            if name.len() > MAX_NAME_LENGTH {
                return Err(Error::TooLong {
                    field: "coin name",
                    max: MAX_NAME_LENGTH,
                });
            }
        }
        if self.coin_by_name(unique_name).await.is_ok() {
            return Err(Error::CoinExists(unique_name.to_string()));
        }

        let mut counters = self.counters().await;
        let coin = Coin {
            id: CoinId(counters.coins),
            unique_name: unique_name.to_string(),
            display_name: display_name.to_string(),
        };
        counters.coins += 1;
        self.set_counters(counters);
        self.store_coin(coin.clone());
        debug!(coin = %coin.id, unique_name, "registered coin");
        Ok(coin)
    }

    pub async fn create_holder(&mut self) -> Result<HolderId, Error> {
        let mut counters = self.counters().await;
        let id = HolderId(counters.holders);
        counters.holders += 1;
        self.set_counters(counters);
        self.store_holder(Holder::new(id));
        debug!(holder = %id, "created holder");
        Ok(id)
    }

    async fn allocate_account(&mut self, holder: HolderId) -> Result<Account, Error> {
        let mut owner = self.holder(holder).await?;
        let mut counters = self.counters().await;
        let account = Account::new(AccountId(counters.accounts), holder);
        counters.accounts += 1;
        self.set_counters(counters);

        owner.add_account(account.id);
        self.store_holder(owner);
        self.store_account(account.clone());
        Ok(account)
    }

    /// Creates an account for `holder` funded with the configured stake.
    async fn open_account(&mut self, holder: HolderId, reason: &str) -> Result<Account, Error> {
        let account = self.allocate_account(holder).await?;
        let stake = self.config.initial_stake;
        if stake > 0 {
            let coin = self.config.stake_coin;
            self.force_transfer(
                SYSTEM_ACCOUNT,
                account.id,
                coin,
                stake,
                Some(reason),
                TransactionKind::None,
                None,
            )
            .await?;
        }
        debug!(account = %account.id, %holder, stake, "opened account");
        self.account(account.id).await
    }

    pub async fn create_account(&mut self, holder: HolderId) -> Result<Account, Error> {
        self.open_account(holder, &format!("Account creation holder:{holder}"))
            .await
    }

    /// Links `user` to a fresh holder with one funded account.
    pub async fn register_user(&mut self, user: UserId) -> Result<User, Error> {
        if self.user(user).await.is_ok() {
            return Err(Error::UserExists(user));
        }
        let holder = self.create_holder().await?;
        self.open_account(holder, &format!("Account creation user:{user}"))
            .await?;
        let record = User {
            id: user,
            holder,
            created_at: self.now,
        };
        self.insert(Key::User(user), Value::User(record.clone()));
        info!(%user, %holder, "registered user");
        Ok(record)
    }
}
