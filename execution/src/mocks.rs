use commonware_runtime::Clock;
use gamba_types::ledger::{AccountId, CoinId, HolderId, DEFAULT_COIN, SYSTEM_ACCOUNT};
use rand::{CryptoRng, RngCore};
use std::cmp::Ordering;

use crate::{Config, Engine, Memory};

/// Reason recorded on rewards used to seed test balances
pub const FUNDING_REASON: &str = "test funding";

/// Creates an engine over empty in-memory state with the default config
pub async fn create_engine<E: Clock + RngCore + CryptoRng>(context: E) -> Engine<E, Memory> {
    create_engine_with_config(context, Config::default()).await
}

pub async fn create_engine_with_config<E: Clock + RngCore + CryptoRng>(
    context: E,
    config: Config,
) -> Engine<E, Memory> {
    Engine::new(context, Memory::default(), config)
        .await
        .expect("failed to create engine")
}

/// Creates a holder with one account per entry of `balances`, each holding
/// exactly that amount of [DEFAULT_COIN].
pub async fn create_funded_holder<E: Clock + RngCore + CryptoRng>(
    engine: &Engine<E, Memory>,
    balances: &[u64],
) -> (HolderId, Vec<AccountId>) {
    let holder = engine.create_holder().await.expect("failed to create holder");
    let mut accounts = Vec::with_capacity(balances.len());
    for target in balances {
        let account = engine
            .create_account(holder)
            .await
            .expect("failed to create account");
        set_balance(engine, holder, account.id, DEFAULT_COIN, *target).await;
        accounts.push(account.id);
    }
    (holder, accounts)
}

/// Moves value between `account` and the system account until it holds `target`
pub async fn set_balance<E: Clock + RngCore + CryptoRng>(
    engine: &Engine<E, Memory>,
    holder: HolderId,
    account: AccountId,
    coin: CoinId,
    target: u64,
) {
    let current = engine
        .balance_of(account, coin)
        .await
        .expect("failed to read balance") as u64;
    match current.cmp(&target) {
        Ordering::Less => {
            engine
                .reward(account, coin, target - current, FUNDING_REASON)
                .await
                .expect("failed to fund account");
        }
        Ordering::Greater => {
            engine
                .pay(holder, account, SYSTEM_ACCOUNT, coin, current - target)
                .await
                .expect("failed to drain account");
        }
        Ordering::Equal => {}
    }
}
