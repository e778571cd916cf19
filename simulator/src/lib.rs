//! Random workload driver for the ledger engine.
//!
//! [run] registers users, replays a random mix of payments, games and rewards
//! against an [Engine], then audits the hash chain and the conservation of
//! every coin.

use commonware_runtime::Clock;
use gamba_execution::{Config, Engine, Error, State};
use gamba_types::ledger::{AccountId, CoinId, CoinSide, HolderId, UserId};
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

fn default_users() -> u64 {
    8
}

fn default_accounts_per_user() -> u64 {
    2
}

fn default_rounds() -> u64 {
    256
}

fn default_max_amount() -> u64 {
    400
}

/// Shape of the generated traffic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    #[serde(default = "default_users")]
    pub users: u64,
    /// Accounts per user, including the one opened at registration.
    #[serde(default = "default_accounts_per_user")]
    pub accounts_per_user: u64,
    #[serde(default = "default_rounds")]
    pub rounds: u64,
    #[serde(default = "default_max_amount")]
    pub max_amount: u64,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            users: default_users(),
            accounts_per_user: default_accounts_per_user(),
            rounds: default_rounds(),
            max_amount: default_max_amount(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of the simulator config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub ledger: Config,
    #[serde(default)]
    pub workload: Workload,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ledger: Config::default(),
            workload: Workload::default(),
            log_level: default_log_level(),
        }
    }
}

/// Counts gathered during a run plus the final audit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub users: u64,
    pub payments: u64,
    pub consolidations: u64,
    pub games: u64,
    pub wins: u64,
    pub rewards: u64,
    /// Operations refused for lack of funds.
    pub rejected: u64,
    pub verified: u64,
    /// Accounts whose balance matched a replay of their history.
    pub audited_accounts: u64,
    pub head: Option<String>,
    pub total_supply: i128,
}

struct Participant {
    holder: HolderId,
    accounts: Vec<AccountId>,
}

/// Drives `workload` against a fresh engine over `state` and audits the result.
pub async fn run<E, S>(
    mut context: E,
    state: S,
    config: Config,
    workload: &Workload,
) -> Result<Summary, Error>
where
    E: Clock + RngCore + CryptoRng + Clone,
    S: State,
{
    let coin = config.stake_coin;
    let engine = Engine::new(context.clone(), state, config).await?;
    let mut summary = Summary::default();

    // Register participants
    let mut participants = Vec::new();
    for id in 0..workload.users {
        let user = engine.register_user(UserId(id)).await?;
        for _ in 1..workload.accounts_per_user.max(1) {
            engine.create_account(user.holder).await?;
        }
        let accounts = engine
            .accounts_of_holder(user.holder)
            .await?
            .into_iter()
            .map(|account| account.id)
            .collect();
        participants.push(Participant {
            holder: user.holder,
            accounts,
        });
        summary.users += 1;
    }
    if participants.is_empty() {
        return audit(&engine, coin, summary).await;
    }

    for round in 0..workload.rounds {
        let payer = &participants[context.gen_range(0..participants.len())];
        let payee = &participants[context.gen_range(0..participants.len())];
        let dst = payee.accounts[context.gen_range(0..payee.accounts.len())];
        let amount = context.gen_range(1..=workload.max_amount.max(1));
        let result = match context.gen_range(0..3u8) {
            0 => engine
                .holder_pay(payer.holder, dst, coin, amount)
                .await
                .map(|views| {
                    summary.payments += 1;
                    summary.consolidations += views.len() as u64 - 1;
                }),
            1 => {
                let commitment = engine.init_game().await?;
                let choice = CoinSide::from_bit(context.gen_range(0..2u8));
                engine
                    .play_game(&commitment.game_id, payer.holder, None, amount, coin, choice)
                    .await
                    .map(|outcome| {
                        summary.games += 1;
                        if outcome.win {
                            summary.wins += 1;
                        }
                    })
            }
            _ => engine
                .reward(dst, coin, amount, "simulated reward")
                .await
                .map(|_| summary.rewards += 1),
        };
        match result {
            Ok(()) => {}
            Err(Error::InsufficientBalance {
                available,
                required,
            }) => {
                debug!(round, holder = %payer.holder, available, required, "rejected");
                summary.rejected += 1;
            }
            Err(err) => return Err(err),
        }
    }
    audit(&engine, coin, summary).await
}

async fn audit<E, S>(
    engine: &Engine<E, S>,
    coin: CoinId,
    mut summary: Summary,
) -> Result<Summary, Error>
where
    E: Clock + RngCore + CryptoRng,
    S: State,
{
    let report = engine.verify_chain().await?;
    summary.verified = report.verified;
    summary.head = report.head;
    summary.audited_accounts = engine.audit_balances(coin).await?;
    summary.total_supply = engine.total_supply(coin).await?;
    if summary.total_supply != 0 {
        return Err(Error::IntegrityViolation(format!(
            "total supply of {coin} is {}",
            summary.total_supply
        )));
    }
    info!(
        verified = summary.verified,
        games = summary.games,
        rejected = summary.rejected,
        "audit passed"
    );
    Ok(summary)
}
