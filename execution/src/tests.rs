use crate::{
    fair::{game_hash, replay_outcome},
    mocks::{create_engine, create_engine_with_config, create_funded_holder},
    Config, Engine, Error, Layer, Memory, State,
};
use commonware_cryptography::{Hasher, Sha256};
use commonware_macros::test_traced;
use commonware_runtime::{
    deterministic::{Context, Runner},
    Runner as _,
};
use gamba_types::{
    api::{Detail, TransactionView},
    execution::{Key, Value},
    ledger::{
        digest_hex, AccountId, CoinId, CoinSide, GameDetail, HolderId, TransactionKind, UserId,
        DEFAULT_COIN, SYSTEM_ACCOUNT,
    },
};

async fn assert_audit(engine: &Engine<Context, Memory>, holders: &[HolderId]) {
    assert_eq!(engine.total_supply(DEFAULT_COIN).await, Ok(0));
    for holder in holders {
        for account in engine.accounts_of_holder(*holder).await.unwrap() {
            assert!(account.balance(DEFAULT_COIN) >= 0);
        }
    }
    let report = engine.verify_chain().await.unwrap();
    assert!(report.head.is_some());
    assert!(engine.audit_balances(DEFAULT_COIN).await.unwrap() > 1);
}

#[test_traced]
fn test_invalid_config_rejected() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let config = Config {
            coins: Vec::new(),
            ..Config::default()
        };
        let result = Engine::new(context, Memory::default(), config).await;
        assert!(matches!(result, Err(Error::Config(_))));
    });
}

#[test_traced]
fn test_register_user_flow() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let user = engine.register_user(UserId(1234)).await.unwrap();
        assert_eq!(
            engine.register_user(UserId(1234)).await,
            Err(Error::UserExists(UserId(1234)))
        );
        assert_eq!(engine.user(UserId(1234)).await, Ok(user.clone()));

        let balances = engine.get_holder_balances(user.holder).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].coin.id, DEFAULT_COIN);
        assert_eq!(balances[0].amount, 1_000);

        let history = engine
            .get_holder_transactions(user.holder, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason, "Account creation user:1234");
        assert_audit(&engine, &[user.holder]).await;
    });
}

#[test_traced]
fn test_pay_requires_ownership() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (alice, alice_accounts) = create_funded_holder(&engine, &[100]).await;
        let (bob, bob_accounts) = create_funded_holder(&engine, &[0]).await;

        assert_eq!(
            engine
                .pay(bob, alice_accounts[0], bob_accounts[0], DEFAULT_COIN, 10)
                .await,
            Err(Error::NotOwner {
                holder: bob,
                account: alice_accounts[0]
            })
        );
        assert_eq!(
            engine
                .pay(alice, alice_accounts[0], bob_accounts[0], DEFAULT_COIN, 101)
                .await,
            Err(Error::InsufficientBalance {
                available: 100,
                required: 101
            })
        );

        let view = engine
            .pay(alice, alice_accounts[0], bob_accounts[0], DEFAULT_COIN, 40)
            .await
            .unwrap();
        assert_eq!(view.amount, 40);
        assert_eq!(view.kind, TransactionKind::None);
        assert_eq!(view.reason, "No reason provided - transaction");
        assert_eq!(engine.balance_of(bob_accounts[0], DEFAULT_COIN).await, Ok(40));
        assert_eq!(engine.holder_of_account(bob_accounts[0]).await, Ok(bob));
        assert_audit(&engine, &[alice, bob]).await;
    });
}

#[test_traced]
fn test_holder_pay_consolidates() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, accounts) = create_funded_holder(&engine, &[30, 45]).await;
        let (payee, payee_accounts) = create_funded_holder(&engine, &[0]).await;

        let views = engine
            .holder_pay(holder, payee_accounts[0], DEFAULT_COIN, 60)
            .await
            .unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].kind, TransactionKind::Consolidation);
        assert_eq!((views[0].src, views[0].dst), (accounts[1], accounts[0]));
        assert_eq!(views[0].amount, 30);
        assert_eq!((views[1].src, views[1].dst), (accounts[0], payee_accounts[0]));
        assert_eq!(views[1].amount, 60);
        assert_eq!(views[1].sequence, views[0].sequence + 1);

        assert_eq!(engine.balance_of(accounts[0], DEFAULT_COIN).await, Ok(0));
        assert_eq!(engine.balance_of(accounts[1], DEFAULT_COIN).await, Ok(15));
        assert_eq!(engine.combined_balance(holder, DEFAULT_COIN).await, Ok(15));
        assert_audit(&engine, &[holder, payee]).await;
    });
}

#[test_traced]
fn test_holder_pay_insufficient_changes_nothing() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, accounts) = create_funded_holder(&engine, &[10, 20]).await;
        let before = engine.verify_chain().await.unwrap();

        let result = engine
            .holder_pay(holder, SYSTEM_ACCOUNT, DEFAULT_COIN, 31)
            .await;
        assert_eq!(
            result,
            Err(Error::InsufficientBalance {
                available: 30,
                required: 31
            })
        );
        assert_eq!(engine.verify_chain().await.unwrap(), before);
        assert_eq!(engine.balance_of(accounts[0], DEFAULT_COIN).await, Ok(10));
        assert_eq!(engine.balance_of(accounts[1], DEFAULT_COIN).await, Ok(20));
    });
}

#[test_traced]
fn test_reward_view() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, accounts) = create_funded_holder(&engine, &[0]).await;
        let view = engine
            .reward(accounts[0], DEFAULT_COIN, 75, "referral")
            .await
            .unwrap();
        assert_eq!(view.kind, TransactionKind::Reward);
        assert_eq!(view.reason, "Reward payout");
        let Some(Detail::Reward(detail)) = &view.detail else {
            panic!("expected reward detail");
        };
        assert_eq!(detail.reason, "referral");
        assert_eq!(detail.transaction, view.id);
        assert_eq!(
            view.inner_hash,
            Some(digest_hex(&Sha256::hash(
                &gamba_types::ledger::RewardDetail::payload("referral")
            )))
        );
        assert_eq!(
            engine.reward(accounts[0], CoinId(5), 1, "none").await,
            Err(Error::UnknownCoin(CoinId(5)))
        );
        assert_audit(&engine, &[holder]).await;
    });
}

#[test_traced]
fn test_get_transaction_forms() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, accounts) = create_funded_holder(&engine, &[100, 0]).await;
        let view = engine
            .pay(holder, accounts[0], accounts[1], DEFAULT_COIN, 25)
            .await
            .unwrap();

        let by_id = engine.get_transaction(&view.id.to_string()).await.unwrap();
        assert_eq!(by_id, view);
        let by_hash = engine.get_transaction(&view.chain_hash).await.unwrap();
        assert_eq!(by_hash, view);
        let by_prefix = engine.get_transaction(&view.chain_hash[..12]).await.unwrap();
        assert_eq!(by_prefix, view);

        assert_eq!(
            engine.get_transaction("abcd").await,
            Err(Error::PrefixTooShort { min: 6 })
        );
        assert_eq!(engine.get_transaction("4242").await, Err(Error::NotFound));
    });
}

#[test_traced]
fn test_transaction_listings() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, accounts) = create_funded_holder(&engine, &[50, 50]).await;
        for amount in 1..=4 {
            engine
                .pay(holder, accounts[0], accounts[1], DEFAULT_COIN, amount)
                .await
                .unwrap();
        }

        // Moves between the holder's own accounts appear once
        let history = engine.get_holder_transactions(holder, 100).await.unwrap();
        let ids: Vec<u64> = history.iter().map(|view| view.id.get()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        assert_eq!(ids, sorted);
        assert_eq!(
            engine.get_holder_transactions(holder, 2).await.unwrap().len(),
            2
        );

        let page = engine
            .account_transactions(accounts[1], 2, 1)
            .await
            .unwrap();
        let amounts: Vec<u64> = page.iter().map(|view| view.amount).collect();
        assert_eq!(amounts, vec![3, 2]);
        assert_eq!(
            engine.account_transactions(AccountId(999), 1, 0).await,
            Err(Error::UnknownAccount(AccountId(999)))
        );
    });
}

#[test_traced]
fn test_play_game_is_reproducible() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, _) = create_funded_holder(&engine, &[500]).await;

        let commitment = engine.init_game().await.unwrap();
        assert_eq!(commitment.game_id.len(), 2 * engine.config().secret_bytes);
        let outcome = engine
            .play_game(
                &commitment.game_id,
                holder,
                Some("player-secret".to_string()),
                100,
                DEFAULT_COIN,
                CoinSide::Heads,
            )
            .await
            .unwrap();
        assert_eq!(outcome.client_secret, "player-secret");
        assert_eq!(outcome.net_delta, if outcome.win { 100 } else { -100 });
        assert_eq!(outcome.transaction.kind, TransactionKind::Game);

        // Everything needed to audit the game is revealed after play
        let Some(Detail::Game(detail)) = &outcome.transaction.detail else {
            panic!("expected game detail");
        };
        assert_eq!(detail.game_id, commitment.game_id);
        assert_eq!(
            digest_hex(&game_hash(&detail.game_id, &detail.server_secret)),
            commitment.game_hash
        );
        assert_eq!(
            replay_outcome(&detail.server_secret, &detail.client_secret, CoinSide::Heads),
            (outcome.side, outcome.win)
        );
        assert_eq!(
            outcome.transaction.inner_hash,
            Some(digest_hex(&Sha256::hash(&GameDetail::payload(
                &detail.server_secret,
                &detail.client_secret,
                outcome.win
            ))))
        );
        assert_eq!(
            engine.combined_balance(holder, DEFAULT_COIN).await,
            Ok(500 + outcome.net_delta)
        );
        assert_audit(&engine, &[holder]).await;
    });
}

#[test_traced]
fn test_play_game_generates_client_secret() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, _) = create_funded_holder(&engine, &[500]).await;
        let commitment = engine.init_game().await.unwrap();
        let outcome = engine
            .play_game(&commitment.game_id, holder, None, 10, DEFAULT_COIN, CoinSide::Tails)
            .await
            .unwrap();
        assert_eq!(
            outcome.client_secret.len(),
            2 * engine.config().secret_bytes
        );
        let Some(Detail::Game(detail)) = &outcome.transaction.detail else {
            panic!("expected game detail");
        };
        assert_eq!(detail.client_secret, outcome.client_secret);
    });
}

#[test_traced]
fn test_concurrent_plays_settle_once() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, _) = create_funded_holder(&engine, &[1_000]).await;
        let commitment = engine.init_game().await.unwrap();
        let before = engine.verify_chain().await.unwrap().verified;

        let (first, second) = futures::join!(
            engine.play_game(
                &commitment.game_id,
                holder,
                Some("a".to_string()),
                50,
                DEFAULT_COIN,
                CoinSide::Heads,
            ),
            engine.play_game(
                &commitment.game_id,
                holder,
                Some("b".to_string()),
                50,
                DEFAULT_COIN,
                CoinSide::Tails,
            )
        );
        let results = [first, second];
        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|result| matches!(result, Err(Error::GameAlreadyUsed))));

        // Exactly one settlement reached the ledger
        assert_eq!(engine.verify_chain().await.unwrap().verified, before + 1);
        assert_audit(&engine, &[holder]).await;
    });
}

#[test_traced]
fn test_insufficient_play_consumes_game() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, accounts) = create_funded_holder(&engine, &[20, 30]).await;
        let commitment = engine.init_game().await.unwrap();
        let before = engine.verify_chain().await.unwrap();

        let result = engine
            .play_game(&commitment.game_id, holder, None, 51, DEFAULT_COIN, CoinSide::Heads)
            .await;
        assert_eq!(
            result,
            Err(Error::InsufficientBalance {
                available: 50,
                required: 51
            })
        );
        assert_eq!(engine.verify_chain().await.unwrap(), before);
        assert_eq!(engine.balance_of(accounts[0], DEFAULT_COIN).await, Ok(20));

        // The game stays consumed
        assert_eq!(
            engine
                .play_game(&commitment.game_id, holder, None, 5, DEFAULT_COIN, CoinSide::Heads)
                .await,
            Err(Error::GameAlreadyUsed)
        );
    });
}

#[test_traced]
fn test_failed_play_rolls_back_consumption() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, _) = create_funded_holder(&engine, &[100]).await;
        let commitment = engine.init_game().await.unwrap();

        // Rejected after the game was consumed inside the write layer
        let oversized = "f".repeat(gamba_types::ledger::MAX_SECRET_LENGTH + 1);
        let result = engine
            .play_game(
                &commitment.game_id,
                holder,
                Some(oversized),
                10,
                DEFAULT_COIN,
                CoinSide::Heads,
            )
            .await;
        assert!(matches!(result, Err(Error::TooLong { .. })));

        // Input errors caught before consumption
        assert_eq!(
            engine
                .play_game(&commitment.game_id, holder, None, 0, DEFAULT_COIN, CoinSide::Heads)
                .await,
            Err(Error::InvalidAmount)
        );
        assert_eq!(
            engine
                .play_game(
                    &commitment.game_id,
                    HolderId(999),
                    None,
                    1,
                    DEFAULT_COIN,
                    CoinSide::Heads
                )
                .await,
            Err(Error::UnknownHolder(HolderId(999)))
        );
        assert_eq!(
            engine
                .play_game("missing", holder, None, 1, DEFAULT_COIN, CoinSide::Heads)
                .await,
            Err(Error::GameNotFound)
        );

        // Still playable
        assert!(engine
            .play_game(&commitment.game_id, holder, None, 10, DEFAULT_COIN, CoinSide::Heads)
            .await
            .is_ok());
    });
}

#[test_traced]
fn test_dropped_operation_leaves_state_untouched() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let (holder, accounts) = create_funded_holder(&engine, &[100]).await;
        let commitment = engine.init_game().await.unwrap();
        let before = engine.verify_chain().await.unwrap();

        // Never polled
        drop(engine.play_game(
            &commitment.game_id,
            holder,
            None,
            10,
            DEFAULT_COIN,
            CoinSide::Heads,
        ));
        drop(engine.pay(holder, accounts[0], SYSTEM_ACCOUNT, DEFAULT_COIN, 10));

        assert_eq!(engine.verify_chain().await.unwrap(), before);
        assert_eq!(engine.balance_of(accounts[0], DEFAULT_COIN).await, Ok(100));
        assert!(engine
            .play_game(&commitment.game_id, holder, None, 10, DEFAULT_COIN, CoinSide::Heads)
            .await
            .is_ok());
    });
}

#[test_traced]
fn test_random_workload_conserves_value() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let config = Config {
            initial_stake: 200,
            ..Config::default()
        };
        let engine = create_engine_with_config(context, config).await;
        let mut holders = Vec::new();
        let mut accounts = Vec::new();
        for i in 0..4u64 {
            let user = engine.register_user(UserId(i)).await.unwrap();
            let extra = engine.create_account(user.holder).await.unwrap();
            holders.push(user.holder);
            accounts.push(extra.id);
        }

        let mut views: Vec<TransactionView> = Vec::new();
        for round in 0..40u64 {
            let holder = holders[(round % 4) as usize];
            let dst = accounts[((round + 1) % 4) as usize];
            let amount = 1 + (round * 37) % 150;
            match round % 3 {
                0 => {
                    if let Ok(mut paid) = engine.holder_pay(holder, dst, DEFAULT_COIN, amount).await
                    {
                        views.append(&mut paid);
                    }
                }
                1 => {
                    let commitment = engine.init_game().await.unwrap();
                    let choice = if round % 2 == 0 {
                        CoinSide::Heads
                    } else {
                        CoinSide::Tails
                    };
                    if let Ok(outcome) = engine
                        .play_game(&commitment.game_id, holder, None, amount, DEFAULT_COIN, choice)
                        .await
                    {
                        views.push(outcome.transaction);
                    }
                }
                _ => {
                    views.push(
                        engine
                            .reward(dst, DEFAULT_COIN, amount, "workload")
                            .await
                            .unwrap(),
                    );
                }
            }
        }

        // Every returned view still resolves to itself
        for view in views.iter().rev().take(10) {
            assert_eq!(&engine.get_transaction(&view.chain_hash).await.unwrap(), view);
        }
        assert_audit(&engine, &holders).await;
    });
}

#[test_traced]
fn test_holder_without_accounts_is_rejected() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let engine = create_engine(context).await;
        let holder = engine.create_holder().await.unwrap();
        let commitment = engine.init_game().await.unwrap();

        assert_eq!(
            engine.accounts_of_holder(holder).await,
            Err(Error::UnknownHolder(holder))
        );
        assert_eq!(
            engine.combined_balance(holder, DEFAULT_COIN).await,
            Err(Error::UnknownHolder(holder))
        );
        assert_eq!(
            engine.get_holder_balances(holder).await,
            Err(Error::UnknownHolder(holder))
        );
        assert_eq!(
            engine
                .play_game(&commitment.game_id, holder, None, 1, DEFAULT_COIN, CoinSide::Heads)
                .await,
            Err(Error::UnknownHolder(holder))
        );

        // Rejected before consumption
        let (funded, _) = create_funded_holder(&engine, &[100]).await;
        assert!(engine
            .play_game(&commitment.game_id, funded, None, 1, DEFAULT_COIN, CoinSide::Heads)
            .await
            .is_ok());

        // The first account makes the holder usable
        let account = engine.create_account(holder).await.unwrap();
        assert_eq!(engine.accounts_of_holder(holder).await, Ok(vec![account]));
    });
}

#[test_traced]
fn test_audit_balances_detects_edited_balance() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let config = Config::default();
        let mut state = Memory::default();
        let mut layer = Layer::new(&state, &config, 0);
        layer.genesis().await.unwrap();
        let user = layer.register_user(UserId(7)).await.unwrap();
        let account = layer.primary_account(user.holder).await.unwrap();
        let changes = layer.commit();
        state.apply(changes).await;

        // Credit the account outside the ledger
        let mut edited = account.clone();
        edited.balances.insert(DEFAULT_COIN, account.balance(DEFAULT_COIN) + 5);
        state
            .insert(Key::Account(account.id), Value::Account(edited))
            .await;

        let engine = Engine::new(context, state, config).await.unwrap();
        assert!(engine.verify_chain().await.is_ok());
        assert!(matches!(
            engine.audit_balances(DEFAULT_COIN).await,
            Err(Error::IntegrityViolation(_))
        ));
        assert_eq!(engine.total_supply(DEFAULT_COIN).await, Ok(5));
    });
}
