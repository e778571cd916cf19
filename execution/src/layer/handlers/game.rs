use super::super::*;
use commonware_cryptography::{Hasher, Sha256};
use gamba_types::ledger::{
    CoinSide, GameDetail, GameInstance, GAME_SETTLEMENT_REASON, MAX_SECRET_LENGTH, SYSTEM_ACCOUNT,
};

use crate::fair::{draw_side, game_hash};

/// Settled outcome of one game.
pub struct Settlement {
    pub side: CoinSide,
    pub win: bool,
    /// Settlement record; consolidation moves (if any) precede it in the ledger.
    pub record: TransactionRecord,
}

fn check_secret(field: &'static str, secret: &str) -> Result<(), Error> {
    if secret.len() > MAX_SECRET_LENGTH {
        return Err(Error::TooLong {
            field,
            max: MAX_SECRET_LENGTH,
        });
    }
    Ok(())
}

impl<'a, S: State> Layer<'a, S> {
    // === Game Handlers ===

    pub async fn game(&self, game_id: &str) -> Result<GameInstance, Error> {
        match self.get(&Key::Game(game_id.to_string())).await {
            Some(Value::Game(instance)) => Ok(instance),
            _ => Err(Error::GameNotFound),
        }
    }

    /// Persists an unused game committed to `H(game_id :: server_secret)`.
    pub async fn init_game(
        &mut self,
        game_id: String,
        server_secret: String,
    ) -> Result<GameInstance, Error> {
        check_secret("game id", &game_id)?;
        check_secret("server secret", &server_secret)?;
        if self.game(&game_id).await.is_ok() {
            return Err(Error::IntegrityViolation(format!(
                "game id {game_id} already exists"
            )));
        }
        let instance = GameInstance {
            game_hash: game_hash(&game_id, &server_secret),
            game_id,
            server_secret,
            is_used: false,
        };
        self.insert(
            Key::Game(instance.game_id.clone()),
            Value::Game(instance.clone()),
        );
        Ok(instance)
    }

    /// Flips `is_used`; a game can be consumed once.
    pub async fn consume_game(&mut self, game_id: &str) -> Result<GameInstance, Error> {
        let mut instance = self.game(game_id).await?;
        if instance.is_used {
            return Err(Error::GameAlreadyUsed);
        }
        instance.is_used = true;
        self.insert(
            Key::Game(instance.game_id.clone()),
            Value::Game(instance.clone()),
        );
        Ok(instance)
    }

    /// Draws the outcome of a consumed game and settles it.
    ///
    /// A win is paid from the system account into the holder's primary
    /// account. A loss is collected from the holder's combined balance.
    pub async fn settle_game(
        &mut self,
        instance: &GameInstance,
        holder: HolderId,
        client_secret: &str,
        amount: u64,
        coin: CoinId,
        choice: CoinSide,
    ) -> Result<Settlement, Error> {
        check_secret("client secret", client_secret)?;
        let available = self.combined_balance(holder, coin).await?;
        if i128::from(available) < i128::from(amount) {
            return Err(Error::InsufficientBalance {
                available,
                required: amount,
            });
        }

        let side = draw_side(&instance.server_secret, client_secret);
        let win = side == choice;
        let inner_hash = Sha256::hash(&GameDetail::payload(
            &instance.server_secret,
            client_secret,
            win,
        ));
        let record = if win {
            let primary = self.primary_account(holder).await?;
            self.force_transfer(
                SYSTEM_ACCOUNT,
                primary.id,
                coin,
                amount,
                Some(GAME_SETTLEMENT_REASON),
                TransactionKind::Game,
                Some(inner_hash),
            )
            .await?
        } else {
            let mut records = self
                .holder_transfer(
                    holder,
                    SYSTEM_ACCOUNT,
                    coin,
                    amount,
                    Some(GAME_SETTLEMENT_REASON),
                    TransactionKind::Game,
                    Some(inner_hash),
                )
                .await?;
            records.pop().ok_or_else(|| {
                Error::IntegrityViolation("loss settled without a payment".to_string())
            })?
        };

        self.insert(
            Key::GameDetail(record.id),
            Value::GameDetail(GameDetail {
                game_id: instance.game_id.clone(),
                server_secret: instance.server_secret.clone(),
                client_secret: client_secret.to_string(),
                user_win: win,
                transaction: record.id,
            }),
        );
        debug!(
            game = %instance.game_id,
            %holder,
            win,
            amount,
            transaction = %record.id,
            "settled game"
        );
        Ok(Settlement { side, win, record })
    }
}
