use super::super::*;
use commonware_cryptography::{Hasher, Sha256};
use gamba_types::ledger::{
    RewardDetail, FORCE_TRANSFER_REASON, MAX_REASON_LENGTH, REWARD_PAYOUT_REASON,
    TRANSFER_REASON,
};

impl<'a, S: State> Layer<'a, S> {
    // === Transfer Handlers ===

    /// Checked transfer: fails with [Error::InsufficientBalance] unless `src`
    /// holds at least `amount`.
    #[allow(clippy::too_many_arguments)]
    pub async fn transfer(
        &mut self,
        src: AccountId,
        dst: AccountId,
        coin: CoinId,
        amount: u64,
        reason: Option<&str>,
        kind: TransactionKind,
        inner_hash: Option<Digest>,
    ) -> Result<TransactionRecord, Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let available = self.balance_of(src, coin).await?;
        if i128::from(available) < i128::from(amount) {
            return Err(Error::InsufficientBalance {
                available,
                required: amount,
            });
        }
        self.force_transfer(
            src,
            dst,
            coin,
            amount,
            Some(reason.unwrap_or(TRANSFER_REASON)),
            kind,
            inner_hash,
        )
        .await
    }

    /// Moves `amount` from `src` to `dst` and appends the record.
    ///
    /// Skips the balance pre-check, so it is reserved for system settlements
    /// and moves whose funding the caller already established. The
    /// non-negativity invariant still holds at apply time.
    #[allow(clippy::too_many_arguments)]
    pub async fn force_transfer(
        &mut self,
        src: AccountId,
        dst: AccountId,
        coin: CoinId,
        amount: u64,
        reason: Option<&str>,
        kind: TransactionKind,
        inner_hash: Option<Digest>,
    ) -> Result<TransactionRecord, Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let delta = i64::try_from(amount).map_err(|_| Error::InvalidAmount)?;
        self.coin(coin).await?;
        self.account(dst).await?;
        self.apply_delta(src, coin, -delta).await?;
        self.apply_delta(dst, coin, delta).await?;
        let reason = reason.unwrap_or(FORCE_TRANSFER_REASON);
        self.append(src, dst, coin, amount, kind, reason, inner_hash)
            .await
    }

    /// Pays a reward and links its detail record to the settlement.
    pub async fn reward_transfer(
        &mut self,
        src: AccountId,
        dst: AccountId,
        coin: CoinId,
        amount: u64,
        reward_reason: &str,
    ) -> Result<TransactionRecord, Error> {
        if reward_reason.len() > MAX_REASON_LENGTH {
            return Err(Error::TooLong {
                field: "reward reason",
                max: MAX_REASON_LENGTH,
            });
        }
        let inner_hash = Sha256::hash(&RewardDetail::payload(reward_reason));
        let record = self
            .force_transfer(
                src,
                dst,
                coin,
                amount,
                Some(REWARD_PAYOUT_REASON),
                TransactionKind::Reward,
                Some(inner_hash),
            )
            .await?;
        self.insert(
            Key::RewardDetail(record.id),
            Value::RewardDetail(RewardDetail {
                reason: reward_reason.to_string(),
                transaction: record.id,
            }),
        );
        Ok(record)
    }
}
