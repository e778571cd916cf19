use super::super::*;
use gamba_types::ledger::{CONSOLIDATION_REASON, HOLDER_PAYMENT_REASON};

impl<'a, S: State> Layer<'a, S> {
    // === Consolidation Handlers ===

    /// Lowest-id account of `holder`.
    pub async fn primary_account(&self, holder: HolderId) -> Result<Account, Error> {
        self.accounts_of_holder(holder)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::UnknownHolder(holder))
    }

    /// Pays `amount` out of the combined balance of `holder`'s accounts.
    ///
    /// The first account (ascending) that covers `amount` pays directly.
    /// Otherwise the remaining accounts top up the primary account in
    /// ascending order until it covers `amount`, and the primary pays. The
    /// payment is always the last returned record.
    #[allow(clippy::too_many_arguments)]
    pub async fn holder_transfer(
        &mut self,
        holder: HolderId,
        dst: AccountId,
        coin: CoinId,
        amount: u64,
        reason: Option<&str>,
        kind: TransactionKind,
        inner_hash: Option<Digest>,
    ) -> Result<Vec<TransactionRecord>, Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        self.coin(coin).await?;
        let reason = reason.unwrap_or(HOLDER_PAYMENT_REASON);
        let accounts = self.accounts_of_holder(holder).await?;
        let combined: i128 = accounts
            .iter()
            .map(|account| i128::from(account.balance(coin)))
            .sum();
        if combined < i128::from(amount) {
            return Err(Error::InsufficientBalance {
                available: i64::try_from(combined).unwrap_or(i64::MAX),
                required: amount,
            });
        }

        // Single account covers the payment
        if let Some(payer) = accounts
            .iter()
            .find(|account| i128::from(account.balance(coin)) >= i128::from(amount))
        {
            let record = self
                .transfer(payer.id, dst, coin, amount, Some(reason), kind, inner_hash)
                .await?;
            return Ok(vec![record]);
        }

        // Consolidate into the primary account
        let Some((primary, rest)) = accounts.split_first() else {
            return Err(Error::UnknownHolder(holder));
        };
        let mut needed = amount - primary.balance(coin).max(0) as u64;
        let mut records = Vec::new();
        for account in rest {
            if needed == 0 {
                break;
            }
            let available = account.balance(coin);
            if available <= 0 {
                continue;
            }
            let moved = needed.min(available as u64);
            let record = self
                .force_transfer(
                    account.id,
                    primary.id,
                    coin,
                    moved,
                    Some(CONSOLIDATION_REASON),
                    TransactionKind::Consolidation,
                    None,
                )
                .await?;
            records.push(record);
            needed -= moved;
        }
        if needed != 0 {
            error!(%holder, %coin, amount, needed, "consolidation fell short");
            return Err(Error::IntegrityViolation(format!(
                "holder {holder} short by {needed} after consolidation"
            )));
        }
        debug!(
            %holder,
            primary = %primary.id,
            moves = records.len(),
            "consolidated holder balance"
        );

        let payment = self
            .force_transfer(primary.id, dst, coin, amount, Some(reason), kind, inner_hash)
            .await?;
        records.push(payment);
        Ok(records)
    }
}
