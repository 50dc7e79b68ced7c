//! Wallet operations - deposit observation, withdrawal lifecycle
//!
//! Every balance change goes through the deposit ledger: the engine
//! re-derives the security/working split after each mutation and the
//! journal records what happened. Callers get the fresh split back so
//! presentation never recomputes it.

use crate::error::{BusinessError, BusinessResult};
use crate::services::{BalanceSnapshot, OperationResult, ServiceContext};
use advancepay_core::{
    DepositLedger, Event, WalletTransaction, WalletTransactionKind, WalletTransactionStatus,
};
use advancepay_persistence::{
    LedgerRepo, TraderRepo, WalletTransactionRepo, WalletTransactionRow,
};
use anyhow::Context;
use rust_decimal::Decimal;
use tracing::info;

/// Wallet Service - ledger mutations and the withdrawal lifecycle.
pub struct WalletService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WalletService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load a trader's ledger, verifying the trader can hold one.
    async fn load_ledger(&self, trader_id: &str) -> BusinessResult<DepositLedger> {
        let trader = TraderRepo::get_by_id(self.ctx.pool(), trader_id)
            .await
            .map_err(|_| BusinessError::TraderNotFound(trader_id.to_string()))?;

        if !trader.is_active {
            return Err(BusinessError::TraderNotActive(trader_id.to_string()).into());
        }

        let row = LedgerRepo::get_by_trader(self.ctx.pool(), trader_id)
            .await
            .map_err(|_| BusinessError::LedgerNotFound(trader_id.to_string()))?;

        Ok(DepositLedger::try_from(row).map_err(BusinessError::Persistence)?)
    }

    /// Record a deposit observed by the chain watcher.
    ///
    /// The watcher supplies a monotonic total; here we consume the delta
    /// it derived. The deposit arrives already completed.
    pub async fn observe_deposit(
        &self,
        trader_id: &str,
        amount: Decimal,
        tx_hash: Option<&str>,
    ) -> BusinessResult<OperationResult> {
        if amount <= Decimal::ZERO {
            return Err(
                BusinessError::invalid_amount("Deposit must be positive", amount).into(),
            );
        }

        let mut ledger = self.load_ledger(trader_id).await?;
        let allocation = ledger.apply_deposit(amount).map_err(BusinessError::Core)?;

        let tx = WalletTransaction::deposit(trader_id, amount, tx_hash);
        let event_id = self.ctx.next_event_id();
        let event =
            Event::deposit_observed(&event_id, trader_id, amount).with_reference(&tx.id);

        let pool = self.ctx.pool();
        LedgerRepo::update(pool, &ledger)
            .await
            .context("Failed to update ledger")?;
        WalletTransactionRepo::insert(pool, &WalletTransactionRow::from(&tx))
            .await
            .context("Failed to record deposit")?;
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(
            trader_id,
            %amount,
            security_satisfied = allocation.security_satisfied,
            "deposit observed"
        );

        Ok(OperationResult::new(&tx.id, &event_id, amount, allocation))
    }

    /// Raise a withdrawal request.
    ///
    /// Capped at the working balance - the security deposit cannot be
    /// invaded. The request stays pending until the chain transfer
    /// settles.
    pub async fn request_withdrawal(
        &self,
        trader_id: &str,
        amount: Decimal,
        address: &str,
    ) -> BusinessResult<OperationResult> {
        if amount <= Decimal::ZERO {
            return Err(
                BusinessError::invalid_amount("Withdrawal must be positive", amount).into(),
            );
        }
        if address.trim().is_empty() {
            return Err(BusinessError::AddressRequired.into());
        }

        let mut ledger = self.load_ledger(trader_id).await?;
        let allocation = ledger
            .request_withdrawal(amount)
            .map_err(BusinessError::Core)?;

        let tx = WalletTransaction::withdrawal_request(trader_id, amount, address);
        let event_id = self.ctx.next_event_id();
        let event =
            Event::withdrawal_requested(&event_id, trader_id, amount).with_reference(&tx.id);

        let pool = self.ctx.pool();
        LedgerRepo::update(pool, &ledger)
            .await
            .context("Failed to update ledger")?;
        WalletTransactionRepo::insert(pool, &WalletTransactionRow::from(&tx))
            .await
            .context("Failed to record withdrawal request")?;
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(trader_id, %amount, "withdrawal requested");

        Ok(OperationResult::new(&tx.id, &event_id, amount, allocation))
    }

    async fn load_pending_withdrawal(
        &self,
        transaction_id: &str,
    ) -> BusinessResult<WalletTransaction> {
        let row = WalletTransactionRepo::get_by_id(self.ctx.pool(), transaction_id)
            .await
            .map_err(BusinessError::Persistence)?;
        let tx = WalletTransaction::try_from(row).map_err(BusinessError::Persistence)?;

        if tx.kind != WalletTransactionKind::Withdraw {
            return Err(BusinessError::InvalidAmount(format!(
                "Not a withdrawal: {}",
                transaction_id
            ))
            .into());
        }
        Ok(tx)
    }

    /// Settle a pending withdrawal that confirmed on-chain.
    pub async fn complete_withdrawal(
        &self,
        transaction_id: &str,
        tx_hash: &str,
    ) -> BusinessResult<OperationResult> {
        let mut tx = self.load_pending_withdrawal(transaction_id).await?;
        tx.complete(tx_hash).map_err(BusinessError::Core)?;

        let mut ledger = self.load_ledger(&tx.trader_id).await?;
        ledger
            .settle_withdrawal(tx.amount)
            .map_err(BusinessError::Core)?;

        let event_id = self.ctx.next_event_id();
        let event = Event::withdrawal_completed(&event_id, &tx.trader_id, tx.amount)
            .with_reference(&tx.id);

        let pool = self.ctx.pool();
        LedgerRepo::update(pool, &ledger)
            .await
            .context("Failed to update ledger")?;
        WalletTransactionRepo::update_status(
            pool,
            &tx.id,
            WalletTransactionStatus::Completed.as_str(),
            Some(tx_hash),
            tx.completed_at,
        )
        .await
        .context("Failed to update withdrawal")?;
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(trader_id = %tx.trader_id, amount = %tx.amount, "withdrawal completed");

        Ok(OperationResult::new(
            &tx.id,
            &event_id,
            tx.amount,
            ledger.allocation(),
        ))
    }

    /// Cancel a pending withdrawal, refunding the ledger.
    pub async fn cancel_withdrawal(&self, transaction_id: &str) -> BusinessResult<OperationResult> {
        let mut tx = self.load_pending_withdrawal(transaction_id).await?;
        tx.cancel().map_err(BusinessError::Core)?;

        let mut ledger = self.load_ledger(&tx.trader_id).await?;
        let allocation = ledger
            .refund_withdrawal(tx.amount)
            .map_err(BusinessError::Core)?;

        let event_id = self.ctx.next_event_id();
        let event = Event::withdrawal_cancelled(&event_id, &tx.trader_id, tx.amount)
            .with_reference(&tx.id);

        let pool = self.ctx.pool();
        LedgerRepo::update(pool, &ledger)
            .await
            .context("Failed to update ledger")?;
        WalletTransactionRepo::update_status(
            pool,
            &tx.id,
            WalletTransactionStatus::Cancelled.as_str(),
            None,
            tx.completed_at,
        )
        .await
        .context("Failed to update withdrawal")?;
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(trader_id = %tx.trader_id, amount = %tx.amount, "withdrawal cancelled");

        Ok(OperationResult::new(&tx.id, &event_id, tx.amount, allocation))
    }

    /// Current funding snapshot for presentation.
    pub async fn balance(&self, trader_id: &str) -> BusinessResult<BalanceSnapshot> {
        let ledger = self.load_ledger(trader_id).await?;
        Ok(BalanceSnapshot {
            trader_id: ledger.trader_id.clone(),
            total_deposited: ledger.total_deposited,
            required_security: ledger.required_security,
            pending_withdrawal: ledger.pending_withdrawal,
            allocation: ledger.allocation(),
        })
    }

    /// A trader's wallet transactions, newest first.
    pub async fn transactions(&self, trader_id: &str) -> BusinessResult<Vec<WalletTransaction>> {
        let rows = WalletTransactionRepo::get_by_trader(self.ctx.pool(), trader_id)
            .await
            .map_err(BusinessError::Persistence)?;
        let mut txs = Vec::with_capacity(rows.len());
        for row in rows {
            txs.push(WalletTransaction::try_from(row).map_err(BusinessError::Persistence)?);
        }
        Ok(txs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advancepay_core::Trader;
    use advancepay_persistence::{init_database, EventStore};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn context() -> (tempfile::TempDir, ServiceContext) {
        let dir = tempdir().unwrap();
        let pool = init_database("sqlite::memory:").await.unwrap();
        let events = Arc::new(EventStore::new(dir.path()).unwrap());

        TraderRepo::insert(&pool, &Trader::trader("TRD_001", "ivan"))
            .await
            .unwrap();
        let ledger = DepositLedger::new("TRD_001", dec!(500)).unwrap();
        LedgerRepo::insert(&pool, &ledger).await.unwrap();

        (dir, ServiceContext::from_parts(pool, events))
    }

    #[tokio::test]
    async fn test_deposit_fills_security_first() {
        let (_dir, ctx) = context().await;
        let wallet = WalletService::new(&ctx);

        let result = wallet
            .observe_deposit("TRD_001", dec!(300), None)
            .await
            .unwrap();
        assert_eq!(result.allocation.security_deposit, dec!(300));
        assert_eq!(result.allocation.working_balance, dec!(0));
        assert!(!result.allocation.security_satisfied);

        let result = wallet
            .observe_deposit("TRD_001", dec!(1400), Some("0xabc"))
            .await
            .unwrap();
        assert_eq!(result.allocation.security_deposit, dec!(500));
        assert_eq!(result.allocation.working_balance, dec!(1200));
        assert!(result.allocation.security_satisfied);
    }

    #[tokio::test]
    async fn test_withdrawal_roundtrip() {
        let (_dir, ctx) = context().await;
        let wallet = WalletService::new(&ctx);

        wallet
            .observe_deposit("TRD_001", dec!(1700), None)
            .await
            .unwrap();

        let request = wallet
            .request_withdrawal("TRD_001", dec!(200), "TJYxNdv3T1QQHrWYPTQJYNqPJqGJLQxnVZ")
            .await
            .unwrap();
        assert_eq!(request.allocation.working_balance, dec!(1000));

        let snapshot = wallet.balance("TRD_001").await.unwrap();
        assert_eq!(snapshot.pending_withdrawal, dec!(200));
        assert_eq!(snapshot.total_deposited, dec!(1500));

        wallet
            .complete_withdrawal(&request.transaction_id, "0xdeadbeef")
            .await
            .unwrap();
        let snapshot = wallet.balance("TRD_001").await.unwrap();
        assert_eq!(snapshot.pending_withdrawal, dec!(0));

        let txs = wallet.transactions("TRD_001").await.unwrap();
        assert_eq!(txs.len(), 2);
        let withdrawal = txs
            .iter()
            .find(|t| t.kind == WalletTransactionKind::Withdraw)
            .unwrap();
        assert_eq!(withdrawal.status, WalletTransactionStatus::Completed);
        assert_eq!(withdrawal.tx_hash.as_deref(), Some("0xdeadbeef"));
    }

    #[tokio::test]
    async fn test_withdrawal_cannot_invade_security() {
        let (_dir, ctx) = context().await;
        let wallet = WalletService::new(&ctx);

        wallet
            .observe_deposit("TRD_001", dec!(700), None)
            .await
            .unwrap();

        // Working balance is 200; asking for 300 must fail
        let err = wallet
            .request_withdrawal("TRD_001", dec!(300), "T123")
            .await
            .unwrap_err();
        let core_err = err.downcast_ref::<BusinessError>().unwrap();
        assert!(matches!(core_err, BusinessError::Core(e) if e.is_insufficient_funds()));

        // Ledger untouched
        let snapshot = wallet.balance("TRD_001").await.unwrap();
        assert_eq!(snapshot.total_deposited, dec!(700));
        assert_eq!(snapshot.pending_withdrawal, dec!(0));
    }

    #[tokio::test]
    async fn test_cancel_refunds_ledger() {
        let (_dir, ctx) = context().await;
        let wallet = WalletService::new(&ctx);

        wallet
            .observe_deposit("TRD_001", dec!(1000), None)
            .await
            .unwrap();
        let request = wallet
            .request_withdrawal("TRD_001", dec!(400), "T123")
            .await
            .unwrap();

        let result = wallet
            .cancel_withdrawal(&request.transaction_id)
            .await
            .unwrap();
        assert_eq!(result.allocation.working_balance, dec!(500));

        let snapshot = wallet.balance("TRD_001").await.unwrap();
        assert_eq!(snapshot.total_deposited, dec!(1000));
        assert_eq!(snapshot.pending_withdrawal, dec!(0));
    }

    #[tokio::test]
    async fn test_rejects_invalid_inputs() {
        let (_dir, ctx) = context().await;
        let wallet = WalletService::new(&ctx);

        assert!(wallet.observe_deposit("TRD_001", dec!(0), None).await.is_err());
        assert!(wallet.observe_deposit("TRD_001", dec!(-10), None).await.is_err());
        assert!(wallet
            .request_withdrawal("TRD_001", dec!(10), "  ")
            .await
            .is_err());
        assert!(wallet.observe_deposit("TRD_999", dec!(10), None).await.is_err());
    }

    #[tokio::test]
    async fn test_events_journaled() {
        let (dir, ctx) = context().await;
        let wallet = WalletService::new(&ctx);

        wallet
            .observe_deposit("TRD_001", dec!(100), None)
            .await
            .unwrap();

        let reader = advancepay_persistence::EventReader::new(dir.path());
        let events = reader.read_all().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].amount, Some(dec!(100)));
    }
}
