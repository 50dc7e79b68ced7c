//! Dispute operations - open, respond, resolve
//!
//! Resolution records the outcome only; ledger funds are never moved by
//! a dispute.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use advancepay_core::{
    Currency, Dispute, DisputeReason, DisputeStatus, Event, Money, TraderRole,
};
use advancepay_persistence::{DisputeRepo, DisputeRow, TraderRepo};
use anyhow::Context;
use rust_decimal::Decimal;
use tracing::info;

/// Default hours a trader has to answer a new dispute.
pub const DEFAULT_DEADLINE_HOURS: i64 = 24;

/// Dispute Service - lifecycle around client claims.
pub struct DisputeService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DisputeService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Open a dispute against a processed payment.
    ///
    /// `amount` is RUB; the USDT equivalent is fixed at the rate in
    /// effect now so later rate moves cannot change the claim size.
    pub async fn open(
        &self,
        trader_id: &str,
        transaction_id: &str,
        amount: Decimal,
        rub_per_usdt: Decimal,
        reason: DisputeReason,
        client_message: Option<&str>,
    ) -> BusinessResult<Dispute> {
        let trader = TraderRepo::get_by_id(self.ctx.pool(), trader_id)
            .await
            .map_err(|_| BusinessError::TraderNotFound(trader_id.to_string()))?;
        if !trader.is_active {
            return Err(BusinessError::TraderNotActive(trader_id.to_string()).into());
        }

        let amount_usdt = Money::new(amount, Currency::rub())
            .convert(rub_per_usdt, Currency::usdt())
            .ok_or_else(|| {
                BusinessError::invalid_amount("Exchange rate must be positive", rub_per_usdt)
            })?
            .amount;

        let mut dispute = Dispute::open(
            transaction_id,
            trader_id,
            amount,
            amount_usdt,
            reason,
            DEFAULT_DEADLINE_HOURS,
        )
        .map_err(BusinessError::Core)?;
        if let Some(message) = client_message {
            dispute = dispute.with_client_message(message);
        }

        DisputeRepo::insert(self.ctx.pool(), &DisputeRow::from(&dispute))
            .await
            .context("Failed to insert dispute")?;

        let event_id = self.ctx.next_event_id();
        let event = Event::dispute_opened(&event_id, trader_id, &dispute.id, amount_usdt);
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(trader_id, dispute_id = %dispute.id, %amount, "dispute opened");

        Ok(dispute)
    }

    /// Trader answers the claim.
    pub async fn respond(&self, dispute_id: &str, response: &str) -> BusinessResult<Dispute> {
        let row = DisputeRepo::get_by_id(self.ctx.pool(), dispute_id)
            .await
            .map_err(|_| BusinessError::DisputeNotFound(dispute_id.to_string()))?;
        let mut dispute = Dispute::try_from(row).map_err(BusinessError::Persistence)?;

        dispute.respond(response).map_err(BusinessError::Core)?;

        DisputeRepo::update(self.ctx.pool(), &DisputeRow::from(&dispute))
            .await
            .context("Failed to update dispute")?;

        Ok(dispute)
    }

    /// Close a dispute with a final outcome. Support and above only.
    pub async fn resolve(
        &self,
        actor_id: &str,
        dispute_id: &str,
        outcome: DisputeStatus,
    ) -> BusinessResult<Dispute> {
        let actor = TraderRepo::get_by_id(self.ctx.pool(), actor_id)
            .await
            .map_err(|_| BusinessError::TraderNotFound(actor_id.to_string()))?;
        let role = TraderRole::from_str(&actor.role)
            .ok_or_else(|| BusinessError::NotATrader(actor_id.to_string()))?;
        if !role.can_resolve_disputes() {
            return Err(BusinessError::not_permitted(&actor.role, "resolve_dispute").into());
        }

        let row = DisputeRepo::get_by_id(self.ctx.pool(), dispute_id)
            .await
            .map_err(|_| BusinessError::DisputeNotFound(dispute_id.to_string()))?;
        let mut dispute = Dispute::try_from(row).map_err(BusinessError::Persistence)?;

        dispute.resolve(outcome).map_err(BusinessError::Core)?;

        DisputeRepo::update(self.ctx.pool(), &DisputeRow::from(&dispute))
            .await
            .context("Failed to update dispute")?;

        let event_id = self.ctx.next_event_id();
        let event = Event::dispute_resolved(
            &event_id,
            actor_id,
            role,
            &dispute.trader_id,
            dispute_id,
        );
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(dispute_id, outcome = %dispute.status, "dispute resolved");

        Ok(dispute)
    }

    /// A trader's disputes, newest first.
    pub async fn list_for_trader(&self, trader_id: &str) -> BusinessResult<Vec<Dispute>> {
        let rows = DisputeRepo::get_by_trader(self.ctx.pool(), trader_id)
            .await
            .map_err(BusinessError::Persistence)?;
        Self::convert(rows)
    }

    /// All disputes in a given status.
    pub async fn list_by_status(&self, status: DisputeStatus) -> BusinessResult<Vec<Dispute>> {
        let rows = DisputeRepo::get_by_status(self.ctx.pool(), status.as_str())
            .await
            .map_err(BusinessError::Persistence)?;
        Self::convert(rows)
    }

    fn convert(rows: Vec<DisputeRow>) -> BusinessResult<Vec<Dispute>> {
        let mut disputes = Vec::with_capacity(rows.len());
        for row in rows {
            disputes.push(Dispute::try_from(row).map_err(BusinessError::Persistence)?);
        }
        Ok(disputes)
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
        TraderRepo::insert(&pool, &Trader::new("SUP_001", "olga", TraderRole::Support))
            .await
            .unwrap();

        (dir, ServiceContext::from_parts(pool, events))
    }

    #[tokio::test]
    async fn test_open_fixes_usdt_equivalent() {
        let (_dir, ctx) = context().await;
        let service = DisputeService::new(&ctx);

        let dispute = service
            .open(
                "TRD_001",
                "ORD-45618",
                dec!(9245),
                dec!(92.45),
                DisputeReason::PaymentNotReceived,
                Some("Деньги не пришли"),
            )
            .await
            .unwrap();

        assert_eq!(dispute.amount_usdt, dec!(100));
        assert_eq!(dispute.status, DisputeStatus::Open);
        assert!(dispute.deadline_at.is_some());
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (_dir, ctx) = context().await;
        let service = DisputeService::new(&ctx);

        let dispute = service
            .open(
                "TRD_001",
                "ORD-1",
                dec!(3500),
                dec!(92.45),
                DisputeReason::AmountMismatch,
                None,
            )
            .await
            .unwrap();

        let dispute = service
            .respond(&dispute.id, "Сумма совпадает, чек приложен")
            .await
            .unwrap();
        assert_eq!(dispute.status, DisputeStatus::Pending);

        let dispute = service
            .resolve("SUP_001", &dispute.id, DisputeStatus::Won)
            .await
            .unwrap();
        assert_eq!(dispute.status, DisputeStatus::Won);
        assert!(dispute.resolved_at.is_some());

        let open = service.list_by_status(DisputeStatus::Open).await.unwrap();
        assert!(open.is_empty());
        let won = service.list_by_status(DisputeStatus::Won).await.unwrap();
        assert_eq!(won.len(), 1);
    }

    #[tokio::test]
    async fn test_trader_cannot_resolve() {
        let (_dir, ctx) = context().await;
        let service = DisputeService::new(&ctx);

        let dispute = service
            .open("TRD_001", "ORD-2", dec!(100), dec!(92.45), DisputeReason::Other, None)
            .await
            .unwrap();

        let err = service
            .resolve("TRD_001", &dispute.id, DisputeStatus::Lost)
            .await
            .unwrap_err();
        let cause = err.downcast_ref::<BusinessError>().unwrap();
        assert!(matches!(cause, BusinessError::OperationNotPermitted { .. }));
    }

    #[tokio::test]
    async fn test_zero_rate_rejected() {
        let (_dir, ctx) = context().await;
        let service = DisputeService::new(&ctx);

        assert!(service
            .open("TRD_001", "ORD-3", dec!(100), dec!(0), DisputeReason::Other, None)
            .await
            .is_err());
    }
}
