//! Team-lead operations - trader provisioning and security requirements
//!
//! The security requirement is owned by the team lead control plane; the
//! allocation engine only ever reads it.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use advancepay_core::{AllocationResult, DepositLedger, Event, Trader, TraderRole};
use advancepay_persistence::{LedgerRepo, TraderRepo, TraderRow};
use anyhow::Context;
use rust_decimal::Decimal;
use tracing::info;

/// Default security requirement for a freshly provisioned trader, USDT.
pub const DEFAULT_REQUIRED_SECURITY: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Team Lead Service - control-plane operations.
pub struct TeamLeadService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TeamLeadService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Verify the actor may administer traders.
    async fn verify_admin(&self, actor_id: &str, operation: &str) -> BusinessResult<TraderRow> {
        let actor = TraderRepo::get_by_id(self.ctx.pool(), actor_id)
            .await
            .map_err(|_| BusinessError::TraderNotFound(actor_id.to_string()))?;

        let role = TraderRole::from_str(&actor.role)
            .ok_or_else(|| BusinessError::NotATrader(actor_id.to_string()))?;
        if !role.can_set_security() {
            return Err(BusinessError::not_permitted(&actor.role, operation).into());
        }
        if !actor.is_active {
            return Err(BusinessError::TraderNotActive(actor_id.to_string()).into());
        }
        Ok(actor)
    }

    /// Provision a trader account with its empty ledger.
    pub async fn provision_trader(
        &self,
        actor_id: &str,
        username: &str,
        team_id: Option<&str>,
        required_security: Decimal,
    ) -> BusinessResult<Trader> {
        let actor = self.verify_admin(actor_id, "provision_trader").await?;

        if required_security < Decimal::ZERO {
            return Err(BusinessError::invalid_amount(
                "Required security must be non-negative",
                required_security,
            )
            .into());
        }

        let pool = self.ctx.pool();
        let count = TraderRepo::count(pool).await.map_err(BusinessError::Persistence)?;
        let id = Trader::generate_id(count as u32 + 1);

        let mut trader = Trader::trader(&id, username);
        if let Some(team) = team_id {
            trader = trader.with_team(team);
        }
        let ledger = DepositLedger::new(&id, required_security).map_err(BusinessError::Core)?;

        TraderRepo::insert(pool, &trader)
            .await
            .context("Failed to insert trader")?;
        LedgerRepo::insert(pool, &ledger)
            .await
            .context("Failed to insert ledger")?;

        let event_id = self.ctx.next_event_id();
        let actor_role = TraderRole::from_str(&actor.role).unwrap_or(TraderRole::TeamLead);
        let event = Event::trader_created(&event_id, actor_id, actor_role, &id);
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(trader_id = %id, username, %required_security, "trader provisioned");

        Ok(trader)
    }

    /// Change a trader's required security deposit.
    ///
    /// Takes effect on the next allocation read; already-deposited funds
    /// are re-split immediately, nothing is moved on-chain.
    pub async fn set_required_security(
        &self,
        actor_id: &str,
        trader_id: &str,
        amount: Decimal,
    ) -> BusinessResult<AllocationResult> {
        let actor = self.verify_admin(actor_id, "set_required_security").await?;

        let row = LedgerRepo::get_by_trader(self.ctx.pool(), trader_id)
            .await
            .map_err(|_| BusinessError::LedgerNotFound(trader_id.to_string()))?;
        let mut ledger = DepositLedger::try_from(row).map_err(BusinessError::Persistence)?;

        let allocation = ledger
            .set_required_security(amount)
            .map_err(BusinessError::Core)?;

        LedgerRepo::update(self.ctx.pool(), &ledger)
            .await
            .context("Failed to update ledger")?;

        let event_id = self.ctx.next_event_id();
        let actor_role = TraderRole::from_str(&actor.role).unwrap_or(TraderRole::TeamLead);
        let event = Event::security_changed(&event_id, actor_id, actor_role, trader_id, amount);
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(
            trader_id,
            %amount,
            security_satisfied = allocation.security_satisfied,
            "security requirement changed"
        );

        Ok(allocation)
    }

    /// Deactivate a trader account (history is kept).
    pub async fn deactivate_trader(&self, actor_id: &str, trader_id: &str) -> BusinessResult<()> {
        let actor = self.verify_admin(actor_id, "deactivate_trader").await?;

        TraderRepo::set_active(self.ctx.pool(), trader_id, false)
            .await
            .map_err(BusinessError::Persistence)?;

        let event_id = self.ctx.next_event_id();
        let actor_role = TraderRole::from_str(&actor.role).unwrap_or(TraderRole::TeamLead);
        let event = Event::trader_deactivated(&event_id, actor_id, actor_role, trader_id);
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        Ok(())
    }

    /// Traders belonging to a team.
    pub async fn team_members(&self, team_id: &str) -> BusinessResult<Vec<Trader>> {
        let rows = TraderRepo::get_by_role(self.ctx.pool(), TraderRole::Trader)
            .await
            .map_err(BusinessError::Persistence)?;
        let mut members = Vec::new();
        for row in rows {
            if row.team_id.as_deref() == Some(team_id) {
                members.push(Trader::try_from(row).map_err(BusinessError::Persistence)?);
            }
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advancepay_persistence::{init_database, EventStore};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn context_with_lead() -> (tempfile::TempDir, ServiceContext) {
        let dir = tempdir().unwrap();
        let pool = init_database("sqlite::memory:").await.unwrap();
        let events = Arc::new(EventStore::new(dir.path()).unwrap());

        TraderRepo::insert(&pool, &Trader::team_lead("TL_001", "maria"))
            .await
            .unwrap();

        (dir, ServiceContext::from_parts(pool, events))
    }

    #[tokio::test]
    async fn test_provision_creates_trader_and_ledger() {
        let (_dir, ctx) = context_with_lead().await;
        let lead = TeamLeadService::new(&ctx);

        let trader = lead
            .provision_trader("TL_001", "ivan", Some("TEAM_001"), DEFAULT_REQUIRED_SECURITY)
            .await
            .unwrap();
        assert_eq!(trader.role, TraderRole::Trader);

        let row = LedgerRepo::get_by_trader(ctx.pool(), &trader.id).await.unwrap();
        let ledger = DepositLedger::try_from(row).unwrap();
        assert_eq!(ledger.required_security, dec!(500));
        assert_eq!(ledger.total_deposited, dec!(0));
    }

    #[tokio::test]
    async fn test_set_required_security_resplits() {
        let (_dir, ctx) = context_with_lead().await;
        let lead = TeamLeadService::new(&ctx);

        let trader = lead
            .provision_trader("TL_001", "ivan", None, dec!(500))
            .await
            .unwrap();

        // Fund the ledger directly
        let row = LedgerRepo::get_by_trader(ctx.pool(), &trader.id).await.unwrap();
        let mut ledger = DepositLedger::try_from(row).unwrap();
        ledger.apply_deposit(dec!(1700)).unwrap();
        LedgerRepo::update(ctx.pool(), &ledger).await.unwrap();

        let allocation = lead
            .set_required_security("TL_001", &trader.id, dec!(1000))
            .await
            .unwrap();
        assert_eq!(allocation.security_deposit, dec!(1000));
        assert_eq!(allocation.working_balance, dec!(700));
    }

    #[tokio::test]
    async fn test_trader_cannot_administer() {
        let (_dir, ctx) = context_with_lead().await;
        let lead = TeamLeadService::new(&ctx);

        let trader = lead
            .provision_trader("TL_001", "ivan", None, dec!(500))
            .await
            .unwrap();

        let err = lead
            .set_required_security(&trader.id, &trader.id, dec!(0))
            .await
            .unwrap_err();
        let cause = err.downcast_ref::<BusinessError>().unwrap();
        assert!(matches!(cause, BusinessError::OperationNotPermitted { .. }));
    }

    #[tokio::test]
    async fn test_negative_requirement_rejected() {
        let (_dir, ctx) = context_with_lead().await;
        let lead = TeamLeadService::new(&ctx);

        let trader = lead
            .provision_trader("TL_001", "ivan", None, dec!(500))
            .await
            .unwrap();
        assert!(lead
            .set_required_security("TL_001", &trader.id, dec!(-1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_team_members() {
        let (_dir, ctx) = context_with_lead().await;
        let lead = TeamLeadService::new(&ctx);

        lead.provision_trader("TL_001", "ivan", Some("TEAM_001"), dec!(500))
            .await
            .unwrap();
        lead.provision_trader("TL_001", "petr", Some("TEAM_002"), dec!(500))
            .await
            .unwrap();

        let members = lead.team_members("TEAM_001").await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].username, "ivan");
    }
}
