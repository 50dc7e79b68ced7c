//! Requisite operations - receiving instruments and limit accounting

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use advancepay_core::{Event, Requisite};
use advancepay_persistence::{RequisiteRepo, RequisiteRow, TraderRepo};
use anyhow::Context;
use rust_decimal::Decimal;
use tracing::info;

/// Requisite Service - add instruments, record turnover against limits.
pub struct RequisiteService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RequisiteService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a new requisite for a trader.
    pub async fn add(&self, requisite: Requisite) -> BusinessResult<Requisite> {
        let trader = TraderRepo::get_by_id(self.ctx.pool(), &requisite.trader_id)
            .await
            .map_err(|_| BusinessError::TraderNotFound(requisite.trader_id.clone()))?;
        if !trader.is_active {
            return Err(BusinessError::TraderNotActive(requisite.trader_id.clone()).into());
        }

        RequisiteRepo::insert(self.ctx.pool(), &RequisiteRow::from(&requisite))
            .await
            .context("Failed to insert requisite")?;

        let event_id = self.ctx.next_event_id();
        let event = Event::requisite_added(&event_id, &requisite.trader_id, &requisite.id);
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        info!(
            trader_id = %requisite.trader_id,
            requisite_id = %requisite.id,
            bank = %requisite.bank_name,
            "requisite added"
        );

        Ok(requisite)
    }

    /// Record a processed RUB payment against the requisite's windows.
    ///
    /// Fails without recording if either the daily or monthly limit
    /// would be exceeded.
    pub async fn record_usage(
        &self,
        requisite_id: &str,
        amount: Decimal,
    ) -> BusinessResult<Requisite> {
        let row = RequisiteRepo::get_by_id(self.ctx.pool(), requisite_id)
            .await
            .map_err(BusinessError::Persistence)?;
        let mut requisite = Requisite::try_from(row).map_err(BusinessError::Persistence)?;

        requisite.record_usage(amount).map_err(BusinessError::Core)?;

        RequisiteRepo::update_usage(self.ctx.pool(), &RequisiteRow::from(&requisite))
            .await
            .context("Failed to update requisite usage")?;

        let event_id = self.ctx.next_event_id();
        let event =
            Event::requisite_used(&event_id, &requisite.trader_id, requisite_id, amount);
        self.ctx.events().append(&event).map_err(BusinessError::Persistence)?;

        Ok(requisite)
    }

    /// Take a requisite out of rotation.
    pub async fn deactivate(&self, requisite_id: &str) -> BusinessResult<()> {
        RequisiteRepo::set_active(self.ctx.pool(), requisite_id, false)
            .await
            .map_err(BusinessError::Persistence)?;
        Ok(())
    }

    /// A trader's requisites.
    pub async fn list(&self, trader_id: &str) -> BusinessResult<Vec<Requisite>> {
        let rows = RequisiteRepo::get_by_trader(self.ctx.pool(), trader_id)
            .await
            .map_err(BusinessError::Persistence)?;
        let mut requisites = Vec::with_capacity(rows.len());
        for row in rows {
            requisites.push(Requisite::try_from(row).map_err(BusinessError::Persistence)?);
        }
        Ok(requisites)
    }
}
