//! Requisite commands: add instruments, record usage, list

use crate::RequisiteAction;
use advancepay_business::RequisiteService;
use advancepay_core::{PaymentMethod, Requisite};
use anyhow::Result;
use std::path::Path;
use uuid::Uuid;

use super::service_context;

/// Requisite IDs stay short and readable; they surface in dispute flows.
fn next_requisite_id() -> String {
    format!("REQ_{}", &Uuid::new_v4().simple().to_string()[..8])
}

/// Dispatch a requisite subcommand
pub async fn handle(db_path: &Path, events_dir: &Path, action: RequisiteAction) -> Result<()> {
    let ctx = service_context(db_path, events_dir).await?;
    let service = RequisiteService::new(&ctx);

    match action {
        RequisiteAction::AddCard {
            trader_id,
            bank,
            number,
            holder,
            daily,
            monthly,
        } => {
            let requisite = Requisite::card(
                &next_requisite_id(),
                &trader_id,
                &bank,
                &number,
                &holder,
                daily,
                monthly,
            )
            .with_methods(vec![PaymentMethod::Card, PaymentMethod::Sbp]);
            let requisite = service.add(requisite).await?;

            println!("✅ Card requisite added: {}", requisite.id);
            println!("   Bank:   {}", requisite.bank_name);
            println!("   Limits: {}/day, {}/month RUB", daily, monthly);
        }

        RequisiteAction::AddSbp {
            trader_id,
            bank,
            phone,
            holder,
            daily,
            monthly,
        } => {
            let requisite = Requisite::sbp(
                &next_requisite_id(),
                &trader_id,
                &bank,
                &phone,
                &holder,
                daily,
                monthly,
            );
            let requisite = service.add(requisite).await?;

            println!("✅ SBP requisite added: {}", requisite.id);
            println!("   Bank:  {}", requisite.bank_name);
            println!("   Phone: {}", phone);
        }

        RequisiteAction::List { trader_id } => {
            let requisites = service.list(&trader_id).await?;
            println!("💳 {} requisite(s)", requisites.len());
            for r in requisites {
                println!("   {}", r);
            }
        }

        RequisiteAction::Use {
            requisite_id,
            amount,
        } => {
            let requisite = service.record_usage(&requisite_id, amount).await?;

            println!("✅ Usage recorded: {} RUB", amount);
            println!(
                "   Daily:   {}/{} RUB",
                requisite.daily_used, requisite.daily_limit
            );
            println!(
                "   Monthly: {}/{} RUB",
                requisite.monthly_used, requisite.monthly_limit
            );
        }

        RequisiteAction::Deactivate { requisite_id } => {
            service.deactivate(&requisite_id).await?;
            println!("✅ Requisite deactivated: {}", requisite_id);
        }
    }

    Ok(())
}
