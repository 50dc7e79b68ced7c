//! Dispute commands: open, respond, resolve, list

use crate::DisputeAction;
use advancepay_business::DisputeService;
use anyhow::Result;
use std::path::Path;

use super::service_context;

/// Dispatch a dispute subcommand
pub async fn handle(db_path: &Path, events_dir: &Path, action: DisputeAction) -> Result<()> {
    let ctx = service_context(db_path, events_dir).await?;
    let service = DisputeService::new(&ctx);

    match action {
        DisputeAction::Open {
            trader_id,
            transaction_id,
            amount,
            rate,
            reason,
            message,
        } => {
            let dispute = service
                .open(
                    &trader_id,
                    &transaction_id,
                    amount,
                    rate,
                    reason.to_core(),
                    message.as_deref(),
                )
                .await?;

            println!("✅ Dispute opened: {}", dispute.id);
            println!("   Transaction: {}", dispute.transaction_id);
            println!(
                "   Amount:      {} RUB ({} USDT at {})",
                dispute.amount, dispute.amount_usdt, rate
            );
            if let Some(deadline) = dispute.deadline_at {
                println!("   Respond by:  {}", deadline.format("%Y-%m-%d %H:%M"));
            }
        }

        DisputeAction::Respond {
            dispute_id,
            response,
        } => {
            let dispute = service.respond(&dispute_id, &response).await?;
            println!("✅ Response recorded, dispute is now {}", dispute.status);
        }

        DisputeAction::Resolve {
            dispute_id,
            outcome,
            actor,
        } => {
            let dispute = service.resolve(&actor, &dispute_id, outcome.to_core()).await?;
            println!("✅ Dispute {} resolved: {}", dispute.id, dispute.status);
        }

        DisputeAction::List { trader, status } => {
            let disputes = match (&trader, status) {
                (Some(trader_id), _) => service.list_for_trader(trader_id).await?,
                (None, Some(status)) => service.list_by_status(status.to_core()).await?,
                (None, None) => service.list_by_status(crate::DisputeStatusArg::Open.to_core()).await?,
            };

            println!("⚖️  {} dispute(s)", disputes.len());
            for d in disputes {
                println!("   {}", d);
            }
        }
    }

    Ok(())
}
