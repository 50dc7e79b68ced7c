//! Trader account commands: create, list, show, balance, security

use crate::{SecurityAction, TraderAction};
use advancepay_business::{TeamLeadService, WalletService};
use advancepay_core::Trader;
use advancepay_persistence::TraderRepo;
use anyhow::Result;
use std::path::Path;

use super::service_context;

/// Dispatch a trader subcommand
pub async fn handle(db_path: &Path, events_dir: &Path, action: TraderAction) -> Result<()> {
    let ctx = service_context(db_path, events_dir).await?;

    match action {
        TraderAction::Create {
            name,
            team,
            security,
            actor,
        } => {
            let lead = TeamLeadService::new(&ctx);
            let trader = lead
                .provision_trader(&actor, &name, team.as_deref(), security)
                .await?;

            println!("✅ Trader provisioned!");
            println!("   ID:       {}", trader.id);
            println!("   Username: {}", trader.username);
            if let Some(team) = &trader.team_id {
                println!("   Team:     {}", team);
            }
            println!("   Required security: {} USDT", security);
        }

        TraderAction::List => {
            let rows = TraderRepo::get_all(ctx.pool()).await?;
            println!("👥 {} account(s)", rows.len());
            for row in rows {
                let trader = Trader::try_from(row)?;
                println!("   {}", trader);
            }
        }

        TraderAction::Show { trader_id } => {
            let row = TraderRepo::get_by_id(ctx.pool(), &trader_id).await?;
            let trader = Trader::try_from(row)?;
            println!("{}", trader);
            println!("   created: {}", trader.created_at.format("%Y-%m-%d %H:%M"));
        }

        TraderAction::Balance { trader_id } => {
            let wallet = WalletService::new(&ctx);
            let snapshot = wallet.balance(&trader_id).await?;

            println!("💰 Balance for {}", snapshot.trader_id);
            println!("   Total deposited:   {} USDT", snapshot.total_deposited);
            println!(
                "   Security deposit:  {}/{} USDT",
                snapshot.allocation.security_deposit, snapshot.required_security
            );
            println!("   Working balance:   {} USDT", snapshot.allocation.working_balance);
            println!("   Pending out:       {} USDT", snapshot.pending_withdrawal);
            if snapshot.allocation.security_satisfied {
                println!("   Security deposit closed ✅");
            } else {
                println!("   ⚠️  Security deposit required");
            }
        }
    }

    Ok(())
}

/// Dispatch a security subcommand
pub async fn handle_security(
    db_path: &Path,
    events_dir: &Path,
    action: SecurityAction,
) -> Result<()> {
    let ctx = service_context(db_path, events_dir).await?;

    match action {
        SecurityAction::Set {
            trader_id,
            amount,
            actor,
        } => {
            let lead = TeamLeadService::new(&ctx);
            let allocation = lead.set_required_security(&actor, &trader_id, amount).await?;

            println!("✅ Security requirement updated");
            println!("   Trader:           {}", trader_id);
            println!("   New requirement:  {} USDT", amount);
            println!(
                "   Split now:        {} security / {} working",
                allocation.security_deposit, allocation.working_balance
            );
        }
    }

    Ok(())
}
