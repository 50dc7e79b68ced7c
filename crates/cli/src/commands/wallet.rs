//! Wallet commands: deposit observation and the withdrawal lifecycle

use crate::WithdrawAction;
use advancepay_business::WalletService;
use anyhow::Result;
use rust_decimal::Decimal;
use std::path::Path;

use super::service_context;

/// Record an observed chain deposit
pub async fn deposit(
    db_path: &Path,
    events_dir: &Path,
    trader_id: &str,
    amount: Decimal,
    tx_hash: Option<&str>,
) -> Result<()> {
    let ctx = service_context(db_path, events_dir).await?;
    let wallet = WalletService::new(&ctx);

    let result = wallet.observe_deposit(trader_id, amount, tx_hash).await?;

    println!("✅ Deposit recorded!");
    println!("   Transaction: {}", result.transaction_id);
    println!("   Amount:      {} USDT", result.amount);
    println!(
        "   Split:       {} security / {} working",
        result.allocation.security_deposit, result.allocation.working_balance
    );
    if !result.allocation.security_satisfied {
        println!("   ⚠️  Security deposit still open");
    }

    Ok(())
}

/// Dispatch a withdraw subcommand
pub async fn handle_withdraw(
    db_path: &Path,
    events_dir: &Path,
    action: WithdrawAction,
) -> Result<()> {
    let ctx = service_context(db_path, events_dir).await?;
    let wallet = WalletService::new(&ctx);

    match action {
        WithdrawAction::Request {
            trader_id,
            amount,
            address,
        } => {
            let result = wallet.request_withdrawal(&trader_id, amount, &address).await?;

            println!("✅ Withdrawal requested!");
            println!("   Transaction: {}", result.transaction_id);
            println!("   Amount:      {} USDT", result.amount);
            println!("   To:          {}", address);
            println!(
                "   Working balance left: {} USDT",
                result.allocation.working_balance
            );
        }

        WithdrawAction::Complete {
            transaction_id,
            tx_hash,
        } => {
            let result = wallet.complete_withdrawal(&transaction_id, &tx_hash).await?;

            println!("✅ Withdrawal completed!");
            println!("   Transaction: {}", result.transaction_id);
            println!("   Hash:        {}", tx_hash);
        }

        WithdrawAction::Cancel { transaction_id } => {
            let result = wallet.cancel_withdrawal(&transaction_id).await?;

            println!("✅ Withdrawal cancelled, funds returned");
            println!("   Transaction: {}", result.transaction_id);
            println!(
                "   Working balance now: {} USDT",
                result.allocation.working_balance
            );
        }
    }

    Ok(())
}
