//! Notification commands: ingest relayed bank notifications, list them

use crate::NotifyAction;
use advancepay_business::NotificationService;
use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use super::service_context;

/// Dispatch a notify subcommand
pub async fn handle(db_path: &Path, events_dir: &Path, action: NotifyAction) -> Result<()> {
    let ctx = service_context(db_path, events_dir).await?;
    let service = NotificationService::new(&ctx);

    match action {
        NotifyAction::Ingest {
            trader_id,
            app_package,
            title,
            text,
            device,
        } => {
            let notification = service
                .ingest(
                    &trader_id,
                    &app_package,
                    &title,
                    &text,
                    Utc::now(),
                    device.as_deref(),
                )
                .await?;

            println!("✅ Notification ingested: {}", notification.id);
            if let Some(name) = &notification.app_name {
                println!("   Bank:      {}", name);
            }
            match notification.amount {
                Some(amount) => println!("   Amount:    {} RUB", amount),
                None => println!("   Amount:    (not parsed)"),
            }
            if let Some(card) = &notification.card_last4 {
                println!("   Card:      *{}", card);
            }
            if let Some(operation) = notification.operation {
                println!("   Operation: {}", operation);
            }
            if notification.is_incoming_payment() {
                println!("   💳 Incoming payment candidate");
            }
        }

        NotifyAction::List {
            trader_id,
            page,
            page_size,
        } => {
            let notifications = service.list(&trader_id, page, page_size).await?;
            println!("🔔 {} notification(s)", notifications.len());
            for n in notifications {
                let amount = n
                    .amount
                    .map(|a| format!("{} RUB", a))
                    .unwrap_or_else(|| "-".to_string());
                let processed = if n.is_processed { "✓" } else { " " };
                println!(
                    "   [{}] {} {} {} ({})",
                    processed,
                    n.posted_time.format("%Y-%m-%d %H:%M"),
                    n.app_name.as_deref().unwrap_or(&n.app_package),
                    amount,
                    n.operation.map(|o| o.as_str()).unwrap_or("unclassified"),
                );
            }
        }
    }

    Ok(())
}
