//! Audit and report commands: journal reading, balance/dispute reports

use crate::{ReportFormat, ReportType};
use advancepay_core::{DepositLedger, Dispute, Event, Trader, TraderRole};
use advancepay_persistence::{DisputeRepo, EventFilter, EventReader, EventStore, LedgerRepo, TraderRepo};
use advancepay_reports::{
    BalanceReport, CsvExporter, DisputeReport, JsonExporter, MarkdownExporter, ReportData,
    ReportExporter,
};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Read the journal, optionally constrained by date range and trader.
///
/// The access itself is journaled.
pub async fn run_audit(
    db_path: &Path,
    events_dir: &Path,
    from: Option<String>,
    to: Option<String>,
    trader: Option<String>,
    actor: &str,
) -> Result<()> {
    let reader = EventReader::new(events_dir);

    let events = match (from.as_deref(), to.as_deref()) {
        (Some(from), Some(to)) => reader.read_range(from, to)?,
        (Some(from), None) => reader.read_date(from)?,
        _ => reader.read_all()?,
    };

    let mut filter = EventFilter::new();
    if let Some(trader_id) = trader {
        filter = filter.trader(&trader_id);
    }
    let events = filter.apply(events);

    println!("📜 {} event(s)", events.len());
    for event in &events {
        println!("   {}", event);
    }

    // Journal the audit access under the actor's real role
    let pool = crate::db::connect(db_path).await?;
    let actor_role = TraderRepo::get_by_id(&pool, actor)
        .await
        .ok()
        .and_then(|row| TraderRole::from_str(&row.role))
        .unwrap_or(TraderRole::TeamLead);
    pool.close().await;

    let store = EventStore::new(events_dir)?;
    let access = Event::audit_access(&store.next_event_id(), actor, actor_role);
    store.append(&access)?;

    Ok(())
}

/// Build a balance or dispute report and render it.
pub async fn generate_report(
    db_path: &Path,
    format: ReportFormat,
    output: Option<PathBuf>,
    report_type: ReportType,
) -> Result<()> {
    let pool = crate::db::connect(db_path).await?;

    let rendered = match report_type {
        ReportType::Balance => {
            let mut report = BalanceReport::new("Trader balances");
            for row in LedgerRepo::get_all(&pool).await? {
                let ledger = DepositLedger::try_from(row)?;
                let username = TraderRepo::get_by_id(&pool, &ledger.trader_id)
                    .await
                    .ok()
                    .and_then(|row| Trader::try_from(row).ok())
                    .map(|t| t.username)
                    .unwrap_or_else(|| ledger.trader_id.clone());
                report.push(&username, &ledger);
            }
            export(&report, format)
        }
        ReportType::Disputes => {
            let mut disputes = Vec::new();
            for row in DisputeRepo::get_all(&pool).await? {
                disputes.push(Dispute::try_from(row)?);
            }
            let report = DisputeReport::generate("Disputes", disputes);
            export(&report, format)
        }
    };

    pool.close().await;

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("✅ Report written to {:?}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn export(report: &dyn ReportData, format: ReportFormat) -> String {
    match format {
        ReportFormat::Csv => CsvExporter::new().export(report),
        ReportFormat::Json => JsonExporter::new().export(report),
        ReportFormat::Markdown => MarkdownExporter::new().export(report),
    }
}
