//! Database initialization and status

use advancepay_core::{Trader, TraderRole};
use advancepay_persistence::{create_pool, create_schema, TraderRepo};
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

fn db_url(db_path: &Path) -> String {
    format!("sqlite:{}?mode=rwc", db_path.display())
}

/// Initialize the database with schema and seed data
pub async fn init_database(db_path: &Path, force: bool) -> Result<()> {
    if force && db_path.exists() {
        std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        println!("🗑️  Removed existing database");
    }

    let pool = create_pool(&db_url(db_path))
        .await
        .context("Failed to connect to database")?;

    println!("📦 Creating schema...");
    create_schema(&pool).await?;
    seed_data(&pool).await?;

    pool.close().await;
    Ok(())
}

/// Seed reference data: the first team lead, so traders can be
/// provisioned right away.
async fn seed_data(pool: &SqlitePool) -> Result<()> {
    println!("🌱 Seeding reference data...");

    if TraderRepo::get_by_id(pool, "TL_001").await.is_err() {
        TraderRepo::insert(pool, &Trader::new("TL_001", "teamlead", TraderRole::TeamLead))
            .await
            .context("Failed to seed team lead")?;
    }

    Ok(())
}

/// Show database status
pub async fn show_status(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        println!("❌ Database not found at {:?}", db_path);
        println!("   Run 'advancepay init' to create the database");
        return Ok(());
    }

    let pool = connect(db_path).await?;

    println!("📊 Database Status");
    println!("   Path: {:?}", db_path);
    println!();

    let traders = count(&pool, "traders").await;
    let ledgers = count(&pool, "ledgers").await;
    let transactions = count(&pool, "wallet_transactions").await;
    let requisites = count(&pool, "requisites").await;
    let disputes = count(&pool, "disputes").await;
    let notifications = count(&pool, "bank_notifications").await;

    println!("   Traders:       {}", traders);
    println!("   Ledgers:       {}", ledgers);
    println!("   Transactions:  {}", transactions);
    println!("   Requisites:    {}", requisites);
    println!("   Disputes:      {}", disputes);
    println!("   Notifications: {}", notifications);

    pool.close().await;
    Ok(())
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    let query = format!("SELECT COUNT(*) FROM {}", table);
    sqlx::query_as::<_, (i64,)>(&query)
        .fetch_one(pool)
        .await
        .map(|row| row.0)
        .unwrap_or(0)
}

/// Connect to the database pool
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    let pool = create_pool(&db_url(db_path))
        .await
        .context("Failed to connect to database")?;
    Ok(pool)
}
