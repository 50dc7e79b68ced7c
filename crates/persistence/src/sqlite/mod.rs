//! SQLite persistence module
//!
//! Repository pattern for SQLite database access.

pub mod repos;
pub mod schema;

pub use repos::{
    DisputeRepo, LedgerRepo, NotificationRepo, RequisiteRepo, TraderRepo, WalletTransactionRepo,
};
pub use schema::{
    BankNotificationRow, DisputeRow, LedgerRow, RequisiteRow, TraderRow, WalletTransactionRow,
};

use crate::error::PersistenceResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Create a connection pool for the given SQLite URL
/// (e.g. "sqlite:data/advancepay.db?mode=rwc").
pub async fn create_pool(db_url: &str) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
    // One connection: SQLite serializes writers anyway, and a single
    // connection keeps ":memory:" databases shared across queries.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Create the pool and bring up the full schema.
pub async fn init_database(db_url: &str) -> PersistenceResult<SqlitePool> {
    let pool = create_pool(db_url).await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables (idempotent).
pub async fn create_schema(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::query(
        r#"
        -- Platform users
        CREATE TABLE IF NOT EXISTS traders (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL,
            team_id TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Deposit ledgers (1:1 with traders that hold the trader role)
        CREATE TABLE IF NOT EXISTS ledgers (
            trader_id TEXT PRIMARY KEY,
            total_deposited TEXT NOT NULL DEFAULT '0',
            required_security TEXT NOT NULL DEFAULT '0',
            pending_withdrawal TEXT NOT NULL DEFAULT '0',
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (trader_id) REFERENCES traders(id)
        );

        -- USDT movements (chain deposits, withdrawal requests)
        CREATE TABLE IF NOT EXISTS wallet_transactions (
            id TEXT PRIMARY KEY,
            trader_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            amount TEXT NOT NULL,
            status TEXT NOT NULL,
            tx_hash TEXT,
            address TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            completed_at DATETIME,
            FOREIGN KEY (trader_id) REFERENCES traders(id)
        );

        -- Receiving instruments with limit windows
        CREATE TABLE IF NOT EXISTS requisites (
            id TEXT PRIMARY KEY,
            trader_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            bank_name TEXT NOT NULL,
            card_number TEXT,
            account_number TEXT,
            phone TEXT,
            holder_name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            daily_limit TEXT NOT NULL,
            daily_used TEXT NOT NULL DEFAULT '0',
            monthly_limit TEXT NOT NULL,
            monthly_used TEXT NOT NULL DEFAULT '0',
            total_processed TEXT NOT NULL DEFAULT '0',
            transactions_count INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            last_used_at DATETIME,
            methods TEXT NOT NULL DEFAULT '[]',
            FOREIGN KEY (trader_id) REFERENCES traders(id)
        );

        -- Client disputes
        CREATE TABLE IF NOT EXISTS disputes (
            id TEXT PRIMARY KEY,
            transaction_id TEXT NOT NULL UNIQUE,
            trader_id TEXT NOT NULL,
            amount TEXT NOT NULL,
            amount_usdt TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open',
            reason TEXT NOT NULL,
            description TEXT,
            client_message TEXT,
            trader_response TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            deadline_at DATETIME,
            resolved_at DATETIME,
            FOREIGN KEY (trader_id) REFERENCES traders(id)
        );

        -- Relayed bank notifications
        CREATE TABLE IF NOT EXISTS bank_notifications (
            id TEXT PRIMARY KEY,
            trader_id TEXT NOT NULL,
            app_package TEXT NOT NULL,
            app_name TEXT,
            notification_title TEXT NOT NULL,
            notification_text TEXT NOT NULL,
            posted_time DATETIME NOT NULL,
            amount TEXT,
            card_last4 TEXT,
            operation TEXT,
            is_processed INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (trader_id) REFERENCES traders(id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        create_schema(&pool).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM traders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
        pool.close().await;
    }
}
