//! Repository implementations for SQLite
//!
//! CRUD operations for all tables. Repos speak row types; conversion to
//! domain types happens at the call site via TryFrom.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use advancepay_core::{DepositLedger, Trader, TraderRole};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

// ============================================================================
// Trader Repository
// ============================================================================

/// Repository for the `traders` table
pub struct TraderRepo;

impl TraderRepo {
    /// Fetch a trader by ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<TraderRow> {
        sqlx::query_as::<_, TraderRow>("SELECT * FROM traders WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Trader", id))
    }

    /// Fetch a trader by username
    pub async fn get_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> PersistenceResult<Option<TraderRow>> {
        let row = sqlx::query_as::<_, TraderRow>("SELECT * FROM traders WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Fetch all traders with a given role
    pub async fn get_by_role(
        pool: &SqlitePool,
        role: TraderRole,
    ) -> PersistenceResult<Vec<TraderRow>> {
        let rows = sqlx::query_as::<_, TraderRow>("SELECT * FROM traders WHERE role = ?")
            .bind(role.as_str())
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Fetch all traders
    pub async fn get_all(pool: &SqlitePool) -> PersistenceResult<Vec<TraderRow>> {
        let rows = sqlx::query_as::<_, TraderRow>("SELECT * FROM traders ORDER BY id")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Insert a new trader
    pub async fn insert(pool: &SqlitePool, trader: &Trader) -> PersistenceResult<()> {
        sqlx::query(
            "INSERT INTO traders (id, username, role, team_id, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&trader.id)
        .bind(&trader.username)
        .bind(trader.role.as_str())
        .bind(&trader.team_id)
        .bind(trader.is_active)
        .bind(trader.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Activate or deactivate a trader
    pub async fn set_active(pool: &SqlitePool, id: &str, active: bool) -> PersistenceResult<()> {
        let result = sqlx::query("UPDATE traders SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Trader", id));
        }
        Ok(())
    }

    /// Count traders
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM traders")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Ledger Repository
// ============================================================================

/// Repository for the `ledgers` table
pub struct LedgerRepo;

impl LedgerRepo {
    /// Fetch a ledger by trader ID
    pub async fn get_by_trader(pool: &SqlitePool, trader_id: &str) -> PersistenceResult<LedgerRow> {
        sqlx::query_as::<_, LedgerRow>("SELECT * FROM ledgers WHERE trader_id = ?")
            .bind(trader_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Ledger", trader_id))
    }

    /// Insert a freshly provisioned ledger
    pub async fn insert(pool: &SqlitePool, ledger: &DepositLedger) -> PersistenceResult<()> {
        let row = LedgerRow::from(ledger);
        sqlx::query(
            "INSERT INTO ledgers (trader_id, total_deposited, required_security, pending_withdrawal, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&row.trader_id)
        .bind(&row.total_deposited)
        .bind(&row.required_security)
        .bind(&row.pending_withdrawal)
        .bind(row.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Write back a mutated ledger
    pub async fn update(pool: &SqlitePool, ledger: &DepositLedger) -> PersistenceResult<()> {
        let row = LedgerRow::from(ledger);
        let result = sqlx::query(
            "UPDATE ledgers SET total_deposited = ?, required_security = ?, pending_withdrawal = ?, updated_at = ?
             WHERE trader_id = ?",
        )
        .bind(&row.total_deposited)
        .bind(&row.required_security)
        .bind(&row.pending_withdrawal)
        .bind(row.updated_at)
        .bind(&row.trader_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Ledger", &ledger.trader_id));
        }
        Ok(())
    }

    /// Fetch all ledgers
    pub async fn get_all(pool: &SqlitePool) -> PersistenceResult<Vec<LedgerRow>> {
        let rows = sqlx::query_as::<_, LedgerRow>("SELECT * FROM ledgers ORDER BY trader_id")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}

// ============================================================================
// Wallet Transaction Repository
// ============================================================================

/// Repository for the `wallet_transactions` table
pub struct WalletTransactionRepo;

impl WalletTransactionRepo {
    /// Fetch a transaction by ID
    pub async fn get_by_id(
        pool: &SqlitePool,
        id: &str,
    ) -> PersistenceResult<WalletTransactionRow> {
        sqlx::query_as::<_, WalletTransactionRow>("SELECT * FROM wallet_transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("WalletTransaction", id))
    }

    /// Fetch a trader's transactions, newest first
    pub async fn get_by_trader(
        pool: &SqlitePool,
        trader_id: &str,
    ) -> PersistenceResult<Vec<WalletTransactionRow>> {
        let rows = sqlx::query_as::<_, WalletTransactionRow>(
            "SELECT * FROM wallet_transactions WHERE trader_id = ? ORDER BY created_at DESC",
        )
        .bind(trader_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert a new transaction
    pub async fn insert(pool: &SqlitePool, row: &WalletTransactionRow) -> PersistenceResult<()> {
        sqlx::query(
            "INSERT INTO wallet_transactions (id, trader_id, kind, amount, status, tx_hash, address, created_at, completed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.trader_id)
        .bind(&row.kind)
        .bind(&row.amount)
        .bind(&row.status)
        .bind(&row.tx_hash)
        .bind(&row.address)
        .bind(row.created_at)
        .bind(row.completed_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Update status, hash and completion time after a transition
    pub async fn update_status(
        pool: &SqlitePool,
        id: &str,
        status: &str,
        tx_hash: Option<&str>,
        completed_at: Option<DateTime<Utc>>,
    ) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE wallet_transactions SET status = ?, tx_hash = COALESCE(?, tx_hash), completed_at = ?
             WHERE id = ?",
        )
        .bind(status)
        .bind(tx_hash)
        .bind(completed_at)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("WalletTransaction", id));
        }
        Ok(())
    }
}

// ============================================================================
// Requisite Repository
// ============================================================================

/// Repository for the `requisites` table
pub struct RequisiteRepo;

impl RequisiteRepo {
    /// Fetch a requisite by ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<RequisiteRow> {
        sqlx::query_as::<_, RequisiteRow>("SELECT * FROM requisites WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Requisite", id))
    }

    /// Fetch a trader's requisites
    pub async fn get_by_trader(
        pool: &SqlitePool,
        trader_id: &str,
    ) -> PersistenceResult<Vec<RequisiteRow>> {
        let rows = sqlx::query_as::<_, RequisiteRow>(
            "SELECT * FROM requisites WHERE trader_id = ? ORDER BY created_at",
        )
        .bind(trader_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert a new requisite
    pub async fn insert(pool: &SqlitePool, row: &RequisiteRow) -> PersistenceResult<()> {
        sqlx::query(
            "INSERT INTO requisites (id, trader_id, kind, bank_name, card_number, account_number, phone,
                                     holder_name, is_active, daily_limit, daily_used, monthly_limit,
                                     monthly_used, total_processed, transactions_count, created_at,
                                     last_used_at, methods)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.trader_id)
        .bind(&row.kind)
        .bind(&row.bank_name)
        .bind(&row.card_number)
        .bind(&row.account_number)
        .bind(&row.phone)
        .bind(&row.holder_name)
        .bind(row.is_active)
        .bind(&row.daily_limit)
        .bind(&row.daily_used)
        .bind(&row.monthly_limit)
        .bind(&row.monthly_used)
        .bind(&row.total_processed)
        .bind(row.transactions_count)
        .bind(row.created_at)
        .bind(row.last_used_at)
        .bind(&row.methods)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Write back limit counters after a recorded usage
    pub async fn update_usage(pool: &SqlitePool, row: &RequisiteRow) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE requisites SET daily_used = ?, monthly_used = ?, total_processed = ?,
                                   transactions_count = ?, last_used_at = ?
             WHERE id = ?",
        )
        .bind(&row.daily_used)
        .bind(&row.monthly_used)
        .bind(&row.total_processed)
        .bind(row.transactions_count)
        .bind(row.last_used_at)
        .bind(&row.id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Requisite", &row.id));
        }
        Ok(())
    }

    /// Activate or deactivate a requisite
    pub async fn set_active(pool: &SqlitePool, id: &str, active: bool) -> PersistenceResult<()> {
        let result = sqlx::query("UPDATE requisites SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Requisite", id));
        }
        Ok(())
    }
}

// ============================================================================
// Dispute Repository
// ============================================================================

/// Repository for the `disputes` table
pub struct DisputeRepo;

impl DisputeRepo {
    /// Fetch a dispute by ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<DisputeRow> {
        sqlx::query_as::<_, DisputeRow>("SELECT * FROM disputes WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Dispute", id))
    }

    /// Fetch a trader's disputes, newest first
    pub async fn get_by_trader(
        pool: &SqlitePool,
        trader_id: &str,
    ) -> PersistenceResult<Vec<DisputeRow>> {
        let rows = sqlx::query_as::<_, DisputeRow>(
            "SELECT * FROM disputes WHERE trader_id = ? ORDER BY created_at DESC",
        )
        .bind(trader_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Fetch every dispute, newest first
    pub async fn get_all(pool: &SqlitePool) -> PersistenceResult<Vec<DisputeRow>> {
        let rows = sqlx::query_as::<_, DisputeRow>(
            "SELECT * FROM disputes ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Fetch all disputes with a given status
    pub async fn get_by_status(
        pool: &SqlitePool,
        status: &str,
    ) -> PersistenceResult<Vec<DisputeRow>> {
        let rows = sqlx::query_as::<_, DisputeRow>(
            "SELECT * FROM disputes WHERE status = ? ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert a new dispute
    pub async fn insert(pool: &SqlitePool, row: &DisputeRow) -> PersistenceResult<()> {
        sqlx::query(
            "INSERT INTO disputes (id, transaction_id, trader_id, amount, amount_usdt, status, reason,
                                   description, client_message, trader_response, created_at, deadline_at, resolved_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.transaction_id)
        .bind(&row.trader_id)
        .bind(&row.amount)
        .bind(&row.amount_usdt)
        .bind(&row.status)
        .bind(&row.reason)
        .bind(&row.description)
        .bind(&row.client_message)
        .bind(&row.trader_response)
        .bind(row.created_at)
        .bind(row.deadline_at)
        .bind(row.resolved_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Write back lifecycle fields after respond/resolve
    pub async fn update(pool: &SqlitePool, row: &DisputeRow) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE disputes SET status = ?, trader_response = ?, resolved_at = ?
             WHERE id = ?",
        )
        .bind(&row.status)
        .bind(&row.trader_response)
        .bind(row.resolved_at)
        .bind(&row.id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Dispute", &row.id));
        }
        Ok(())
    }
}

// ============================================================================
// Bank Notification Repository
// ============================================================================

/// Repository for the `bank_notifications` table
pub struct NotificationRepo;

impl NotificationRepo {
    /// Fetch a notification by ID
    pub async fn get_by_id(
        pool: &SqlitePool,
        id: &str,
    ) -> PersistenceResult<BankNotificationRow> {
        sqlx::query_as::<_, BankNotificationRow>("SELECT * FROM bank_notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("BankNotification", id))
    }

    /// Fetch a page of a trader's notifications, newest first
    pub async fn get_by_trader(
        pool: &SqlitePool,
        trader_id: &str,
        limit: i64,
        offset: i64,
    ) -> PersistenceResult<Vec<BankNotificationRow>> {
        let rows = sqlx::query_as::<_, BankNotificationRow>(
            "SELECT * FROM bank_notifications WHERE trader_id = ?
             ORDER BY posted_time DESC LIMIT ? OFFSET ?",
        )
        .bind(trader_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert a new notification
    pub async fn insert(pool: &SqlitePool, row: &BankNotificationRow) -> PersistenceResult<()> {
        sqlx::query(
            "INSERT INTO bank_notifications (id, trader_id, app_package, app_name, notification_title,
                                             notification_text, posted_time, amount, card_last4, operation,
                                             is_processed, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.trader_id)
        .bind(&row.app_package)
        .bind(&row.app_name)
        .bind(&row.notification_title)
        .bind(&row.notification_text)
        .bind(row.posted_time)
        .bind(&row.amount)
        .bind(&row.card_last4)
        .bind(&row.operation)
        .bind(row.is_processed)
        .bind(row.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a notification as matched against a payin
    pub async fn mark_processed(pool: &SqlitePool, id: &str) -> PersistenceResult<()> {
        let result = sqlx::query("UPDATE bank_notifications SET is_processed = 1 WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("BankNotification", id));
        }
        Ok(())
    }

    /// Count notifications not yet matched
    pub async fn count_unprocessed(pool: &SqlitePool, trader_id: &str) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bank_notifications WHERE trader_id = ? AND is_processed = 0",
        )
        .bind(trader_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
