//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables. Decimals are stored as
//! TEXT and re-parsed on read so no precision is lost in the database.

use crate::error::{PersistenceError, PersistenceResult};
use advancepay_core::{
    BankNotification, DepositLedger, Dispute, DisputeReason, DisputeStatus, OperationKind,
    PaymentMethod, Requisite, RequisiteKind, Trader, TraderRole, WalletTransaction,
    WalletTransactionKind, WalletTransactionStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

fn parse_decimal(value: &str) -> PersistenceResult<Decimal> {
    Decimal::from_str(value).map_err(|_| PersistenceError::InvalidDecimal(value.to_string()))
}

fn parse_enum<T>(
    field: &str,
    value: &str,
    parser: impl Fn(&str) -> Option<T>,
) -> PersistenceResult<T> {
    parser(value).ok_or_else(|| PersistenceError::InvalidEnumValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Row type for the `traders` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TraderRow {
    pub id: String,
    pub username: String,
    pub role: String,
    pub team_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Trader> for TraderRow {
    fn from(trader: &Trader) -> Self {
        Self {
            id: trader.id.clone(),
            username: trader.username.clone(),
            role: trader.role.as_str().to_string(),
            team_id: trader.team_id.clone(),
            is_active: trader.is_active,
            created_at: trader.created_at,
        }
    }
}

impl TryFrom<TraderRow> for Trader {
    type Error = PersistenceError;

    fn try_from(row: TraderRow) -> PersistenceResult<Self> {
        let role = parse_enum("role", &row.role, TraderRole::from_str)?;
        Ok(Trader {
            id: row.id,
            username: row.username,
            role,
            team_id: row.team_id,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Row type for the `ledgers` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LedgerRow {
    pub trader_id: String,
    pub total_deposited: String,
    pub required_security: String,
    pub pending_withdrawal: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&DepositLedger> for LedgerRow {
    fn from(ledger: &DepositLedger) -> Self {
        Self {
            trader_id: ledger.trader_id.clone(),
            total_deposited: ledger.total_deposited.to_string(),
            required_security: ledger.required_security.to_string(),
            pending_withdrawal: ledger.pending_withdrawal.to_string(),
            updated_at: ledger.updated_at,
        }
    }
}

impl TryFrom<LedgerRow> for DepositLedger {
    type Error = PersistenceError;

    fn try_from(row: LedgerRow) -> PersistenceResult<Self> {
        let ledger = DepositLedger::from_parts(
            &row.trader_id,
            parse_decimal(&row.total_deposited)?,
            parse_decimal(&row.required_security)?,
            parse_decimal(&row.pending_withdrawal)?,
            row.updated_at,
        )?;
        Ok(ledger)
    }
}

/// Row type for the `wallet_transactions` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WalletTransactionRow {
    pub id: String,
    pub trader_id: String,
    pub kind: String,
    pub amount: String,
    pub status: String,
    pub tx_hash: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&WalletTransaction> for WalletTransactionRow {
    fn from(tx: &WalletTransaction) -> Self {
        Self {
            id: tx.id.clone(),
            trader_id: tx.trader_id.clone(),
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount.to_string(),
            status: tx.status.as_str().to_string(),
            tx_hash: tx.tx_hash.clone(),
            address: tx.address.clone(),
            created_at: tx.created_at,
            completed_at: tx.completed_at,
        }
    }
}

impl TryFrom<WalletTransactionRow> for WalletTransaction {
    type Error = PersistenceError;

    fn try_from(row: WalletTransactionRow) -> PersistenceResult<Self> {
        Ok(WalletTransaction {
            kind: parse_enum("kind", &row.kind, WalletTransactionKind::from_str)?,
            status: parse_enum("status", &row.status, WalletTransactionStatus::from_str)?,
            amount: parse_decimal(&row.amount)?,
            id: row.id,
            trader_id: row.trader_id,
            tx_hash: row.tx_hash,
            address: row.address,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

/// Row type for the `requisites` table. Payment methods are stored as a
/// JSON array in a TEXT column.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RequisiteRow {
    pub id: String,
    pub trader_id: String,
    pub kind: String,
    pub bank_name: String,
    pub card_number: Option<String>,
    pub account_number: Option<String>,
    pub phone: Option<String>,
    pub holder_name: String,
    pub is_active: bool,
    pub daily_limit: String,
    pub daily_used: String,
    pub monthly_limit: String,
    pub monthly_used: String,
    pub total_processed: String,
    pub transactions_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub methods: String,
}

impl From<&Requisite> for RequisiteRow {
    fn from(req: &Requisite) -> Self {
        let methods: Vec<&str> = req.methods.iter().map(|m| m.as_str()).collect();
        Self {
            id: req.id.clone(),
            trader_id: req.trader_id.clone(),
            kind: req.kind.as_str().to_string(),
            bank_name: req.bank_name.clone(),
            card_number: req.card_number.clone(),
            account_number: req.account_number.clone(),
            phone: req.phone.clone(),
            holder_name: req.holder_name.clone(),
            is_active: req.is_active,
            daily_limit: req.daily_limit.to_string(),
            daily_used: req.daily_used.to_string(),
            monthly_limit: req.monthly_limit.to_string(),
            monthly_used: req.monthly_used.to_string(),
            total_processed: req.total_processed.to_string(),
            transactions_count: req.transactions_count as i64,
            created_at: req.created_at,
            last_used_at: req.last_used_at,
            methods: serde_json::to_string(&methods).unwrap_or_else(|_| "[]".to_string()),
        }
    }
}

impl TryFrom<RequisiteRow> for Requisite {
    type Error = PersistenceError;

    fn try_from(row: RequisiteRow) -> PersistenceResult<Self> {
        let method_codes: Vec<String> = serde_json::from_str(&row.methods)?;
        let mut methods = Vec::with_capacity(method_codes.len());
        for code in &method_codes {
            methods.push(parse_enum("methods", code, PaymentMethod::from_str)?);
        }
        Ok(Requisite {
            kind: parse_enum("kind", &row.kind, RequisiteKind::from_str)?,
            daily_limit: parse_decimal(&row.daily_limit)?,
            daily_used: parse_decimal(&row.daily_used)?,
            monthly_limit: parse_decimal(&row.monthly_limit)?,
            monthly_used: parse_decimal(&row.monthly_used)?,
            total_processed: parse_decimal(&row.total_processed)?,
            transactions_count: row.transactions_count as u32,
            id: row.id,
            trader_id: row.trader_id,
            bank_name: row.bank_name,
            card_number: row.card_number,
            account_number: row.account_number,
            phone: row.phone,
            holder_name: row.holder_name,
            is_active: row.is_active,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
            methods,
        })
    }
}

/// Row type for the `disputes` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct DisputeRow {
    pub id: String,
    pub transaction_id: String,
    pub trader_id: String,
    pub amount: String,
    pub amount_usdt: String,
    pub status: String,
    pub reason: String,
    pub description: Option<String>,
    pub client_message: Option<String>,
    pub trader_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<&Dispute> for DisputeRow {
    fn from(dispute: &Dispute) -> Self {
        Self {
            id: dispute.id.clone(),
            transaction_id: dispute.transaction_id.clone(),
            trader_id: dispute.trader_id.clone(),
            amount: dispute.amount.to_string(),
            amount_usdt: dispute.amount_usdt.to_string(),
            status: dispute.status.as_str().to_string(),
            reason: dispute.reason.as_str().to_string(),
            description: dispute.description.clone(),
            client_message: dispute.client_message.clone(),
            trader_response: dispute.trader_response.clone(),
            created_at: dispute.created_at,
            deadline_at: dispute.deadline_at,
            resolved_at: dispute.resolved_at,
        }
    }
}

impl TryFrom<DisputeRow> for Dispute {
    type Error = PersistenceError;

    fn try_from(row: DisputeRow) -> PersistenceResult<Self> {
        Ok(Dispute {
            status: parse_enum("status", &row.status, DisputeStatus::from_str)?,
            reason: parse_enum("reason", &row.reason, DisputeReason::from_str)?,
            amount: parse_decimal(&row.amount)?,
            amount_usdt: parse_decimal(&row.amount_usdt)?,
            id: row.id,
            transaction_id: row.transaction_id,
            trader_id: row.trader_id,
            description: row.description,
            client_message: row.client_message,
            trader_response: row.trader_response,
            created_at: row.created_at,
            deadline_at: row.deadline_at,
            resolved_at: row.resolved_at,
        })
    }
}

/// Row type for the `bank_notifications` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct BankNotificationRow {
    pub id: String,
    pub trader_id: String,
    pub app_package: String,
    pub app_name: Option<String>,
    pub notification_title: String,
    pub notification_text: String,
    pub posted_time: DateTime<Utc>,
    pub amount: Option<String>,
    pub card_last4: Option<String>,
    pub operation: Option<String>,
    pub is_processed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&BankNotification> for BankNotificationRow {
    fn from(n: &BankNotification) -> Self {
        Self {
            id: n.id.clone(),
            trader_id: n.trader_id.clone(),
            app_package: n.app_package.clone(),
            app_name: n.app_name.clone(),
            notification_title: n.title.clone(),
            notification_text: n.text.clone(),
            posted_time: n.posted_time,
            amount: n.amount.map(|a| a.to_string()),
            card_last4: n.card_last4.clone(),
            operation: n.operation.map(|o| o.as_str().to_string()),
            is_processed: n.is_processed,
            created_at: n.created_at,
        }
    }
}

impl TryFrom<BankNotificationRow> for BankNotification {
    type Error = PersistenceError;

    fn try_from(row: BankNotificationRow) -> PersistenceResult<Self> {
        let amount = match row.amount.as_deref() {
            Some(value) => Some(parse_decimal(value)?),
            None => None,
        };
        let operation = match row.operation.as_deref() {
            Some(value) => Some(parse_enum("operation", value, OperationKind::from_str)?),
            None => None,
        };
        Ok(BankNotification {
            id: row.id,
            trader_id: row.trader_id,
            app_package: row.app_package,
            app_name: row.app_name,
            title: row.notification_title,
            text: row.notification_text,
            posted_time: row.posted_time,
            amount,
            card_last4: row.card_last4,
            operation,
            is_processed: row.is_processed,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_row_roundtrip() {
        let mut ledger = DepositLedger::new("TRD_001", dec!(500)).unwrap();
        ledger.apply_deposit(dec!(1700)).unwrap();

        let row = LedgerRow::from(&ledger);
        assert_eq!(row.total_deposited, "1700");

        let back = DepositLedger::try_from(row).unwrap();
        assert_eq!(back, ledger);
    }

    #[test]
    fn test_ledger_row_rejects_bad_decimal() {
        let row = LedgerRow {
            trader_id: "TRD_001".to_string(),
            total_deposited: "not-a-number".to_string(),
            required_security: "0".to_string(),
            pending_withdrawal: "0".to_string(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            DepositLedger::try_from(row),
            Err(PersistenceError::InvalidDecimal(_))
        ));
    }

    #[test]
    fn test_ledger_row_rejects_negative_total() {
        let row = LedgerRow {
            trader_id: "TRD_001".to_string(),
            total_deposited: "-5".to_string(),
            required_security: "0".to_string(),
            pending_withdrawal: "0".to_string(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            DepositLedger::try_from(row),
            Err(PersistenceError::CorruptLedger(_))
        ));
    }

    #[test]
    fn test_trader_row_roundtrip() {
        let trader = Trader::team_lead("TL_001", "maria").with_team("TEAM_001");
        let row = TraderRow::from(&trader);
        assert_eq!(row.role, "teamlead");

        let back = Trader::try_from(row).unwrap();
        assert_eq!(back.role, TraderRole::TeamLead);
        assert_eq!(back.team_id.as_deref(), Some("TEAM_001"));
    }

    #[test]
    fn test_requisite_methods_json() {
        let req = Requisite::card(
            "REQ_001",
            "TRD_001",
            "Sberbank",
            "4276 **** **** 4532",
            "IVAN PETROV",
            dec!(300000),
            dec!(5000000),
        )
        .with_methods(vec![PaymentMethod::Card, PaymentMethod::Sbp]);

        let row = RequisiteRow::from(&req);
        assert_eq!(row.methods, r#"["card","sbp"]"#);

        let back = Requisite::try_from(row).unwrap();
        assert_eq!(back.methods, vec![PaymentMethod::Card, PaymentMethod::Sbp]);
    }

    #[test]
    fn test_unknown_enum_rejected() {
        let trader = Trader::trader("TRD_001", "ivan");
        let mut row = TraderRow::from(&trader);
        row.role = "wizard".to_string();
        assert!(matches!(
            Trader::try_from(row),
            Err(PersistenceError::InvalidEnumValue { .. })
        ));
    }
}
