//! # Transaction Module
//!
//! On-platform USDT movements: chain deposits observed by the balance
//! watcher and withdrawal requests raised by traders.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Direction of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletTransactionKind {
    /// Funds arriving from the chain
    Deposit,
    /// Funds leaving to an external address
    Withdraw,
}

impl WalletTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTransactionKind::Deposit => "deposit",
            WalletTransactionKind::Withdraw => "withdraw",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(WalletTransactionKind::Deposit),
            "withdraw" => Some(WalletTransactionKind::Withdraw),
            _ => None,
        }
    }
}

impl fmt::Display for WalletTransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a wallet transaction.
///
/// Deposits observed from the chain arrive already Completed; withdrawal
/// requests start Pending and settle or are cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletTransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl WalletTransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletTransactionStatus::Pending => "pending",
            WalletTransactionStatus::Completed => "completed",
            WalletTransactionStatus::Failed => "failed",
            WalletTransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(WalletTransactionStatus::Pending),
            "completed" => Some(WalletTransactionStatus::Completed),
            "failed" => Some(WalletTransactionStatus::Failed),
            "cancelled" => Some(WalletTransactionStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal statuses cannot transition further
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WalletTransactionStatus::Pending)
    }
}

impl fmt::Display for WalletTransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single USDT movement on a trader's wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// UUID
    pub id: String,
    /// Owning trader
    pub trader_id: String,
    pub kind: WalletTransactionKind,
    /// Amount in USDT
    pub amount: Decimal,
    pub status: WalletTransactionStatus,
    /// On-chain transaction hash, once known
    pub tx_hash: Option<String>,
    /// Destination address (withdrawals only)
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WalletTransaction {
    /// An observed chain deposit - already completed.
    pub fn deposit(trader_id: &str, amount: Decimal, tx_hash: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trader_id: trader_id.to_string(),
            kind: WalletTransactionKind::Deposit,
            amount,
            status: WalletTransactionStatus::Completed,
            tx_hash: tx_hash.map(str::to_string),
            address: None,
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
        }
    }

    /// A withdrawal request - pending until settled on-chain.
    pub fn withdrawal_request(trader_id: &str, amount: Decimal, address: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trader_id: trader_id.to_string(),
            kind: WalletTransactionKind::Withdraw,
            amount,
            status: WalletTransactionStatus::Pending,
            tx_hash: None,
            address: Some(address.to_string()),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn transition(&mut self, to: WalletTransactionStatus) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        self.status = to;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark a pending withdrawal as settled on-chain.
    pub fn complete(&mut self, tx_hash: &str) -> CoreResult<()> {
        self.transition(WalletTransactionStatus::Completed)?;
        self.tx_hash = Some(tx_hash.to_string());
        Ok(())
    }

    /// Mark a pending withdrawal as cancelled.
    pub fn cancel(&mut self) -> CoreResult<()> {
        self.transition(WalletTransactionStatus::Cancelled)
    }

    /// Mark a pending withdrawal as failed.
    pub fn fail(&mut self) -> CoreResult<()> {
        self.transition(WalletTransactionStatus::Failed)
    }
}

impl fmt::Display for WalletTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} USDT ({})",
            self.kind, self.trader_id, self.amount, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deposit_arrives_completed() {
        let tx = WalletTransaction::deposit("TRD_001", dec!(100), Some("0xabc"));
        assert_eq!(tx.kind, WalletTransactionKind::Deposit);
        assert_eq!(tx.status, WalletTransactionStatus::Completed);
        assert!(tx.completed_at.is_some());
    }

    #[test]
    fn test_withdrawal_lifecycle() {
        let mut tx = WalletTransaction::withdrawal_request(
            "TRD_001",
            dec!(250),
            "TJYxNdv3T1QQHrWYPTQJYNqPJqGJLQxnVZ",
        );
        assert_eq!(tx.status, WalletTransactionStatus::Pending);
        assert!(tx.completed_at.is_none());

        tx.complete("0xdeadbeef").unwrap();
        assert_eq!(tx.status, WalletTransactionStatus::Completed);
        assert_eq!(tx.tx_hash.as_deref(), Some("0xdeadbeef"));

        // Terminal - no further transitions
        let err = tx.cancel().unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_cancel_pending() {
        let mut tx = WalletTransaction::withdrawal_request("TRD_001", dec!(50), "T123");
        tx.cancel().unwrap();
        assert_eq!(tx.status, WalletTransactionStatus::Cancelled);
        assert!(tx.status.is_terminal());
    }

    #[test]
    fn test_status_str_roundtrip() {
        for status in [
            WalletTransactionStatus::Pending,
            WalletTransactionStatus::Completed,
            WalletTransactionStatus::Failed,
            WalletTransactionStatus::Cancelled,
        ] {
            assert_eq!(
                WalletTransactionStatus::from_str(status.as_str()),
                Some(status)
            );
        }
    }
}
