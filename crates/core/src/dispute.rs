//! # Dispute Module
//!
//! Client disputes raised against processed payments. Each dispute is
//! tied to one transaction and walks open -> pending -> won/lost.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    /// Newly opened, waiting for the trader
    Open,
    /// Trader responded, waiting for arbitration
    Pending,
    /// Closed without a winner (e.g. client withdrew the claim)
    Resolved,
    /// Trader won
    Won,
    /// Trader lost
    Lost,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "open",
            DisputeStatus::Pending => "pending",
            DisputeStatus::Resolved => "resolved",
            DisputeStatus::Won => "won",
            DisputeStatus::Lost => "lost",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(DisputeStatus::Open),
            "pending" => Some(DisputeStatus::Pending),
            "resolved" => Some(DisputeStatus::Resolved),
            "won" => Some(DisputeStatus::Won),
            "lost" => Some(DisputeStatus::Lost),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            DisputeStatus::Resolved | DisputeStatus::Won | DisputeStatus::Lost
        )
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why the client opened the dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeReason {
    PaymentNotReceived,
    AmountMismatch,
    DuplicatePayment,
    WrongDetails,
    Timeout,
    Other,
}

impl DisputeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeReason::PaymentNotReceived => "payment_not_received",
            DisputeReason::AmountMismatch => "amount_mismatch",
            DisputeReason::DuplicatePayment => "duplicate_payment",
            DisputeReason::WrongDetails => "wrong_details",
            DisputeReason::Timeout => "timeout",
            DisputeReason::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "payment_not_received" => Some(DisputeReason::PaymentNotReceived),
            "amount_mismatch" => Some(DisputeReason::AmountMismatch),
            "duplicate_payment" => Some(DisputeReason::DuplicatePayment),
            "wrong_details" => Some(DisputeReason::WrongDetails),
            "timeout" => Some(DisputeReason::Timeout),
            "other" => Some(DisputeReason::Other),
            _ => None,
        }
    }
}

impl fmt::Display for DisputeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client dispute over a processed payment.
///
/// `amount` is the bank-side RUB figure, `amount_usdt` the platform
/// equivalent at the rate in effect when the dispute was opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: String,
    pub transaction_id: String,
    pub trader_id: String,
    pub amount: Decimal,
    pub amount_usdt: Decimal,
    pub status: DisputeStatus,
    pub reason: DisputeReason,
    pub description: Option<String>,
    pub client_message: Option<String>,
    pub trader_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Dispute {
    /// Open a dispute with a response deadline in `deadline_hours`.
    pub fn open(
        transaction_id: &str,
        trader_id: &str,
        amount: Decimal,
        amount_usdt: Decimal,
        reason: DisputeReason,
        deadline_hours: i64,
    ) -> CoreResult<Self> {
        if amount < Decimal::ZERO {
            return Err(CoreError::InvalidInput(amount));
        }
        if amount_usdt < Decimal::ZERO {
            return Err(CoreError::InvalidInput(amount_usdt));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction_id.to_string(),
            trader_id: trader_id.to_string(),
            amount,
            amount_usdt,
            status: DisputeStatus::Open,
            reason,
            description: None,
            client_message: None,
            trader_response: None,
            created_at: now,
            deadline_at: Some(now + Duration::hours(deadline_hours)),
            resolved_at: None,
        })
    }

    pub fn with_client_message(mut self, message: &str) -> Self {
        self.client_message = Some(message.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Trader answers the claim; moves Open -> Pending.
    pub fn respond(&mut self, response: &str) -> CoreResult<()> {
        if self.status != DisputeStatus::Open {
            return Err(CoreError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: DisputeStatus::Pending.as_str().to_string(),
            });
        }
        self.trader_response = Some(response.to_string());
        self.status = DisputeStatus::Pending;
        Ok(())
    }

    /// Close the dispute with a final outcome (Resolved, Won or Lost).
    ///
    /// Resolution records the outcome only; it never moves ledger funds.
    pub fn resolve(&mut self, outcome: DisputeStatus) -> CoreResult<()> {
        if !outcome.is_closed() {
            return Err(CoreError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: outcome.as_str().to_string(),
            });
        }
        if self.status.is_closed() {
            return Err(CoreError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: outcome.as_str().to_string(),
            });
        }
        self.status = outcome;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// Whether the response deadline has passed without the dispute
    /// being closed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_closed() && self.deadline_at.map_or(false, |d| now > d)
    }
}

impl fmt::Display for Dispute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dispute {} on {} ({} RUB / {} USDT, {}, {})",
            self.id, self.transaction_id, self.amount, self.amount_usdt, self.reason, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dispute() -> Dispute {
        Dispute::open(
            "ORD-45618",
            "TRD_001",
            dec!(3500),
            dec!(37.86),
            DisputeReason::PaymentNotReceived,
            24,
        )
        .unwrap()
    }

    #[test]
    fn test_open_sets_deadline() {
        let d = dispute();
        assert_eq!(d.status, DisputeStatus::Open);
        let deadline = d.deadline_at.unwrap();
        assert!(deadline > d.created_at);
        assert_eq!((deadline - d.created_at).num_hours(), 24);
    }

    #[test]
    fn test_respond_then_resolve() {
        let mut d = dispute();
        d.respond("Payment confirmed, receipt attached").unwrap();
        assert_eq!(d.status, DisputeStatus::Pending);

        d.resolve(DisputeStatus::Won).unwrap();
        assert_eq!(d.status, DisputeStatus::Won);
        assert!(d.resolved_at.is_some());
    }

    #[test]
    fn test_double_resolve_rejected() {
        let mut d = dispute();
        d.resolve(DisputeStatus::Lost).unwrap();
        assert!(d.resolve(DisputeStatus::Won).is_err());
    }

    #[test]
    fn test_resolve_requires_closed_outcome() {
        let mut d = dispute();
        assert!(d.resolve(DisputeStatus::Open).is_err());
        assert!(d.resolve(DisputeStatus::Pending).is_err());
    }

    #[test]
    fn test_respond_only_when_open() {
        let mut d = dispute();
        d.respond("first").unwrap();
        assert!(d.respond("second").is_err());
    }

    #[test]
    fn test_overdue() {
        let mut d = dispute();
        let past_deadline = d.deadline_at.unwrap() + Duration::hours(1);
        assert!(d.is_overdue(past_deadline));
        assert!(!d.is_overdue(d.created_at));

        d.resolve(DisputeStatus::Resolved).unwrap();
        assert!(!d.is_overdue(past_deadline));
    }

    #[test]
    fn test_negative_amounts_rejected() {
        assert!(Dispute::open(
            "ORD-1",
            "TRD_001",
            dec!(-1),
            dec!(0),
            DisputeReason::Other,
            24
        )
        .is_err());
    }
}
