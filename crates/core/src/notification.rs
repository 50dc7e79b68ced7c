//! # Notification Module
//!
//! Bank notifications relayed from trader devices. The raw title/text is
//! kept verbatim; parsed fields are filled in by the classifier at
//! ingestion time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Direction of the bank operation described by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Money arrived on the trader's requisite
    Credit,
    /// Money left the trader's requisite
    Debit,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Credit => "credit",
            OperationKind::Debit => "debit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "credit" => Some(OperationKind::Credit),
            "debit" => Some(OperationKind::Debit),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A relayed bank notification, raw plus parsed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankNotification {
    pub id: String,
    pub trader_id: String,
    /// Source app package ("ru.sberbankmobile")
    pub app_package: String,
    /// Human bank name, when recognized
    pub app_name: Option<String>,
    pub title: String,
    pub text: String,
    /// When the notification was posted on the device
    pub posted_time: DateTime<Utc>,
    /// Parsed RUB amount, if the text matched
    pub amount: Option<Decimal>,
    /// Parsed card last-4
    pub card_last4: Option<String>,
    /// Credit/debit classification
    pub operation: Option<OperationKind>,
    /// Whether the platform has matched this against a payin
    pub is_processed: bool,
    pub created_at: DateTime<Utc>,
}

impl BankNotification {
    pub fn new(
        trader_id: &str,
        app_package: &str,
        title: &str,
        text: &str,
        posted_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trader_id: trader_id.to_string(),
            app_package: app_package.to_string(),
            app_name: None,
            title: title.to_string(),
            text: text.to_string(),
            posted_time,
            amount: None,
            card_last4: None,
            operation: None,
            is_processed: false,
            created_at: Utc::now(),
        }
    }

    pub fn mark_processed(&mut self) {
        self.is_processed = true;
    }

    /// Whether the parsed fields describe an incoming payment usable for
    /// payin confirmation.
    pub fn is_incoming_payment(&self) -> bool {
        self.operation == Some(OperationKind::Credit) && self.amount.is_some()
    }
}

impl fmt::Display for BankNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {:?} {:?}",
            self.app_package, self.trader_id, self.operation, self.amount
        )
    }
}
