//! # Event Module
//!
//! Audit events for the platform. Every balance-affecting operation and
//! every control-plane change appends one immutable event; the journal is
//! the ground truth for audits and investor reporting.

use crate::trader::TraderRole;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // === Account events ===
    TraderCreated,
    TraderDeactivated,

    // === Ledger events ===
    DepositObserved,
    WithdrawalRequested,
    WithdrawalCompleted,
    WithdrawalCancelled,
    SecurityRequirementChanged,

    // === Relay events ===
    NotificationIngested,

    // === Requisite events ===
    RequisiteAdded,
    RequisiteUsed,

    // === Dispute events ===
    DisputeOpened,
    DisputeResolved,

    // === Audit events ===
    AuditAccess,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TraderCreated => "trader_created",
            EventType::TraderDeactivated => "trader_deactivated",
            EventType::DepositObserved => "deposit_observed",
            EventType::WithdrawalRequested => "withdrawal_requested",
            EventType::WithdrawalCompleted => "withdrawal_completed",
            EventType::WithdrawalCancelled => "withdrawal_cancelled",
            EventType::SecurityRequirementChanged => "security_requirement_changed",
            EventType::NotificationIngested => "notification_ingested",
            EventType::RequisiteAdded => "requisite_added",
            EventType::RequisiteUsed => "requisite_used",
            EventType::DisputeOpened => "dispute_opened",
            EventType::DisputeResolved => "dispute_resolved",
            EventType::AuditAccess => "audit_access",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extra context attached to an event for tracing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetadata {
    /// IP address of the actor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Relaying device ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Source app package, for notification events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_package: Option<String>,
    /// Session ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Free-form extra data (JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl EventMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip(mut self, ip: &str) -> Self {
        self.ip_address = Some(ip.to_string());
        self
    }

    pub fn with_device(mut self, device_id: &str) -> Self {
        self.device_id = Some(device_id.to_string());
        self
    }

    pub fn with_app_package(mut self, package: &str) -> Self {
        self.app_package = Some(package.to_string());
        self
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique ID (EVT_000001, ...)
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,

    // === Actor ===
    /// Who performed the action (TRD_001, TL_001, ...)
    pub actor_id: String,
    pub actor_role: TraderRole,

    // === Target ===
    /// Trader whose state the event touches
    pub trader_id: String,
    /// Related entity (transaction, dispute, requisite, notification)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,

    // === Amount ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default)]
    pub metadata: EventMetadata,
}

impl Event {
    fn base(
        event_id: &str,
        event_type: EventType,
        actor_id: &str,
        actor_role: TraderRole,
        trader_id: &str,
    ) -> Self {
        Self {
            event_id: event_id.to_string(),
            timestamp: Utc::now(),
            event_type,
            actor_id: actor_id.to_string(),
            actor_role,
            trader_id: trader_id.to_string(),
            reference_id: None,
            amount: None,
            currency: None,
            metadata: EventMetadata::default(),
        }
    }

    fn with_usdt_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self.currency = Some("USDT".to_string());
        self
    }

    pub fn with_reference(mut self, reference_id: &str) -> Self {
        self.reference_id = Some(reference_id.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    // === Constructors, one per event type ===

    pub fn trader_created(event_id: &str, actor_id: &str, actor_role: TraderRole, trader_id: &str) -> Self {
        Self::base(event_id, EventType::TraderCreated, actor_id, actor_role, trader_id)
    }

    pub fn trader_deactivated(event_id: &str, actor_id: &str, actor_role: TraderRole, trader_id: &str) -> Self {
        Self::base(event_id, EventType::TraderDeactivated, actor_id, actor_role, trader_id)
    }

    pub fn deposit_observed(event_id: &str, trader_id: &str, amount: Decimal) -> Self {
        // The balance watcher acts on the trader's behalf
        Self::base(event_id, EventType::DepositObserved, trader_id, TraderRole::Trader, trader_id)
            .with_usdt_amount(amount)
    }

    pub fn withdrawal_requested(event_id: &str, trader_id: &str, amount: Decimal) -> Self {
        Self::base(event_id, EventType::WithdrawalRequested, trader_id, TraderRole::Trader, trader_id)
            .with_usdt_amount(amount)
    }

    pub fn withdrawal_completed(event_id: &str, trader_id: &str, amount: Decimal) -> Self {
        Self::base(event_id, EventType::WithdrawalCompleted, trader_id, TraderRole::Trader, trader_id)
            .with_usdt_amount(amount)
    }

    pub fn withdrawal_cancelled(event_id: &str, trader_id: &str, amount: Decimal) -> Self {
        Self::base(event_id, EventType::WithdrawalCancelled, trader_id, TraderRole::Trader, trader_id)
            .with_usdt_amount(amount)
    }

    pub fn security_changed(
        event_id: &str,
        actor_id: &str,
        actor_role: TraderRole,
        trader_id: &str,
        amount: Decimal,
    ) -> Self {
        Self::base(event_id, EventType::SecurityRequirementChanged, actor_id, actor_role, trader_id)
            .with_usdt_amount(amount)
    }

    pub fn notification_ingested(event_id: &str, trader_id: &str, notification_id: &str) -> Self {
        Self::base(event_id, EventType::NotificationIngested, trader_id, TraderRole::Trader, trader_id)
            .with_reference(notification_id)
    }

    pub fn requisite_added(event_id: &str, trader_id: &str, requisite_id: &str) -> Self {
        Self::base(event_id, EventType::RequisiteAdded, trader_id, TraderRole::Trader, trader_id)
            .with_reference(requisite_id)
    }

    pub fn requisite_used(event_id: &str, trader_id: &str, requisite_id: &str, amount: Decimal) -> Self {
        let mut event =
            Self::base(event_id, EventType::RequisiteUsed, trader_id, TraderRole::Trader, trader_id)
                .with_reference(requisite_id);
        event.amount = Some(amount);
        event.currency = Some("RUB".to_string());
        event
    }

    pub fn dispute_opened(event_id: &str, trader_id: &str, dispute_id: &str, amount_usdt: Decimal) -> Self {
        Self::base(event_id, EventType::DisputeOpened, trader_id, TraderRole::Trader, trader_id)
            .with_reference(dispute_id)
            .with_usdt_amount(amount_usdt)
    }

    pub fn dispute_resolved(
        event_id: &str,
        actor_id: &str,
        actor_role: TraderRole,
        trader_id: &str,
        dispute_id: &str,
    ) -> Self {
        Self::base(event_id, EventType::DisputeResolved, actor_id, actor_role, trader_id)
            .with_reference(dispute_id)
    }

    pub fn audit_access(event_id: &str, actor_id: &str, actor_role: TraderRole) -> Self {
        Self::base(event_id, EventType::AuditAccess, actor_id, actor_role, actor_id)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} by {} on {}",
            self.event_id, self.event_type, self.actor_id, self.trader_id
        )?;
        if let (Some(amount), Some(currency)) = (&self.amount, &self.currency) {
            write!(f, " ({} {})", amount, currency)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deposit_event_carries_usdt_amount() {
        let event = Event::deposit_observed("EVT_000001", "TRD_001", dec!(100));
        assert_eq!(event.event_type, EventType::DepositObserved);
        assert_eq!(event.amount, Some(dec!(100)));
        assert_eq!(event.currency.as_deref(), Some("USDT"));
    }

    #[test]
    fn test_requisite_used_is_rub() {
        let event = Event::requisite_used("EVT_000002", "TRD_001", "REQ_001", dec!(5000));
        assert_eq!(event.currency.as_deref(), Some("RUB"));
        assert_eq!(event.reference_id.as_deref(), Some("REQ_001"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let event = Event::security_changed(
            "EVT_000003",
            "TL_001",
            TraderRole::TeamLead,
            "TRD_001",
            dec!(500),
        )
        .with_metadata(EventMetadata::new().with_ip("10.0.0.1"));

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_id, "EVT_000003");
        assert_eq!(back.event_type, EventType::SecurityRequirementChanged);
        assert_eq!(back.amount, Some(dec!(500)));
        assert_eq!(back.metadata.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_amount_omitted_when_none() {
        let event = Event::trader_created("EVT_000004", "TL_001", TraderRole::TeamLead, "TRD_002");
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("\"amount\""));
        assert!(!json.contains("\"currency\""));
    }

    #[test]
    fn test_display() {
        let event = Event::deposit_observed("EVT_000005", "TRD_001", dec!(1700));
        let text = format!("{}", event);
        assert!(text.contains("deposit_observed"));
        assert!(text.contains("1700 USDT"));
    }
}
