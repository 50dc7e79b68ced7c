//! # Requisite Module
//!
//! A trader's receiving instruments (cards, accounts, SBP phone numbers)
//! with daily and monthly turnover limits.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of receiving instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequisiteKind {
    Card,
    Account,
    Sbp,
}

impl RequisiteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequisiteKind::Card => "card",
            RequisiteKind::Account => "account",
            RequisiteKind::Sbp => "sbp",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "card" => Some(RequisiteKind::Card),
            "account" => Some(RequisiteKind::Account),
            "sbp" => Some(RequisiteKind::Sbp),
            _ => None,
        }
    }
}

impl fmt::Display for RequisiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment method a requisite can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Sbp,
    Card,
    Account,
    Qr,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Sbp => "sbp",
            PaymentMethod::Card => "card",
            PaymentMethod::Account => "account",
            PaymentMethod::Qr => "qr",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sbp" => Some(PaymentMethod::Sbp),
            "card" => Some(PaymentMethod::Card),
            "account" => Some(PaymentMethod::Account),
            "qr" => Some(PaymentMethod::Qr),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A receiving instrument with limit windows. All amounts are RUB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requisite {
    pub id: String,
    pub trader_id: String,
    pub kind: RequisiteKind,
    pub bank_name: String,
    /// Masked card number ("4276 **** **** 4532")
    pub card_number: Option<String>,
    pub account_number: Option<String>,
    pub phone: Option<String>,
    pub holder_name: String,
    pub is_active: bool,
    pub daily_limit: Decimal,
    pub daily_used: Decimal,
    pub monthly_limit: Decimal,
    pub monthly_used: Decimal,
    /// Lifetime turnover
    pub total_processed: Decimal,
    pub transactions_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub methods: Vec<PaymentMethod>,
}

impl Requisite {
    /// Create a card requisite
    pub fn card(
        id: &str,
        trader_id: &str,
        bank_name: &str,
        card_number: &str,
        holder_name: &str,
        daily_limit: Decimal,
        monthly_limit: Decimal,
    ) -> Self {
        Self {
            id: id.to_string(),
            trader_id: trader_id.to_string(),
            kind: RequisiteKind::Card,
            bank_name: bank_name.to_string(),
            card_number: Some(card_number.to_string()),
            account_number: None,
            phone: None,
            holder_name: holder_name.to_string(),
            is_active: true,
            daily_limit,
            daily_used: Decimal::ZERO,
            monthly_limit,
            monthly_used: Decimal::ZERO,
            total_processed: Decimal::ZERO,
            transactions_count: 0,
            created_at: Utc::now(),
            last_used_at: None,
            methods: vec![PaymentMethod::Card],
        }
    }

    /// Create an SBP requisite keyed by phone number
    pub fn sbp(
        id: &str,
        trader_id: &str,
        bank_name: &str,
        phone: &str,
        holder_name: &str,
        daily_limit: Decimal,
        monthly_limit: Decimal,
    ) -> Self {
        Self {
            id: id.to_string(),
            trader_id: trader_id.to_string(),
            kind: RequisiteKind::Sbp,
            bank_name: bank_name.to_string(),
            card_number: None,
            account_number: None,
            phone: Some(phone.to_string()),
            holder_name: holder_name.to_string(),
            is_active: true,
            daily_limit,
            daily_used: Decimal::ZERO,
            monthly_limit,
            monthly_used: Decimal::ZERO,
            total_processed: Decimal::ZERO,
            transactions_count: 0,
            created_at: Utc::now(),
            last_used_at: None,
            methods: vec![PaymentMethod::Sbp],
        }
    }

    /// Extend the supported payment methods
    pub fn with_methods(mut self, methods: Vec<PaymentMethod>) -> Self {
        self.methods = methods;
        self
    }

    /// Room left in the daily window
    pub fn remaining_daily(&self) -> Decimal {
        (self.daily_limit - self.daily_used).max(Decimal::ZERO)
    }

    /// Room left in the monthly window
    pub fn remaining_monthly(&self) -> Decimal {
        (self.monthly_limit - self.monthly_used).max(Decimal::ZERO)
    }

    /// Record a processed payment against both limit windows.
    ///
    /// Rejects the amount if either window would overflow; nothing is
    /// recorded in that case.
    pub fn record_usage(&mut self, amount: Decimal) -> CoreResult<()> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(amount));
        }
        if !self.is_active {
            return Err(CoreError::RequisiteInactive(self.id.clone()));
        }
        if self.daily_used + amount > self.daily_limit {
            return Err(CoreError::DailyLimitExceeded {
                used: self.daily_used,
                amount,
                limit: self.daily_limit,
            });
        }
        if self.monthly_used + amount > self.monthly_limit {
            return Err(CoreError::MonthlyLimitExceeded {
                used: self.monthly_used,
                amount,
                limit: self.monthly_limit,
            });
        }

        self.daily_used += amount;
        self.monthly_used += amount;
        self.total_processed += amount;
        self.transactions_count += 1;
        self.last_used_at = Some(Utc::now());
        Ok(())
    }

    /// Reset the daily window (midnight rollover)
    pub fn reset_daily(&mut self) {
        self.daily_used = Decimal::ZERO;
    }

    /// Reset the monthly window
    pub fn reset_monthly(&mut self) {
        self.monthly_used = Decimal::ZERO;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }
}

impl fmt::Display for Requisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} (daily {}/{}, monthly {}/{})",
            self.id,
            self.kind,
            self.bank_name,
            self.daily_used,
            self.daily_limit,
            self.monthly_used,
            self.monthly_limit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn card() -> Requisite {
        Requisite::card(
            "REQ_001",
            "TRD_001",
            "Sberbank",
            "4276 **** **** 4532",
            "IVAN PETROV",
            dec!(300000),
            dec!(5000000),
        )
    }

    #[test]
    fn test_usage_accumulates() {
        let mut req = card();
        req.record_usage(dec!(145000)).unwrap();
        req.record_usage(dec!(5000)).unwrap();

        assert_eq!(req.daily_used, dec!(150000));
        assert_eq!(req.monthly_used, dec!(150000));
        assert_eq!(req.total_processed, dec!(150000));
        assert_eq!(req.transactions_count, 2);
        assert!(req.last_used_at.is_some());
    }

    #[test]
    fn test_daily_limit_enforced() {
        let mut req = card();
        req.record_usage(dec!(290000)).unwrap();

        let err = req.record_usage(dec!(20000)).unwrap_err();
        assert!(err.is_limit_error());
        // Nothing recorded on rejection
        assert_eq!(req.daily_used, dec!(290000));
        assert_eq!(req.transactions_count, 1);
    }

    #[test]
    fn test_monthly_limit_enforced_after_daily_resets() {
        let mut req = card();
        // 16 days at full daily limit blows the 5M monthly window
        for _ in 0..16 {
            match req.record_usage(dec!(300000)) {
                Ok(()) => req.reset_daily(),
                Err(err) => {
                    assert!(matches!(err, CoreError::MonthlyLimitExceeded { .. }));
                    return;
                }
            }
        }
        panic!("monthly limit never tripped");
    }

    #[test]
    fn test_inactive_requisite_rejected() {
        let mut req = card();
        req.deactivate();
        let err = req.record_usage(dec!(100)).unwrap_err();
        assert!(matches!(err, CoreError::RequisiteInactive(_)));
    }

    #[test]
    fn test_remaining_windows() {
        let mut req = card();
        req.record_usage(dec!(145000)).unwrap();
        assert_eq!(req.remaining_daily(), dec!(155000));
        assert_eq!(req.remaining_monthly(), dec!(4855000));
    }
}
