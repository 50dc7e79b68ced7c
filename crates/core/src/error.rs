//! # Error Module
//!
//! Domain errors for AdvancePay core, defined with thiserror.

use rust_decimal::Decimal;
use thiserror::Error;

/// Core domain errors.
///
/// Pure business-rule failures, independent of any infrastructure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    // === Amount errors ===
    #[error("Invalid amount: {0} (must be non-negative)")]
    InvalidInput(Decimal),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Amount overflow")]
    Overflow,

    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    // === Trader errors ===
    #[error("Trader not found: {0}")]
    TraderNotFound(String),

    #[error("Trader is deactivated: {0}")]
    TraderInactive(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // === Requisite errors ===
    #[error("Requisite is inactive: {0}")]
    RequisiteInactive(String),

    #[error("Daily limit exceeded: {used} used + {amount} requested > {limit} limit")]
    DailyLimitExceeded {
        used: Decimal,
        amount: Decimal,
        limit: Decimal,
    },

    #[error("Monthly limit exceeded: {used} used + {amount} requested > {limit} limit")]
    MonthlyLimitExceeded {
        used: Decimal,
        amount: Decimal,
        limit: Decimal,
    },

    // === Lifecycle errors ===
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // === Validation errors ===
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Result type alias with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Check whether this is an insufficient-funds error
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, CoreError::InsufficientFunds { .. })
    }

    /// Check whether this is a permission error
    pub fn is_permission_error(&self) -> bool {
        matches!(self, CoreError::PermissionDenied(_))
    }

    /// Check whether this is a limit-window error
    pub fn is_limit_error(&self) -> bool {
        matches!(
            self,
            CoreError::DailyLimitExceeded { .. } | CoreError::MonthlyLimitExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = CoreError::InsufficientFunds {
            required: dec!(1000),
            available: dec!(500),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: required 1000, available 500"
        );

        let err = CoreError::InvalidInput(dec!(-10));
        assert!(err.to_string().contains("-10"));
    }

    #[test]
    fn test_error_checks() {
        let err = CoreError::InsufficientFunds {
            required: dec!(100),
            available: dec!(50),
        };
        assert!(err.is_insufficient_funds());

        let err = CoreError::PermissionDenied("set security".to_string());
        assert!(err.is_permission_error());

        let err = CoreError::DailyLimitExceeded {
            used: dec!(290000),
            amount: dec!(20000),
            limit: dec!(300000),
        };
        assert!(err.is_limit_error());
    }
}
