//! Business layer errors
//!
//! Typed causes surfaced through anyhow at the service boundary.

use rust_decimal::Decimal;
use thiserror::Error;

/// Business operation errors
#[derive(Debug, Error)]
pub enum BusinessError {
    // === Validation errors ===
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Withdrawal address is required")]
    AddressRequired,

    // === Permission errors ===
    #[error("Operation not permitted for {role}: {operation}")]
    OperationNotPermitted { role: String, operation: String },

    #[error("Trader not active: {0}")]
    TraderNotActive(String),

    #[error("Not a trader account: {0}")]
    NotATrader(String),

    // === Not found errors ===
    #[error("Trader not found: {0}")]
    TraderNotFound(String),

    #[error("Ledger not found for trader: {0}")]
    LedgerNotFound(String),

    #[error("Dispute not found: {0}")]
    DisputeNotFound(String),

    // === Wrapped errors ===
    #[error("Persistence error: {0}")]
    Persistence(#[from] advancepay_persistence::PersistenceError),

    #[error("Core error: {0}")]
    Core(#[from] advancepay_core::CoreError),
}

/// Result type alias for business operations
pub type BusinessResult<T> = anyhow::Result<T>;

impl BusinessError {
    /// Create an operation-not-permitted error
    pub fn not_permitted(role: &str, operation: &str) -> Self {
        Self::OperationNotPermitted {
            role: role.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Create an invalid-amount error
    pub fn invalid_amount(context: &str, amount: Decimal) -> Self {
        Self::InvalidAmount(format!("{}: {}", context, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_not_permitted_error() {
        let err = BusinessError::not_permitted("trader", "set_required_security");
        assert!(err.to_string().contains("trader"));
        assert!(err.to_string().contains("set_required_security"));
    }

    #[test]
    fn test_invalid_amount_error() {
        let err = BusinessError::invalid_amount("Deposit must be positive", dec!(-5));
        assert!(err.to_string().contains("-5"));
    }
}
