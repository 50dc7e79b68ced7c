//! # Allocation Module
//!
//! The deposit waterfall: every USDT a trader deposits first fills the
//! security deposit required by their team lead, and only the remainder
//! becomes spendable working balance.
//!
//! `allocate` is the pure split; [`DepositLedger`] is the per-trader state
//! it is recomputed from. The split is never stored - it is derived on
//! every read, so the conservation invariant
//! `security_deposit + working_balance == total_deposited` cannot go stale.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of splitting a trader's cumulative deposits.
///
/// # Invariants
/// - `security_deposit + working_balance == total_deposited` (exact, no
///   rounding loss - Decimal arithmetic)
/// - `0 <= security_deposit <= required_security`
/// - `working_balance >= 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Portion of the total held as the mandatory security reserve
    pub security_deposit: Decimal,
    /// Portion available for payouts and withdrawal
    pub working_balance: Decimal,
    /// Whether the security requirement is fully funded
    pub security_satisfied: bool,
}

impl fmt::Display for AllocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "security {} / working {} ({})",
            self.security_deposit,
            self.working_balance,
            if self.security_satisfied {
                "closed"
            } else {
                "open"
            }
        )
    }
}

/// Split a cumulative deposit total between the security reserve and the
/// working balance, prioritizing the reserve.
///
/// Pure and idempotent: same inputs, same output, no side effects. Both
/// inputs must be non-negative; `Decimal` cannot represent NaN or
/// infinity, so negativity is the only malformed-input case.
///
/// # Examples
/// ```
/// use advancepay_core::allocation::allocate;
/// use rust_decimal::Decimal;
///
/// let split = allocate(Decimal::from(1700), Decimal::from(500)).unwrap();
/// assert_eq!(split.security_deposit, Decimal::from(500));
/// assert_eq!(split.working_balance, Decimal::from(1200));
/// assert!(split.security_satisfied);
/// ```
pub fn allocate(
    total_deposited: Decimal,
    required_security: Decimal,
) -> CoreResult<AllocationResult> {
    if total_deposited < Decimal::ZERO {
        return Err(CoreError::InvalidInput(total_deposited));
    }
    if required_security < Decimal::ZERO {
        return Err(CoreError::InvalidInput(required_security));
    }

    let security_deposit = total_deposited.min(required_security);
    let working_balance = (total_deposited - required_security).max(Decimal::ZERO);

    Ok(AllocationResult {
        security_deposit,
        working_balance,
        security_satisfied: total_deposited >= required_security,
    })
}

/// Per-trader funding state.
///
/// Owned by the trader's account record; mutated only through the methods
/// below. Callers sharing a ledger across writers must serialize those
/// calls - the ledger itself holds no lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositLedger {
    /// Trader that owns this ledger
    pub trader_id: String,
    /// Cumulative deposits, reduced only by accepted withdrawals
    pub total_deposited: Decimal,
    /// Threshold set by the team lead; read-only to the engine
    pub required_security: Decimal,
    /// Funds leaving through an in-flight withdrawal request
    pub pending_withdrawal: Decimal,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl DepositLedger {
    /// Create a ledger for a newly provisioned trader.
    pub fn new(trader_id: &str, required_security: Decimal) -> CoreResult<Self> {
        if required_security < Decimal::ZERO {
            return Err(CoreError::InvalidInput(required_security));
        }
        Ok(Self {
            trader_id: trader_id.to_string(),
            total_deposited: Decimal::ZERO,
            required_security,
            pending_withdrawal: Decimal::ZERO,
            updated_at: Utc::now(),
        })
    }

    /// Rebuild a ledger from stored values, re-validating the invariants.
    pub fn from_parts(
        trader_id: &str,
        total_deposited: Decimal,
        required_security: Decimal,
        pending_withdrawal: Decimal,
        updated_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        for value in [total_deposited, required_security, pending_withdrawal] {
            if value < Decimal::ZERO {
                return Err(CoreError::InvalidInput(value));
            }
        }
        Ok(Self {
            trader_id: trader_id.to_string(),
            total_deposited,
            required_security,
            pending_withdrawal,
            updated_at,
        })
    }

    /// Current split of `total_deposited`. Recomputed on every call.
    pub fn allocation(&self) -> AllocationResult {
        // Fields are kept non-negative by every mutation path, so the
        // validating allocate() cannot fail here.
        allocate(self.total_deposited, self.required_security)
            .expect("ledger fields are non-negative")
    }

    /// Apply an observed deposit delta and re-derive the split.
    ///
    /// The delta may be negative (an upstream correction), but never so
    /// negative that the total would drop below zero.
    pub fn apply_deposit(&mut self, delta: Decimal) -> CoreResult<AllocationResult> {
        let new_total = self
            .total_deposited
            .checked_add(delta)
            .ok_or(CoreError::Overflow)?;
        if new_total < Decimal::ZERO {
            return Err(CoreError::InsufficientFunds {
                required: -delta,
                available: self.total_deposited,
            });
        }
        self.total_deposited = new_total;
        self.updated_at = Utc::now();
        Ok(self.allocation())
    }

    /// Request a withdrawal.
    ///
    /// Withdrawal is capped at the current working balance: the security
    /// deposit can never be invaded. Accepted amounts move from
    /// `total_deposited` into `pending_withdrawal` until settled.
    pub fn request_withdrawal(&mut self, amount: Decimal) -> CoreResult<AllocationResult> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(amount));
        }
        let working = self.allocation().working_balance;
        if amount > working {
            return Err(CoreError::InsufficientFunds {
                required: amount,
                available: working,
            });
        }
        self.total_deposited -= amount;
        self.pending_withdrawal += amount;
        self.updated_at = Utc::now();
        Ok(self.allocation())
    }

    /// Settle an in-flight withdrawal that completed on-chain.
    pub fn settle_withdrawal(&mut self, amount: Decimal) -> CoreResult<()> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(amount));
        }
        if amount > self.pending_withdrawal {
            return Err(CoreError::InsufficientFunds {
                required: amount,
                available: self.pending_withdrawal,
            });
        }
        self.pending_withdrawal -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Return a cancelled or failed withdrawal to the deposit total.
    pub fn refund_withdrawal(&mut self, amount: Decimal) -> CoreResult<AllocationResult> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(amount));
        }
        if amount > self.pending_withdrawal {
            return Err(CoreError::InsufficientFunds {
                required: amount,
                available: self.pending_withdrawal,
            });
        }
        self.pending_withdrawal -= amount;
        self.total_deposited = self
            .total_deposited
            .checked_add(amount)
            .ok_or(CoreError::Overflow)?;
        self.updated_at = Utc::now();
        Ok(self.allocation())
    }

    /// Update the security requirement. Only the team-lead control plane
    /// calls this; the services layer enforces the role gate.
    pub fn set_required_security(&mut self, amount: Decimal) -> CoreResult<AllocationResult> {
        if amount < Decimal::ZERO {
            return Err(CoreError::InvalidInput(amount));
        }
        self.required_security = amount;
        self.updated_at = Utc::now();
        Ok(self.allocation())
    }
}

impl fmt::Display for DepositLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let split = self.allocation();
        write!(
            f,
            "Ledger {} (total: {}, {}, pending out: {})",
            self.trader_id, self.total_deposited, split, self.pending_withdrawal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn split(total: Decimal, required: Decimal) -> AllocationResult {
        allocate(total, required).unwrap()
    }

    #[test]
    fn test_surplus_deposit() {
        let result = split(dec!(1700), dec!(500));
        assert_eq!(result.security_deposit, dec!(500));
        assert_eq!(result.working_balance, dec!(1200));
        assert!(result.security_satisfied);
    }

    #[test]
    fn test_partial_security() {
        let result = split(dec!(300), dec!(500));
        assert_eq!(result.security_deposit, dec!(300));
        assert_eq!(result.working_balance, dec!(0));
        assert!(!result.security_satisfied);
    }

    #[test]
    fn test_both_zero() {
        let result = split(dec!(0), dec!(0));
        assert_eq!(result.security_deposit, dec!(0));
        assert_eq!(result.working_balance, dec!(0));
        assert!(result.security_satisfied);
    }

    #[test]
    fn test_exact_threshold() {
        let result = split(dec!(500), dec!(500));
        assert_eq!(result.security_deposit, dec!(500));
        assert_eq!(result.working_balance, dec!(0));
        assert!(result.security_satisfied);
    }

    #[test]
    fn test_zero_requirement_all_working() {
        let result = split(dec!(250), dec!(0));
        assert_eq!(result.security_deposit, dec!(0));
        assert_eq!(result.working_balance, dec!(250));
        assert!(result.security_satisfied);
    }

    #[test]
    fn test_zero_total_with_requirement() {
        let result = split(dec!(0), dec!(500));
        assert_eq!(result.security_deposit, dec!(0));
        assert_eq!(result.working_balance, dec!(0));
        assert!(!result.security_satisfied);
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert_eq!(
            allocate(dec!(-10), dec!(500)),
            Err(CoreError::InvalidInput(dec!(-10)))
        );
        assert_eq!(
            allocate(dec!(10), dec!(-500)),
            Err(CoreError::InvalidInput(dec!(-500)))
        );
    }

    #[test]
    fn test_conservation_and_bounds() {
        let cases = [
            (dec!(0), dec!(0)),
            (dec!(0.000001), dec!(500)),
            (dec!(499.999999), dec!(500)),
            (dec!(500), dec!(500)),
            (dec!(500.000001), dec!(500)),
            (dec!(123456789.123456), dec!(500)),
            (dec!(1700), dec!(0)),
        ];
        for (total, required) in cases {
            let result = split(total, required);
            assert_eq!(
                result.security_deposit + result.working_balance,
                total,
                "conservation failed for ({}, {})",
                total,
                required
            );
            assert!(result.security_deposit >= Decimal::ZERO);
            assert!(result.security_deposit <= required);
            assert!(result.working_balance >= Decimal::ZERO);
            assert_eq!(result.security_satisfied, total >= required);
        }
    }

    #[test]
    fn test_monotonicity_in_total() {
        let required = dec!(500);
        let mut prev = split(dec!(0), required);
        let mut total = dec!(0);
        for _ in 0..2000 {
            total += dec!(1.25);
            let next = split(total, required);
            assert!(next.security_deposit >= prev.security_deposit);
            assert!(next.working_balance >= prev.working_balance);
            prev = next;
        }
    }

    #[test]
    fn test_idempotence() {
        let a = split(dec!(1700), dec!(500));
        let b = split(dec!(1700), dec!(500));
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_drift_over_many_microtopups() {
        // 10_000 deposits of 0.000001 USDT must sum exactly
        let mut ledger = DepositLedger::new("TRD_001", dec!(500)).unwrap();
        for _ in 0..10_000 {
            ledger.apply_deposit(dec!(0.000001)).unwrap();
        }
        assert_eq!(ledger.total_deposited, dec!(0.01));
        let result = ledger.allocation();
        assert_eq!(result.security_deposit + result.working_balance, dec!(0.01));
    }

    #[test]
    fn test_incremental_topup_flips_flag() {
        let mut ledger = DepositLedger::new("TRD_001", dec!(500)).unwrap();
        ledger.apply_deposit(dec!(400)).unwrap();
        assert!(!ledger.allocation().security_satisfied);

        let result = ledger.apply_deposit(dec!(100)).unwrap();
        assert_eq!(ledger.total_deposited, dec!(500));
        assert!(result.security_satisfied);
        assert_eq!(result.working_balance, dec!(0));
    }

    #[test]
    fn test_negative_delta_below_zero_rejected() {
        let mut ledger = DepositLedger::new("TRD_001", dec!(500)).unwrap();
        ledger.apply_deposit(dec!(100)).unwrap();

        let err = ledger.apply_deposit(dec!(-150)).unwrap_err();
        assert!(err.is_insufficient_funds());
        // No partial state
        assert_eq!(ledger.total_deposited, dec!(100));
    }

    #[test]
    fn test_withdrawal_capped_at_working_balance() {
        let mut ledger = DepositLedger::new("TRD_001", dec!(500)).unwrap();
        ledger.apply_deposit(dec!(1700)).unwrap();

        // 1200 working; the 500 security floor is untouchable
        let err = ledger.request_withdrawal(dec!(1300)).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientFunds {
                required: dec!(1300),
                available: dec!(1200),
            }
        );

        let result = ledger.request_withdrawal(dec!(1200)).unwrap();
        assert_eq!(result.security_deposit, dec!(500));
        assert_eq!(result.working_balance, dec!(0));
        assert!(result.security_satisfied);
        assert_eq!(ledger.pending_withdrawal, dec!(1200));
    }

    #[test]
    fn test_withdrawal_settle_and_refund() {
        let mut ledger = DepositLedger::new("TRD_001", dec!(500)).unwrap();
        ledger.apply_deposit(dec!(1000)).unwrap();
        ledger.request_withdrawal(dec!(300)).unwrap();

        ledger.settle_withdrawal(dec!(100)).unwrap();
        assert_eq!(ledger.pending_withdrawal, dec!(200));

        let result = ledger.refund_withdrawal(dec!(200)).unwrap();
        assert_eq!(ledger.pending_withdrawal, dec!(0));
        assert_eq!(ledger.total_deposited, dec!(900));
        assert_eq!(result.working_balance, dec!(400));

        assert!(ledger.settle_withdrawal(dec!(1)).is_err());
    }

    #[test]
    fn test_required_security_raise_reclaims_working() {
        let mut ledger = DepositLedger::new("TRD_001", dec!(500)).unwrap();
        ledger.apply_deposit(dec!(1700)).unwrap();

        let result = ledger.set_required_security(dec!(1000)).unwrap();
        assert_eq!(result.security_deposit, dec!(1000));
        assert_eq!(result.working_balance, dec!(700));

        let result = ledger.set_required_security(dec!(2000)).unwrap();
        assert_eq!(result.security_deposit, dec!(1700));
        assert_eq!(result.working_balance, dec!(0));
        assert!(!result.security_satisfied);
    }

    #[test]
    fn test_from_parts_rejects_negative_fields() {
        let now = Utc::now();
        assert!(DepositLedger::from_parts("TRD_001", dec!(-1), dec!(0), dec!(0), now).is_err());
        assert!(DepositLedger::from_parts("TRD_001", dec!(0), dec!(-1), dec!(0), now).is_err());
        assert!(DepositLedger::from_parts("TRD_001", dec!(0), dec!(0), dec!(-1), now).is_err());
    }
}
