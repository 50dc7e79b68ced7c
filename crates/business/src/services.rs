//! Service plumbing shared by all business operations.

use advancepay_core::AllocationResult;
use advancepay_persistence::{Database, EventStore};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Context for business operations - database pool + event journal.
pub struct ServiceContext {
    pool: SqlitePool,
    events: Arc<EventStore>,
}

impl ServiceContext {
    /// Create a context from an open database
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            events: Arc::new(EventStore::new(db.events().base_path()).expect("EventStore")),
        }
    }

    /// Create from parts directly (tests, embedding)
    pub fn from_parts(pool: SqlitePool, events: Arc<EventStore>) -> Self {
        Self { pool, events }
    }

    /// Database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Event journal
    pub fn events(&self) -> &EventStore {
        &self.events
    }

    /// Generate the next event ID
    pub fn next_event_id(&self) -> String {
        self.events.next_event_id()
    }
}

/// Result of a balance-affecting wallet operation.
#[derive(Debug, Clone)]
pub struct OperationResult {
    /// Wallet transaction recorded for this operation
    pub transaction_id: String,
    /// Audit event appended for this operation
    pub event_id: String,
    /// Amount moved, USDT
    pub amount: Decimal,
    /// Ledger split after the operation
    pub allocation: AllocationResult,
}

impl OperationResult {
    pub fn new(
        transaction_id: &str,
        event_id: &str,
        amount: Decimal,
        allocation: AllocationResult,
    ) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            event_id: event_id.to_string(),
            amount,
            allocation,
        }
    }
}

/// Snapshot of a trader's funding state for presentation.
#[derive(Debug, Clone)]
pub struct BalanceSnapshot {
    pub trader_id: String,
    pub total_deposited: Decimal,
    pub required_security: Decimal,
    pub pending_withdrawal: Decimal,
    pub allocation: AllocationResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use advancepay_core::allocate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_operation_result() {
        let allocation = allocate(dec!(1700), dec!(500)).unwrap();
        let result = OperationResult::new("tx-1", "EVT_000001", dec!(1700), allocation);

        assert_eq!(result.transaction_id, "tx-1");
        assert_eq!(result.allocation.working_balance, dec!(1200));
    }
}
