//! # AdvancePay Core
//!
//! Domain types for the AdvancePay trader platform and the deposit
//! allocation engine: every deposited USDT first fills the security
//! deposit required by the team lead; only the surplus is working
//! balance.
//!
//! This crate is pure - no I/O, no async, no locking. Persistence and
//! orchestration live in `advancepay-persistence` and
//! `advancepay-business`.

pub mod allocation;
pub mod dispute;
pub mod error;
pub mod event;
pub mod money;
pub mod notification;
pub mod requisite;
pub mod trader;
pub mod transaction;

pub use allocation::{allocate, AllocationResult, DepositLedger};
pub use dispute::{Dispute, DisputeReason, DisputeStatus};
pub use error::{CoreError, CoreResult};
pub use event::{Event, EventMetadata, EventType};
pub use money::{Currency, Money};
pub use notification::{BankNotification, OperationKind};
pub use requisite::{PaymentMethod, Requisite, RequisiteKind};
pub use trader::{Trader, TraderRole};
pub use transaction::{WalletTransaction, WalletTransactionKind, WalletTransactionStatus};
