//! # AdvancePay Business
//!
//! Business logic layer - wallet operations, team-lead controls,
//! notification ingestion, requisite limit accounting, dispute
//! lifecycle.

pub mod dispute;
pub mod error;
pub mod notification;
pub mod requisite;
pub mod services;
pub mod teamlead;
pub mod wallet;

pub use dispute::{DisputeService, DEFAULT_DEADLINE_HOURS};
pub use error::{BusinessError, BusinessResult};
pub use notification::{
    app_name_for_package, is_bank_package, NotificationClassifier, NotificationService,
    ParsedNotification,
};
pub use requisite::RequisiteService;
pub use services::{BalanceSnapshot, OperationResult, ServiceContext};
pub use teamlead::{TeamLeadService, DEFAULT_REQUIRED_SECURITY};
pub use wallet::WalletService;
