//! # AdvancePay Reports
//!
//! Report generation - CSV, JSON, Markdown exporters plus balance and
//! dispute report builders.
//!
//! ## Example
//!
//! ```rust,ignore
//! use advancepay_reports::{BalanceReport, CsvExporter, ReportExporter};
//!
//! let report = BalanceReport::generate("Daily balances", ledgers);
//! let csv = CsvExporter::new().export(&report);
//! ```

pub mod balance_report;
pub mod dispute_report;
pub mod exporters;

pub use balance_report::{BalanceLine, BalanceReport};
pub use dispute_report::DisputeReport;
pub use exporters::{CsvExporter, JsonExporter, MarkdownExporter, ReportData, ReportExporter};
