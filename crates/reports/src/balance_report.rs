//! Balance report - per-trader allocation snapshots
//!
//! One row per trader ledger with the current security/working split,
//! plus platform totals and the aggregate security shortfall.

use crate::exporters::ReportData;
use advancepay_core::DepositLedger;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// One trader's line in the balance report.
#[derive(Debug, Clone)]
pub struct BalanceLine {
    pub trader_id: String,
    pub username: String,
    pub total_deposited: Decimal,
    pub required_security: Decimal,
    pub security_deposit: Decimal,
    pub working_balance: Decimal,
    pub pending_withdrawal: Decimal,
    pub security_satisfied: bool,
}

/// Platform-wide balance report.
#[derive(Debug, Clone)]
pub struct BalanceReport {
    title: String,
    pub generated_at: DateTime<Utc>,
    pub lines: Vec<BalanceLine>,
}

impl BalanceReport {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            generated_at: Utc::now(),
            lines: Vec::new(),
        }
    }

    /// Build the report from ledgers paired with usernames.
    pub fn generate<'a, I>(title: &str, ledgers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a DepositLedger)>,
    {
        let mut report = Self::new(title);
        for (username, ledger) in ledgers {
            report.push(username, ledger);
        }
        report
    }

    /// Add one ledger line.
    pub fn push(&mut self, username: &str, ledger: &DepositLedger) {
        let allocation = ledger.allocation();
        self.lines.push(BalanceLine {
            trader_id: ledger.trader_id.clone(),
            username: username.to_string(),
            total_deposited: ledger.total_deposited,
            required_security: ledger.required_security,
            security_deposit: allocation.security_deposit,
            working_balance: allocation.working_balance,
            pending_withdrawal: ledger.pending_withdrawal,
            security_satisfied: allocation.security_satisfied,
        });
    }

    /// Sum of all deposits on the platform.
    pub fn total_deposited(&self) -> Decimal {
        self.lines.iter().map(|l| l.total_deposited).sum()
    }

    /// Sum held in security deposits.
    pub fn total_security(&self) -> Decimal {
        self.lines.iter().map(|l| l.security_deposit).sum()
    }

    /// Sum of working balances.
    pub fn total_working(&self) -> Decimal {
        self.lines.iter().map(|l| l.working_balance).sum()
    }

    /// USDT still missing before every trader's requirement is funded.
    pub fn total_shortfall(&self) -> Decimal {
        self.lines
            .iter()
            .filter(|l| !l.security_satisfied)
            .map(|l| l.required_security - l.security_deposit)
            .sum()
    }

    /// Traders whose security requirement is not fully funded.
    pub fn unsatisfied_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.security_satisfied).count()
    }
}

impl ReportData for BalanceReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        [
            "trader_id",
            "username",
            "total_deposited",
            "required_security",
            "security_deposit",
            "working_balance",
            "pending_withdrawal",
            "security_satisfied",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.lines
            .iter()
            .map(|l| {
                vec![
                    l.trader_id.clone(),
                    l.username.clone(),
                    l.total_deposited.to_string(),
                    l.required_security.to_string(),
                    l.security_deposit.to_string(),
                    l.working_balance.to_string(),
                    l.pending_withdrawal.to_string(),
                    l.security_satisfied.to_string(),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![
            ("Generated".to_string(), self.generated_at.to_rfc3339()),
            ("Traders".to_string(), self.lines.len().to_string()),
            (
                "Total deposited (USDT)".to_string(),
                self.total_deposited().to_string(),
            ),
            (
                "Held as security (USDT)".to_string(),
                self.total_security().to_string(),
            ),
            (
                "Working balance (USDT)".to_string(),
                self.total_working().to_string(),
            ),
            (
                "Security shortfall (USDT)".to_string(),
                self.total_shortfall().to_string(),
            ),
            (
                "Traders below requirement".to_string(),
                self.unsatisfied_count().to_string(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporters::{CsvExporter, ReportExporter};
    use rust_decimal_macros::dec;

    fn ledger(trader_id: &str, total: Decimal, required: Decimal) -> DepositLedger {
        let mut ledger = DepositLedger::new(trader_id, required).unwrap();
        if total > dec!(0) {
            ledger.apply_deposit(total).unwrap();
        }
        ledger
    }

    #[test]
    fn test_totals_and_shortfall() {
        let funded = ledger("TRD_001", dec!(1700), dec!(500));
        let short = ledger("TRD_002", dec!(300), dec!(500));
        let report =
            BalanceReport::generate("Balances", [("ivan", &funded), ("petr", &short)]);

        assert_eq!(report.total_deposited(), dec!(2000));
        assert_eq!(report.total_security(), dec!(800));
        assert_eq!(report.total_working(), dec!(1200));
        assert_eq!(report.total_shortfall(), dec!(200));
        assert_eq!(report.unsatisfied_count(), 1);

        // Conservation holds across the platform
        assert_eq!(
            report.total_security() + report.total_working(),
            report.total_deposited()
        );
    }

    #[test]
    fn test_csv_rendering() {
        let funded = ledger("TRD_001", dec!(1700), dec!(500));
        let report = BalanceReport::generate("Balances", [("ivan", &funded)]);

        let csv = CsvExporter::new().export(&report);
        assert!(csv.contains("TRD_001,ivan,1700,500,500,1200,0,true"));
    }

    #[test]
    fn test_empty_report() {
        let report = BalanceReport::new("Empty");
        assert_eq!(report.total_deposited(), dec!(0));
        assert_eq!(report.unsatisfied_count(), 0);
        assert!(report.rows().is_empty());
    }
}
