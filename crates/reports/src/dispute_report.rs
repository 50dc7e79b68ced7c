//! Dispute report - status breakdown and win rate

use crate::exporters::ReportData;
use advancepay_core::{Dispute, DisputeStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Dispute overview across traders.
#[derive(Debug, Clone)]
pub struct DisputeReport {
    title: String,
    pub generated_at: DateTime<Utc>,
    pub disputes: Vec<Dispute>,
}

impl DisputeReport {
    pub fn generate(title: &str, disputes: Vec<Dispute>) -> Self {
        Self {
            title: title.to_string(),
            generated_at: Utc::now(),
            disputes,
        }
    }

    fn count(&self, status: DisputeStatus) -> usize {
        self.disputes.iter().filter(|d| d.status == status).count()
    }

    /// Disputes not yet closed.
    pub fn open_count(&self) -> usize {
        self.disputes.iter().filter(|d| !d.status.is_closed()).count()
    }

    /// Share of arbitrated disputes the traders won, 0..=1.
    pub fn win_rate(&self) -> Option<f64> {
        let won = self.count(DisputeStatus::Won);
        let lost = self.count(DisputeStatus::Lost);
        let arbitrated = won + lost;
        if arbitrated == 0 {
            None
        } else {
            Some(won as f64 / arbitrated as f64)
        }
    }

    /// Total disputed volume in USDT.
    pub fn disputed_usdt(&self) -> Decimal {
        self.disputes.iter().map(|d| d.amount_usdt).sum()
    }
}

impl ReportData for DisputeReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        [
            "id",
            "transaction_id",
            "trader_id",
            "amount_rub",
            "amount_usdt",
            "status",
            "reason",
            "created_at",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.disputes
            .iter()
            .map(|d| {
                vec![
                    d.id.clone(),
                    d.transaction_id.clone(),
                    d.trader_id.clone(),
                    d.amount.to_string(),
                    d.amount_usdt.to_string(),
                    d.status.to_string(),
                    d.reason.to_string(),
                    d.created_at.to_rfc3339(),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        let win_rate = self
            .win_rate()
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "n/a".to_string());

        vec![
            ("Generated".to_string(), self.generated_at.to_rfc3339()),
            ("Disputes".to_string(), self.disputes.len().to_string()),
            ("Still open".to_string(), self.open_count().to_string()),
            (
                "Won".to_string(),
                self.count(DisputeStatus::Won).to_string(),
            ),
            (
                "Lost".to_string(),
                self.count(DisputeStatus::Lost).to_string(),
            ),
            ("Win rate".to_string(), win_rate),
            (
                "Disputed volume (USDT)".to_string(),
                self.disputed_usdt().to_string(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advancepay_core::DisputeReason;
    use rust_decimal_macros::dec;

    fn dispute(status: DisputeStatus) -> Dispute {
        let mut d = Dispute::open(
            "ORD-1",
            "TRD_001",
            dec!(3500),
            dec!(37.86),
            DisputeReason::PaymentNotReceived,
            24,
        )
        .unwrap();
        if status.is_closed() {
            d.resolve(status).unwrap();
        }
        d
    }

    #[test]
    fn test_win_rate() {
        let report = DisputeReport::generate(
            "Disputes",
            vec![
                dispute(DisputeStatus::Won),
                dispute(DisputeStatus::Won),
                dispute(DisputeStatus::Lost),
                dispute(DisputeStatus::Open),
            ],
        );

        assert_eq!(report.open_count(), 1);
        assert!((report.win_rate().unwrap() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.disputed_usdt(), dec!(151.44));
    }

    #[test]
    fn test_win_rate_none_without_arbitration() {
        let report = DisputeReport::generate("Disputes", vec![dispute(DisputeStatus::Open)]);
        assert!(report.win_rate().is_none());

        let summary = report.summary();
        let win = summary.iter().find(|(k, _)| k == "Win rate").unwrap();
        assert_eq!(win.1, "n/a");
    }
}
