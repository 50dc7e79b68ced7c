//! Event replay - read events back from JSONL files
//!
//! Reads the journal for audits, investor reports, and balance
//! reconciliation.

use crate::error::{PersistenceError, PersistenceResult};
use advancepay_core::{Event, EventType};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Journal reader.
pub struct EventReader {
    base_path: PathBuf,
}

impl EventReader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Read every event in one file
    pub fn read_file(&self, file_path: &Path) -> PersistenceResult<Vec<Event>> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)?;
            events.push(event);
        }

        Ok(events)
    }

    /// Read events for one day (YYYY-MM-DD)
    pub fn read_date(&self, date: &str) -> PersistenceResult<Vec<Event>> {
        let file_path = self.base_path.join(format!("{}.jsonl", date));
        if file_path.exists() {
            self.read_file(&file_path)
        } else {
            Ok(Vec::new())
        }
    }

    /// Read events for an inclusive date range
    pub fn read_range(&self, from: &str, to: &str) -> PersistenceResult<Vec<Event>> {
        let from_date = NaiveDate::parse_from_str(from, "%Y-%m-%d")
            .map_err(|e| PersistenceError::Other(format!("Invalid from date: {}", e)))?;
        let to_date = NaiveDate::parse_from_str(to, "%Y-%m-%d")
            .map_err(|e| PersistenceError::Other(format!("Invalid to date: {}", e)))?;

        let mut all_events = Vec::new();
        let mut current = from_date;

        while current <= to_date {
            let date_str = current.format("%Y-%m-%d").to_string();
            all_events.extend(self.read_date(&date_str)?);
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }

        Ok(all_events)
    }

    /// Read the whole journal
    pub fn read_all(&self) -> PersistenceResult<Vec<Event>> {
        let mut all_events = Vec::new();

        if !self.base_path.exists() {
            return Ok(all_events);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.base_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "jsonl"))
            .collect();

        files.sort();

        for file_path in files {
            all_events.extend(self.read_file(&file_path)?);
        }

        Ok(all_events)
    }
}

/// Filter for journal queries.
#[derive(Default)]
pub struct EventFilter {
    /// Filter by the trader whose state the event touches
    pub trader_id: Option<String>,
    /// Filter by who performed the action
    pub actor_id: Option<String>,
    /// Filter by event types
    pub event_types: Option<Vec<EventType>>,
    /// Minimum amount
    pub min_amount: Option<rust_decimal::Decimal>,
    /// Maximum amount
    pub max_amount: Option<rust_decimal::Decimal>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trader(mut self, trader_id: &str) -> Self {
        self.trader_id = Some(trader_id.to_string());
        self
    }

    pub fn actor(mut self, actor_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self
    }

    pub fn event_types(mut self, types: Vec<EventType>) -> Self {
        self.event_types = Some(types);
        self
    }

    pub fn amount_range(mut self, min: rust_decimal::Decimal, max: rust_decimal::Decimal) -> Self {
        self.min_amount = Some(min);
        self.max_amount = Some(max);
        self
    }

    /// Whether an event passes this filter
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref trader_id) = self.trader_id {
            if event.trader_id != *trader_id {
                return false;
            }
        }

        if let Some(ref actor_id) = self.actor_id {
            if event.actor_id != *actor_id {
                return false;
            }
        }

        if let Some(ref types) = self.event_types {
            if !types.contains(&event.event_type) {
                return false;
            }
        }

        if let Some(amount) = event.amount {
            if let Some(min) = self.min_amount {
                if amount < min {
                    return false;
                }
            }
            if let Some(max) = self.max_amount {
                if amount > max {
                    return false;
                }
            }
        } else if self.min_amount.is_some() || self.max_amount.is_some() {
            // Amount filters only match events that carry an amount
            return false;
        }

        true
    }

    /// Apply the filter to a batch
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        events.into_iter().filter(|e| self.matches(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventStore;
    use advancepay_core::TraderRole;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn journal_with_events() -> (tempfile::TempDir, EventReader) {
        let dir = tempdir().unwrap();
        let store = EventStore::new(dir.path()).unwrap();

        store
            .append(&Event::deposit_observed(&store.next_event_id(), "TRD_001", dec!(1700)))
            .unwrap();
        store
            .append(&Event::withdrawal_requested(&store.next_event_id(), "TRD_001", dec!(200)))
            .unwrap();
        store
            .append(&Event::security_changed(
                &store.next_event_id(),
                "TL_001",
                TraderRole::TeamLead,
                "TRD_002",
                dec!(500),
            ))
            .unwrap();

        let reader = EventReader::new(dir.path());
        (dir, reader)
    }

    #[test]
    fn test_read_all_roundtrip() {
        let (_dir, reader) = journal_with_events();
        let events = reader.read_all().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, EventType::DepositObserved);
        assert_eq!(events[0].amount, Some(dec!(1700)));
    }

    #[test]
    fn test_filter_by_trader() {
        let (_dir, reader) = journal_with_events();
        let events = EventFilter::new()
            .trader("TRD_001")
            .apply(reader.read_all().unwrap());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_filter_by_type_and_amount() {
        let (_dir, reader) = journal_with_events();

        let events = EventFilter::new()
            .event_types(vec![EventType::DepositObserved])
            .apply(reader.read_all().unwrap());
        assert_eq!(events.len(), 1);

        let events = EventFilter::new()
            .amount_range(dec!(400), dec!(2000))
            .apply(reader.read_all().unwrap());
        assert_eq!(events.len(), 2); // 1700 deposit + 500 security change
    }

    #[test]
    fn test_read_missing_date_is_empty() {
        let (_dir, reader) = journal_with_events();
        assert!(reader.read_date("1999-01-01").unwrap().is_empty());
    }
}
