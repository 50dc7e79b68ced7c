//! JSONL event journal - append-only writer
//!
//! Events are written to one file per day so the audit trail stays
//! greppable and old days can be archived independently.

use crate::error::PersistenceResult;
use advancepay_core::Event;
use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Append-only event journal.
///
/// Files are organized by day: `data/events/2026-08-07.jsonl`
pub struct EventStore {
    /// Directory holding the journal files
    base_path: PathBuf,
    /// Counter for event IDs
    event_counter: AtomicU64,
    /// Current file writer (thread-safe)
    current_writer: Mutex<Option<EventWriter>>,
}

struct EventWriter {
    date: String,
    writer: BufWriter<File>,
}

impl EventStore {
    /// Open (or create) the journal at `base_path`.
    ///
    /// The event counter resumes from the highest ID found in existing
    /// files, so IDs stay unique across restarts.
    pub fn new<P: AsRef<Path>>(base_path: P) -> PersistenceResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path)?;

        let event_counter = Self::load_event_counter(&base_path)?;

        Ok(Self {
            base_path,
            event_counter: AtomicU64::new(event_counter),
            current_writer: Mutex::new(None),
        })
    }

    /// Journal directory
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Recover the event counter from existing files
    fn load_event_counter(base_path: &Path) -> PersistenceResult<u64> {
        let mut max_id: u64 = 0;

        if let Ok(entries) = fs::read_dir(base_path) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map_or(false, |ext| ext == "jsonl") {
                    if let Ok(content) = fs::read_to_string(&path) {
                        for line in content.lines() {
                            if let Ok(event) = serde_json::from_str::<Event>(line) {
                                // EVT_000123 -> 123
                                if let Some(num_str) = event.event_id.strip_prefix("EVT_") {
                                    if let Ok(num) = num_str.parse::<u64>() {
                                        max_id = max_id.max(num);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(max_id + 1)
    }

    fn file_path(&self, date: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", date))
    }

    fn current_date() -> String {
        Utc::now().format("%Y-%m-%d").to_string()
    }

    /// Generate the next event ID
    pub fn next_event_id(&self) -> String {
        let id = self.event_counter.fetch_add(1, Ordering::SeqCst);
        format!("EVT_{:06}", id)
    }

    /// Append one event to the journal
    pub fn append(&self, event: &Event) -> PersistenceResult<()> {
        let date = Self::current_date();
        let json = serde_json::to_string(event)?;

        let mut guard = self.current_writer.lock().unwrap();

        let needs_new_file = guard.as_ref().map_or(true, |w| w.date != date);

        if needs_new_file {
            let path = self.file_path(&date);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            *guard = Some(EventWriter {
                date: date.clone(),
                writer: BufWriter::new(file),
            });
        }

        if let Some(ref mut w) = *guard {
            writeln!(w.writer, "{}", json)?;
            w.writer.flush()?;
        }

        Ok(())
    }

    /// Append several events
    pub fn append_batch(&self, events: &[Event]) -> PersistenceResult<()> {
        for event in events {
            self.append(event)?;
        }
        Ok(())
    }

    /// All journal files, sorted by date
    pub fn list_files(&self) -> PersistenceResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "jsonl") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Journal file for a specific day, if any
    pub fn file_for_date(&self, date: &str) -> Option<PathBuf> {
        let path = self.file_path(date);
        path.exists().then_some(path)
    }

    /// Flush pending writes
    pub fn flush(&self) -> PersistenceResult<()> {
        let mut guard = self.current_writer.lock().unwrap();
        if let Some(ref mut w) = *guard {
            w.writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_list() {
        let dir = tempdir().unwrap();
        let store = EventStore::new(dir.path()).unwrap();

        let id = store.next_event_id();
        assert_eq!(id, "EVT_000001");

        let event = Event::deposit_observed(&id, "TRD_001", dec!(100));
        store.append(&event).unwrap();

        let files = store.list_files().unwrap();
        assert_eq!(files.len(), 1);

        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("deposit_observed"));
        assert!(content.contains("EVT_000001"));
    }

    #[test]
    fn test_counter_recovers_across_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = EventStore::new(dir.path()).unwrap();
            for _ in 0..3 {
                let id = store.next_event_id();
                let event = Event::deposit_observed(&id, "TRD_001", dec!(1));
                store.append(&event).unwrap();
            }
        }

        let store = EventStore::new(dir.path()).unwrap();
        assert_eq!(store.next_event_id(), "EVT_000004");
    }

    #[test]
    fn test_append_batch() {
        let dir = tempdir().unwrap();
        let store = EventStore::new(dir.path()).unwrap();

        let events: Vec<Event> = (0..5)
            .map(|_| Event::deposit_observed(&store.next_event_id(), "TRD_001", dec!(10)))
            .collect();
        store.append_batch(&events).unwrap();

        let content = fs::read_to_string(&store.list_files().unwrap()[0]).unwrap();
        assert_eq!(content.lines().count(), 5);
    }
}
