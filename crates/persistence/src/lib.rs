//! # AdvancePay Persistence
//!
//! Persistence layer - SQLite state + JSONL event journal.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Database                               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────────┐ │
//! │  │   SQLite    │    │    JSONL    │    │     Repos       │ │
//! │  │  (state)    │    │  (journal)  │    │   (queries)     │ │
//! │  └─────────────┘    └─────────────┘    └─────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use advancepay_persistence::{Database, TraderRepo};
//!
//! let db = Database::init("sqlite:advancepay.db?mode=rwc", "data/events").await?;
//! let traders = TraderRepo::get_all(db.pool()).await?;
//! db.events().append(&event)?;
//! ```

pub mod error;
pub mod events;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use events::{EventFilter, EventReader, EventStore};
pub use sqlite::{
    create_pool, create_schema, init_database, DisputeRepo, LedgerRepo, NotificationRepo,
    RequisiteRepo, TraderRepo, WalletTransactionRepo,
};
pub use sqlite::schema::{
    BankNotificationRow, DisputeRow, LedgerRow, RequisiteRow, TraderRow, WalletTransactionRow,
};

use sqlx::SqlitePool;
use std::path::Path;

/// Database facade - unified access to SQLite + the event journal.
pub struct Database {
    pool: SqlitePool,
    event_store: EventStore,
}

impl Database {
    /// Connect to an existing database
    pub async fn new<Q: AsRef<Path>>(db_url: &str, events_path: Q) -> PersistenceResult<Self> {
        let pool = create_pool(db_url).await?;
        let event_store = EventStore::new(events_path)?;

        Ok(Self { pool, event_store })
    }

    /// Connect and bring up the schema
    pub async fn init<Q: AsRef<Path>>(db_url: &str, events_path: Q) -> PersistenceResult<Self> {
        let pool = init_database(db_url).await?;
        let event_store = EventStore::new(events_path)?;

        Ok(Self { pool, event_store })
    }

    /// SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Event journal writer
    pub fn events(&self) -> &EventStore {
        &self.event_store
    }

    /// Journal reader for replay and audits
    pub fn event_reader(&self) -> EventReader {
        EventReader::new(self.event_store.base_path())
    }
}
