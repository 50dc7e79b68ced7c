//! CLI command handlers

pub mod audit;
pub mod dispute;
pub mod notify;
pub mod requisite;
pub mod trader;
pub mod wallet;

use advancepay_business::ServiceContext;
use advancepay_persistence::EventStore;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Open the database + journal and build a service context.
pub async fn service_context(db_path: &Path, events_dir: &Path) -> Result<ServiceContext> {
    let pool = crate::db::connect(db_path).await?;
    let events = Arc::new(EventStore::new(events_dir)?);
    Ok(ServiceContext::from_parts(pool, events))
}
