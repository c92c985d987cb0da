//! Invoice record persistence.

mod jsonl;
mod memory;
mod supabase;

pub use jsonl::JsonLinesRecordStore;
pub use memory::InMemoryRecordStore;
pub use supabase::SupabaseRecordStore;

use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::models::config::{StoreBackend, StoreConfig};
use crate::models::invoice::InvoiceRecord;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Trait for durable invoice record stores.
///
/// Writes are independent; implementations only need to serialize
/// individual inserts.
pub trait RecordStore: Send + Sync {
    /// Persist one new record.
    fn insert(&self, record: &InvoiceRecord) -> Result<()>;

    /// All stored records, newest first.
    fn list(&self) -> Result<Vec<InvoiceRecord>>;
}

/// Open the configured record store backend.
///
/// The Supabase backend uses a blocking HTTP client; call this outside of an
/// async runtime.
pub fn from_config(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    Ok(match config.backend {
        StoreBackend::Supabase => Arc::new(SupabaseRecordStore::new(
            &config.supabase_url,
            &config.supabase_key,
            &config.table,
            Duration::from_secs(config.timeout_secs),
        )?),
        StoreBackend::Jsonl => Arc::new(JsonLinesRecordStore::new(&config.jsonl_path)),
        StoreBackend::Memory => Arc::new(InMemoryRecordStore::new()),
    })
}

/// Sort records newest first.
pub(crate) fn sort_newest_first(records: &mut [InvoiceRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
