//! In-process record store.

use std::sync::Mutex;

use super::{RecordStore, Result, sort_newest_first};
use crate::error::StoreError;
use crate::models::invoice::InvoiceRecord;

/// Keeps records in memory. Used for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Vec<InvoiceRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, record: &InvoiceRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push(record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<InvoiceRecord>> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?.clone();
        sort_newest_first(&mut records);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn record(name: &str, day: u32) -> InvoiceRecord {
        InvoiceRecord {
            customer_name: name.to_string(),
            tax_id: "20-1".to_string(),
            email: "a@example.com".to_string(),
            description: "Zapatos".to_string(),
            amount: Decimal::from(10),
            payment_method: "Efectivo".to_string(),
            document_url: format!("http://x/static/{name}.pdf"),
            sender: "whatsapp:+1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_list_is_newest_first() {
        let store = InMemoryRecordStore::new();
        store.insert(&record("a", 1)).unwrap();
        store.insert(&record("c", 3)).unwrap();
        store.insert(&record("b", 2)).unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.customer_name)
            .collect();
        assert_eq!(names, ["c", "b", "a"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_len_survives_poisoned_lock() {
        let store = std::sync::Arc::new(InMemoryRecordStore::new());
        store.insert(&record("a", 1)).unwrap();

        let writer = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = writer.records.lock().unwrap();
            panic!("writer crashed");
        })
        .join();

        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert!(matches!(store.list(), Err(StoreError::Poisoned)));
    }
}
