//! Supabase (PostgREST) record store.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use super::{RecordStore, Result};
use crate::error::StoreError;
use crate::models::invoice::InvoiceRecord;

/// Stores records in a Supabase table through its REST interface.
///
/// The client is blocking; build it outside of an async runtime.
pub struct SupabaseRecordStore {
    client: Client,
    endpoint: String,
}

impl SupabaseRecordStore {
    /// Create a store for `table` in the project at `base_url`.
    pub fn new(base_url: &str, api_key: &str, table: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let invalid = |_| StoreError::Credentials("API key is not a valid header value".to_string());
        let key = HeaderValue::from_str(api_key).map_err(invalid)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(invalid)?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: table_endpoint(base_url, table),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn table_endpoint(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

impl RecordStore for SupabaseRecordStore {
    fn insert(&self, record: &InvoiceRecord) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()?;
        check_status(response)?;

        debug!(endpoint = %self.endpoint, "inserted invoice record");
        Ok(())
    }

    fn list(&self) -> Result<Vec<InvoiceRecord>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()?;

        let records: Vec<InvoiceRecord> = check_status(response)?.json()?;
        debug!(count = records.len(), "fetched invoice records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_endpoint() {
        assert_eq!(
            table_endpoint("https://abc.supabase.co/", "facturas"),
            "https://abc.supabase.co/rest/v1/facturas"
        );
    }

    #[test]
    fn test_rejects_unusable_key() {
        let result = SupabaseRecordStore::new(
            "https://abc.supabase.co",
            "bad\nkey",
            "facturas",
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(StoreError::Credentials(_))));
    }

    #[test]
    fn test_unreachable_store_is_an_http_error() {
        let store = SupabaseRecordStore::new(
            "http://127.0.0.1:9",
            "key",
            "facturas",
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(matches!(store.list(), Err(StoreError::Http(_))));
    }
}
