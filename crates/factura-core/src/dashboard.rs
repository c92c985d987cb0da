//! Record listing filters and CSV export for the admin dashboard.

use std::io::Write;

use serde::Deserialize;

use crate::models::invoice::InvoiceRecord;

/// Export column headers, in order.
pub const EXPORT_COLUMNS: [&str; 7] = [
    "Fecha",
    "Cliente",
    "CUIT/DNI",
    "Descripción",
    "Importe",
    "Pago",
    "Archivo PDF",
];

/// Dashboard filter: free-text match plus an inclusive creation date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordFilter {
    /// Case-insensitive substring of the customer name or description.
    #[serde(default)]
    pub q: Option<String>,

    /// Earliest creation date, `YYYY-MM-DD`, inclusive.
    #[serde(default)]
    pub start: Option<String>,

    /// Latest creation date, `YYYY-MM-DD`, inclusive.
    #[serde(default)]
    pub end: Option<String>,
}

impl RecordFilter {
    /// Check whether a record passes every set criterion. Empty strings are
    /// treated as unset.
    pub fn matches(&self, record: &InvoiceRecord) -> bool {
        if let Some(q) = non_empty(&self.q) {
            let q = q.to_lowercase();
            if !record.customer_name.to_lowercase().contains(&q)
                && !record.description.to_lowercase().contains(&q)
            {
                return false;
            }
        }

        let date = record.created_date();
        if let Some(start) = non_empty(&self.start) {
            if date.as_str() < start {
                return false;
            }
        }
        if let Some(end) = non_empty(&self.end) {
            if date.as_str() > end {
                return false;
            }
        }

        true
    }

    /// Keep the matching records, preserving order.
    pub fn apply(&self, records: Vec<InvoiceRecord>) -> Vec<InvoiceRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Write records as CSV with the fixed export columns.
pub fn export_csv<W: Write>(records: &[InvoiceRecord], writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(EXPORT_COLUMNS)?;

    for record in records {
        wtr.write_record([
            record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            record.customer_name.clone(),
            record.tax_id.clone(),
            record.description.clone(),
            record.amount.to_string(),
            record.payment_method.clone(),
            record.document_url.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
