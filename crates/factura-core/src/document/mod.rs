//! Invoice document generation and storage.

mod pdf;
mod storage;

pub use pdf::PdfInvoiceRenderer;
pub use storage::FsDocumentStorage;

use chrono::{DateTime, Utc};

use crate::error::DocumentError;
use crate::models::invoice::{InvoiceDocument, InvoiceRequest};

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Trait for invoice document generators.
pub trait DocumentGenerator: Send + Sync {
    /// Render the invoice and assign it a fresh random token.
    fn generate(&self, request: &InvoiceRequest, issued_at: DateTime<Utc>)
        -> Result<InvoiceDocument>;
}

/// Trait for places generated documents are written to and served from.
pub trait DocumentStorage: Send + Sync {
    /// Persist the document under its file name.
    fn write(&self, document: &InvoiceDocument) -> Result<()>;

    /// Read a stored document back. `Ok(None)` if no such document exists.
    fn read(&self, file_name: &str) -> Result<Option<Vec<u8>>>;
}

/// Public URL of a stored document: `<base-url>/static/<file_name>`.
pub fn document_url(base_url: &str, file_name: &str) -> String {
    format!("{}/static/{}", base_url.trim_end_matches('/'), file_name)
}

/// Check that `name` is a plain file name with no path components.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
