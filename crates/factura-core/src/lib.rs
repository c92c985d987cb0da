//! Core library for chat-driven invoicing.
//!
//! This crate provides:
//! - Free-text request parsing and validation (`Nombre: ...`, `Importe: ...`)
//! - Fixed-layout invoice PDF generation
//! - Invoice record persistence (Supabase/PostgREST, JSON lines, in-memory)
//! - Best-effort email delivery of the generated PDF
//! - The request-to-invoice pipeline tying the stages together
//! - Dashboard filtering and CSV export of stored records

pub mod error;
pub mod models;
pub mod request;
pub mod document;
pub mod store;
pub mod notify;
pub mod pipeline;
pub mod dashboard;

pub use error::{FacturaError, Result};
pub use models::config::FacturaConfig;
pub use models::invoice::{
    InvoiceDocument, InvoiceRecord, InvoiceRequest, IssuerProfile, RawMessage,
};
pub use request::{Field, ParsedFields, parse_fields, validate};
pub use document::{DocumentGenerator, DocumentStorage, FsDocumentStorage, PdfInvoiceRenderer};
pub use store::{RecordStore, InMemoryRecordStore, JsonLinesRecordStore, SupabaseRecordStore};
pub use notify::{Delivery, DisabledMailer, Mailer, SmtpMailer};
pub use pipeline::{Issued, NotifyStatus, Outcome, Pipeline, Reply, Resolution, Stage};
pub use dashboard::{RecordFilter, export_csv};
