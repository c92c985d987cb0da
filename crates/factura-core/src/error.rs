//! Error types for the factura-core library.

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::request::Field;

/// Main error type for the factura library.
#[derive(Error, Debug)]
pub enum FacturaError {
    /// Request validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Document rendering or storage error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Record persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Email delivery error.
    #[error("notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline stage error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning parsed fields into an invoice request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields are absent or empty.
    #[error("missing required fields: {}", join_fields(missing))]
    MissingFields { missing: BTreeSet<Field> },

    /// The amount is not a non-negative decimal number.
    #[error("invalid amount: {value:?}")]
    InvalidAmount { value: String },
}

fn join_fields(fields: &BTreeSet<Field>) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors related to invoice document rendering and storage.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Building the PDF failed.
    #[error("failed to render PDF: {0}")]
    Render(String),

    /// Writing the PDF to storage failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a stored PDF failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested file name is not a plain document name.
    #[error("invalid document name: {0}")]
    InvalidName(String),
}

/// Errors related to invoice record persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    /// HTTP transport error talking to the remote store.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote store answered with a non-success status.
    #[error("store responded with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Local file error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store credentials cannot be sent as HTTP headers.
    #[error("invalid store credentials: {0}")]
    Credentials(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors related to email delivery.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// The sender or recipient address could not be parsed.
    #[error("invalid email address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// Building the message failed.
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// SMTP transport or authentication failure.
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// Any other delivery failure.
    #[error("{0}")]
    Other(String),
}

/// A pipeline stage failure that aborts the request.
///
/// Notification failures are not represented here: they never abort.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The request text is incomplete or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The document could not be rendered or written.
    #[error("document stage failed: {0}")]
    Document(#[from] DocumentError),

    /// The record could not be persisted.
    #[error("persistence stage failed: {0}")]
    Persistence(#[from] StoreError),
}

/// Errors related to configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting required by the selected backend is empty.
    #[error("missing setting: {0}")]
    Missing(&'static str),

    /// A setting has an unusable value.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// The configuration file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for the factura library.
pub type Result<T> = std::result::Result<T, FacturaError>;
