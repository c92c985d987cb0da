//! Best-effort email delivery of generated invoices.

mod smtp;

pub use smtp::SmtpMailer;

use tracing::info;

use crate::error::NotificationError;
use crate::models::invoice::InvoiceDocument;

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotificationError>;

/// What happened to an email handed to a [`Mailer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the mail relay.
    Sent,
    /// Email delivery is turned off.
    Skipped,
}

/// Trait for invoice email senders.
pub trait Mailer: Send + Sync {
    /// Send `document` as an attachment to `to`.
    fn send(&self, to: &str, document: &InvoiceDocument) -> Result<Delivery>;
}

/// Mailer used when email delivery is disabled in configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMailer;

impl Mailer for DisabledMailer {
    fn send(&self, to: &str, document: &InvoiceDocument) -> Result<Delivery> {
        info!(to = %to, file = %document.file_name(), "email delivery disabled; skipping");
        Ok(Delivery::Skipped)
    }
}
