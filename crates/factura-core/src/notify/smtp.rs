//! SMTP delivery using lettre.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, info};

use super::{Delivery, Mailer, Result};
use crate::error::NotificationError;
use crate::models::config::MailConfig;
use crate::models::invoice::InvoiceDocument;

/// Sends invoices through an authenticated SMTP relay over implicit TLS.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
    issuer_name: String,
}

impl SmtpMailer {
    /// Build a mailer for the relay described by `config`.
    pub fn new(config: &MailConfig, issuer_name: impl Into<String>) -> Result<Self> {
        let transport = SmtpTransport::relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();

        Self::with_transport(transport, &config.sender, issuer_name)
    }

    /// Build a mailer around an already configured transport.
    pub fn with_transport(
        transport: SmtpTransport,
        sender: &str,
        issuer_name: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            from: parse_mailbox(sender)?,
            issuer_name: issuer_name.into(),
        })
    }

    /// Compose the invoice email.
    pub fn build_message(&self, to: &str, document: &InvoiceDocument) -> Result<Message> {
        let pdf = ContentType::parse("application/pdf")
            .map_err(|e| NotificationError::Other(e.to_string()))?;

        let attachment =
            Attachment::new(document.file_name().to_string()).body(document.bytes().to_vec(), pdf);

        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(to)?)
            .subject(format!("Factura ARCA - {}", self.issuer_name))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(format!(
                        "Adjunto encontrarás tu factura emitida por {}. Gracias por tu compra.",
                        self.issuer_name
                    )))
                    .singlepart(attachment),
            )?;

        Ok(message)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|source| NotificationError::Address {
            address: address.to_string(),
            source,
        })
}

impl Mailer for SmtpMailer {
    fn send(&self, to: &str, document: &InvoiceDocument) -> Result<Delivery> {
        let message = self.build_message(to, document)?;
        debug!(to = %to, file = %document.file_name(), "sending invoice email");

        let response = self.transport.send(&message)?;
        info!(to = %to, code = %response.code(), "invoice email accepted");

        Ok(Delivery::Sent)
    }
}
