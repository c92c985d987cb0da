//! Invoice data models, from the raw chat message to the persisted record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An inbound chat message as delivered by the messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Sender identifier (e.g. `whatsapp:+5491100000000`).
    pub sender: String,
    /// Free-text body.
    pub body: String,
}

impl RawMessage {
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
        }
    }
}

/// A validated invoice request.
///
/// Only [`crate::request::validate`] builds one, so every instance has all
/// six fields present and a non-negative amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceRequest {
    customer_name: String,
    tax_id: String,
    email: String,
    description: String,
    amount: Decimal,
    payment_method: String,
}

impl InvoiceRequest {
    pub(crate) fn new(
        customer_name: String,
        tax_id: String,
        email: String,
        description: String,
        amount: Decimal,
        payment_method: String,
    ) -> Self {
        Self {
            customer_name,
            tax_id,
            email,
            description,
            amount,
            payment_method,
        }
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// CUIT/DNI as typed by the sender. Format is not checked.
    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }

    /// Customer email as typed by the sender. Format is not checked.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }
}

/// A rendered invoice PDF and the random token identifying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDocument {
    token: String,
    file_name: String,
    bytes: Vec<u8>,
}

impl InvoiceDocument {
    /// Prefix of every generated document file name.
    pub const FILE_PREFIX: &'static str = "factura_arca_";

    /// Wrap rendered bytes; the file name is derived from the token.
    pub fn new(token: impl Into<String>, bytes: Vec<u8>) -> Self {
        let token = token.into();
        let file_name = format!("{}{}.pdf", Self::FILE_PREFIX, token);
        Self {
            token,
            file_name,
            bytes,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Storage key, also the last segment of the public URL.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A persisted invoice row.
///
/// Field names on the wire follow the `facturas` table consumed by the
/// dashboard and the export; they must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    #[serde(rename = "cliente_nombre")]
    pub customer_name: String,

    #[serde(rename = "cliente_cuit")]
    pub tax_id: String,

    #[serde(rename = "email")]
    pub email: String,

    #[serde(rename = "descripcion")]
    pub description: String,

    #[serde(rename = "importe")]
    pub amount: Decimal,

    #[serde(rename = "medio_pago")]
    pub payment_method: String,

    /// Public URL of the generated PDF.
    #[serde(rename = "archivo_url")]
    pub document_url: String,

    /// Messaging sender identifier.
    #[serde(rename = "whatsapp")]
    pub sender: String,

    pub created_at: DateTime<Utc>,
}

impl InvoiceRecord {
    /// Build the record for a request whose document has been stored.
    pub fn from_request(
        request: &InvoiceRequest,
        document_url: impl Into<String>,
        sender: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_name: request.customer_name().to_string(),
            tax_id: request.tax_id().to_string(),
            email: request.email().to_string(),
            description: request.description().to_string(),
            amount: request.amount(),
            payment_method: request.payment_method().to_string(),
            document_url: document_url.into(),
            sender: sender.into(),
            created_at,
        }
    }

    /// `YYYY-MM-DD` portion of the creation timestamp.
    pub fn created_date(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

/// Identity of the business issuing every invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerProfile {
    /// Trade name printed on the invoice and used in email subjects.
    pub name: String,

    /// Issuer CUIT.
    pub tax_id: String,

    /// VAT condition (condición frente al IVA).
    pub tax_condition: String,

    /// Point of sale label.
    pub point_of_sale: String,
}

impl Default for IssuerProfile {
    fn default() -> Self {
        Self {
            name: "Mia-Shoes".to_string(),
            tax_id: "20-45154254-1".to_string(),
            tax_condition: "Monotributista".to_string(),
            point_of_sale: "Mia-Shoes".to_string(),
        }
    }
}
