//! Reply messages sent back to the requester.

use serde::Serialize;

use crate::error::{PipelineError, ValidationError};
use crate::request::Field;

use super::NotifyStatus;

const INSTRUCTIONS: &str = "🧾 Para generar tu factura, enviame todos los datos con este formato:\n\n\
    Nombre: Juan Pérez\n\
    CUIT: 20-12345678-9\n\
    Email: juan@example.com\n\
    Descripción: Zapatos\n\
    Importe: 12345.67\n\
    Pago: Transferencia";

const ISSUED: &str = "✅ Factura tipo C generada. Aquí tenés el PDF:";
const EMAIL_SENT: &str = "📧 También se envió una copia al email del cliente.";
const EMAIL_DISABLED: &str = "📧 El envío por email está deshabilitado.";
const GENERIC_FAILURE: &str =
    "❌ Hubo un error al procesar la factura. Intentá de nuevo más tarde.";

/// A reply to the sender: one or more text segments and an optional media link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub segments: Vec<String>,
    pub media_url: Option<String>,
}

impl Reply {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            segments: vec![message.into()],
            media_url: None,
        }
    }

    /// Usage instructions sent for greeting keywords.
    pub fn instructions() -> Self {
        Self::text(INSTRUCTIONS)
    }

    /// Success reply linking the stored document.
    pub fn issued(document_url: &str, notification: &NotifyStatus) -> Self {
        let mut segments = vec![ISSUED.to_string()];
        match notification {
            NotifyStatus::Sent => segments.push(EMAIL_SENT.to_string()),
            NotifyStatus::Skipped => segments.push(EMAIL_DISABLED.to_string()),
            NotifyStatus::Failed(_) => {}
        }

        Self {
            segments,
            media_url: Some(document_url.to_string()),
        }
    }

    /// Stage-appropriate reply for an aborted request.
    pub fn failure(error: &PipelineError) -> Self {
        match error {
            PipelineError::Validation(ValidationError::MissingFields { missing }) => {
                let labels: Vec<&str> = Field::ALL
                    .into_iter()
                    .filter(|f| missing.contains(f))
                    .map(Field::label)
                    .collect();
                Self::text(format!(
                    "⚠️ Faltan datos: {}. Asegurate de enviar todos los campos como en el ejemplo.",
                    labels.join(", ")
                ))
            }
            PipelineError::Validation(ValidationError::InvalidAmount { value }) => {
                Self::text(format!(
                    "⚠️ El importe \"{value}\" no es válido. Usá un número no negativo, por ejemplo 12345.67."
                ))
            }
            PipelineError::Document(_) | PipelineError::Persistence(_) => Self::unavailable(),
        }
    }

    /// Generic reply when the request could not be completed.
    pub fn unavailable() -> Self {
        Self::text(GENERIC_FAILURE)
    }

    /// Plain-text rendering: segments on separate lines, media link last.
    pub fn to_plain_text(&self) -> String {
        let mut lines = self.segments.clone();
        if let Some(url) = &self.media_url {
            lines.push(url.clone());
        }
        lines.join("\n")
    }
}
