//! Fixed-layout invoice PDF rendering using lopdf.

use chrono::{DateTime, Local, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::debug;
use uuid::Uuid;

use super::{DocumentGenerator, Result};
use crate::error::DocumentError;
use crate::models::invoice::{InvoiceDocument, InvoiceRequest, IssuerProfile};

/// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;

const LEFT_MARGIN: i64 = 50;
const TITLE_X: i64 = 200;
const TITLE_Y: i64 = 800;
const TITLE_SIZE: i64 = 16;
const BODY_SIZE: i64 = 12;

const TITLE: &str = "Factura C (Simulada)";
const DISCLAIMER: &str =
    "Factura generada automáticamente. No válida como comprobante fiscal real.";

/// Renders a one-page "Factura C" PDF for a fixed issuer.
pub struct PdfInvoiceRenderer {
    issuer: IssuerProfile,
}

impl PdfInvoiceRenderer {
    pub fn new(issuer: IssuerProfile) -> Self {
        Self { issuer }
    }

    pub fn issuer(&self) -> &IssuerProfile {
        &self.issuer
    }

    /// Text lines of the invoice body with their baseline y position.
    fn body_lines(&self, request: &InvoiceRequest, issued_at: DateTime<Utc>) -> Vec<(i64, String)> {
        let issued_local = issued_at.with_timezone(&Local);

        vec![
            (770, format!("Emisor: {}", self.issuer.name)),
            (755, format!("CUIT: {}", self.issuer.tax_id)),
            (740, format!("Condición frente al IVA: {}", self.issuer.tax_condition)),
            (725, format!("Punto de Venta: {}", self.issuer.point_of_sale)),
            (700, format!("Fecha: {}", issued_local.format("%d/%m/%Y %H:%M"))),
            (680, format!("Cliente: {}", request.customer_name())),
            (665, format!("CUIT/DNI: {}", request.tax_id())),
            (650, format!("Email: {}", request.email())),
            (635, format!("Detalle: {}", request.description())),
            (620, format!("Importe Total: ${:.2}", request.amount().round_dp(2))),
            (605, format!("Medio de Pago: {}", request.payment_method())),
            (580, DISCLAIMER.to_string()),
        ]
    }

    /// Render the invoice to PDF bytes.
    pub fn render(&self, request: &InvoiceRequest, issued_at: DateTime<Utc>) -> Result<Vec<u8>> {
        let mut operations = Vec::new();
        push_text(&mut operations, "F2", TITLE_SIZE, TITLE_X, TITLE_Y, TITLE);
        for (y, line) in self.body_lines(request, issued_at) {
            push_text(&mut operations, "F1", BODY_SIZE, LEFT_MARGIN, y, &line);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font("Helvetica"));
        let bold_id = doc.add_object(font("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| DocumentError::Render(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| DocumentError::Render(e.to_string()))?;

        Ok(bytes)
    }
}

impl DocumentGenerator for PdfInvoiceRenderer {
    fn generate(&self, request: &InvoiceRequest, issued_at: DateTime<Utc>) -> Result<InvoiceDocument> {
        let bytes = self.render(request, issued_at)?;
        let token = Uuid::new_v4().simple().to_string();

        debug!(token = %token, size = bytes.len(), "rendered invoice PDF");
        Ok(InvoiceDocument::new(token, bytes))
    }
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn push_text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]));
    ops.push(Operation::new("ET", vec![]));
}

/// Encode text for the standard-14 fonts' WinAnsi encoding. Latin-1 maps
/// directly; anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7e | 0xa0..=0xff) => code as u8,
            _ => b'?',
        })
        .collect()
}
