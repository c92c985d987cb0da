//! Serve command - WhatsApp webhook, document links and dashboard over HTTP.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Args;
use console::style;
use quick_xml::escape::escape;
use serde::Deserialize;
use tracing::{debug, error, info};

use factura_core::{Pipeline, RawMessage, RecordFilter, Reply, export_csv};

const STATUS_LINE: &str =
    "✅ App de facturación corriendo. Accedé a /dashboard para ver las facturas.";

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (overrides `server.bind`)
    #[arg(short, long)]
    bind: Option<String>,
}

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

/// Form fields posted by the messaging provider.
#[derive(Debug, Default, Deserialize)]
struct WebhookForm {
    #[serde(rename = "From", default)]
    from: String,
    #[serde(rename = "Body", default)]
    body: String,
}

pub fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    // Blocking backends must be built before the runtime starts.
    let pipeline = Arc::new(Pipeline::from_config(&config)?);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(bind.as_str()).await?;
        info!("factura listening on {bind}");
        println!(
            "{} Listening on http://{} (public base URL {})",
            style("✓").green(),
            bind,
            config.server.base_url
        );

        axum::serve(listener, router(AppState { pipeline }))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok::<(), anyhow::Error>(())
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/whatsapp", post(whatsapp_handler))
        .route("/static/:file_name", get(document_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/dashboard/export", get(export_handler))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }
    info!("shutting down");
}

async fn index_handler() -> &'static str {
    STATUS_LINE
}

async fn whatsapp_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let form = parse_webhook_form(&body);
    let message = RawMessage::new(form.from, form.body);
    debug!(sender = %message.sender, "webhook message received");

    let pipeline = state.pipeline.clone();
    let reply = match tokio::task::spawn_blocking(move || pipeline.handle(&message)).await {
        Ok(outcome) => outcome.reply,
        Err(e) => {
            error!("pipeline task failed: {e}");
            Reply::unavailable()
        }
    };

    ([(header::CONTENT_TYPE, "application/xml")], render_twiml(&reply)).into_response()
}

async fn document_handler(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Response {
    let pipeline = state.pipeline.clone();
    let name = file_name.clone();
    let read = tokio::task::spawn_blocking(move || pipeline.documents().read(&name)).await;

    match read {
        Ok(Ok(Some(bytes))) => ([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response(),
        Ok(Ok(None)) => StatusCode::NOT_FOUND.into_response(),
        Ok(Err(e)) => {
            debug!(file = %file_name, "document not served: {e}");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            error!("document task failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn dashboard_handler(
    State(state): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> Response {
    match load_records(&state, filter).await {
        Ok(records) => Json(records).into_response(),
        Err(response) => response,
    }
}

async fn export_handler(
    State(state): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> Response {
    let records = match load_records(&state, filter).await {
        Ok(records) => records,
        Err(response) => return response,
    };

    let mut out = Vec::new();
    if let Err(e) = export_csv(&records, &mut out) {
        error!("csv export failed: {e}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"facturas.csv\""),
        ],
        out,
    )
        .into_response()
}

async fn load_records(
    state: &AppState,
    filter: RecordFilter,
) -> Result<Vec<factura_core::InvoiceRecord>, Response> {
    let pipeline = state.pipeline.clone();
    match tokio::task::spawn_blocking(move || pipeline.store().list()).await {
        Ok(Ok(records)) => Ok(filter.apply(records)),
        Ok(Err(e)) => {
            error!("record listing failed: {e}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response())
        }
        Err(e) => {
            error!("listing task failed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

/// Decode the urlencoded webhook payload regardless of the declared content
/// type. Undecodable payloads become an empty message so the sender still
/// gets a reply.
fn parse_webhook_form(body: &[u8]) -> WebhookForm {
    serde_urlencoded::from_bytes(body).unwrap_or_else(|e| {
        debug!("undecodable webhook payload: {e}");
        WebhookForm::default()
    })
}

/// Render a reply as a TwiML messaging response.
fn render_twiml(reply: &Reply) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response><Message>"#);
    for segment in &reply.segments {
        xml.push_str("<Body>");
        xml.push_str(&escape(segment.as_str()));
        xml.push_str("</Body>");
    }
    if let Some(url) = &reply.media_url {
        xml.push_str("<Media>");
        xml.push_str(&escape(url.as_str()));
        xml.push_str("</Media>");
    }
    xml.push_str("</Message></Response>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use factura_core::{
        DisabledMailer, FsDocumentStorage, InMemoryRecordStore, InvoiceRecord, IssuerProfile,
        PdfInvoiceRenderer, RecordStore,
    };

    const BASE_URL: &str = "http://facturas.test";

    const JUAN: &str = "Nombre: Juan Pérez\n\
                        CUIT: 20-12345678-9\n\
                        Email: juan@example.com\n\
                        Descripción: Zapatos\n\
                        Importe: 12345.67\n\
                        Pago: Transferencia";

    struct TestApp {
        _dir: TempDir,
        store: Arc<InMemoryRecordStore>,
        router: Router,
    }

    fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryRecordStore::new());
        let pipeline = Pipeline::new(
            BASE_URL,
            Arc::new(PdfInvoiceRenderer::new(IssuerProfile::default())),
            Arc::new(FsDocumentStorage::new(dir.path().join("static"))),
            store.clone(),
            Arc::new(DisabledMailer),
        );

        TestApp {
            _dir: dir,
            store,
            router: router(AppState {
                pipeline: Arc::new(pipeline),
            }),
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body.to_vec())
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
        send(router, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    fn webhook(content_type: Option<&str>, body: String) -> Request<Body> {
        let mut builder = Request::post("/whatsapp");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn form(sender: &str, body: &str) -> String {
        serde_urlencoded::to_string([("From", sender), ("Body", body), ("NumMedia", "0")]).unwrap()
    }

    fn content_type(headers: &HeaderMap) -> &str {
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    fn record(name: &str, description: &str, day: u32) -> InvoiceRecord {
        InvoiceRecord {
            customer_name: name.to_string(),
            tax_id: "20-12345678-9".to_string(),
            email: "cliente@example.com".to_string(),
            description: description.to_string(),
            amount: "1500".parse().unwrap(),
            payment_method: "Efectivo".to_string(),
            document_url: format!("{BASE_URL}/static/factura_arca_{day}.pdf"),
            sender: "whatsapp:+5491100000000".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_twiml_text_only() {
        let xml = render_twiml(&Reply::text("hola"));
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="UTF-8"?><Response><Message><Body>hola</Body></Message></Response>"#
        );
    }

    #[test]
    fn test_twiml_escapes_text_and_media() {
        let reply = Reply {
            segments: vec!["a < b & \"c\"".to_string(), "segundo".to_string()],
            media_url: Some("http://host/static/f.pdf?x=1&y=2".to_string()),
        };
        let xml = render_twiml(&reply);

        assert!(xml.contains("<Body>a &lt; b &amp; &quot;c&quot;</Body><Body>segundo</Body>"));
        assert!(xml.contains("<Media>http://host/static/f.pdf?x=1&amp;y=2</Media>"));
        assert!(xml.ends_with("</Message></Response>"));
    }

    #[test]
    fn test_webhook_form_decoding() {
        let form = parse_webhook_form(b"From=whatsapp%3A%2B54911&Body=hola&SmsSid=SM1");
        assert_eq!(form.from, "whatsapp:+54911");
        assert_eq!(form.body, "hola");

        let form = parse_webhook_form(b"");
        assert_eq!(form.from, "");
        assert_eq!(form.body, "");
    }

    #[tokio::test]
    async fn test_index_reports_status() {
        let app = test_app();
        let (status, _, body) = get(&app.router, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(body).unwrap(), STATUS_LINE);
    }

    #[tokio::test]
    async fn test_webhook_issues_invoice_and_serves_document() {
        let app = test_app();
        let request = webhook(
            Some("application/x-www-form-urlencoded"),
            form("whatsapp:+5491100000000", JUAN),
        );

        let (status, headers, body) = send(&app.router, request).await;
        let xml = String::from_utf8(body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type(&headers), "application/xml");
        assert!(xml.contains("<Body>✅ Factura tipo C generada. Aquí tenés el PDF:</Body>"));
        assert_eq!(app.store.len(), 1);

        let start = xml.find("<Media>").unwrap() + "<Media>".len();
        let end = xml.find("</Media>").unwrap();
        let media_url = &xml[start..end];
        assert_eq!(media_url, app.store.list().unwrap()[0].document_url);

        let path = media_url.strip_prefix(BASE_URL).unwrap();
        assert!(path.starts_with("/static/factura_arca_"));

        let (status, headers, pdf) = get(&app.router, path).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type(&headers), "application/pdf");
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_webhook_reports_missing_fields() {
        let app = test_app();
        let request = webhook(
            Some("application/x-www-form-urlencoded"),
            form("whatsapp:+1", "Nombre: Ana\nImporte: 100"),
        );

        let (status, _, body) = send(&app.router, request).await;
        let xml = String::from_utf8(body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(xml.contains("Faltan datos: CUIT, Email, Descripción, Pago"));
        assert!(!xml.contains("<Media>"));
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_replies_without_form_content_type() {
        let app = test_app();

        let (status, headers, body) =
            send(&app.router, webhook(None, form("whatsapp:+1", "hola"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type(&headers), "application/xml");
        assert!(String::from_utf8(body).unwrap().contains("Para generar tu factura"));

        let (status, _, body) = send(
            &app.router,
            webhook(Some("application/json"), r#"{"Body": "hola"}"#.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("<Response><Message><Body>"));
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_or_unsafe_documents_are_not_found() {
        let app = test_app();

        for uri in [
            "/static/factura_arca_missing.pdf",
            "/static/..",
            "/static/%2E%2E%2Fconfig.json",
        ] {
            let (status, _, _) = get(&app.router, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_dashboard_filters_records() {
        let app = test_app();
        app.store.insert(&record("Ana Gómez", "Botas", 1)).unwrap();
        app.store.insert(&record("Juan Pérez", "Zapatos", 2)).unwrap();
        app.store.insert(&record("Luis", "Zapatillas de Ana", 3)).unwrap();

        let (status, headers, body) = get(&app.router, "/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type(&headers), "application/json");
        let all: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        let names: Vec<_> = all.iter().map(|r| r["cliente_nombre"].as_str().unwrap()).collect();
        assert_eq!(names, ["Luis", "Juan Pérez", "Ana Gómez"]);

        let (_, _, body) = get(&app.router, "/dashboard?q=ANA&start=2024-03-02&end=2024-03-03").await;
        let filtered: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["cliente_nombre"], "Luis");

        let (_, _, body) = get(&app.router, "/dashboard?q=&start=&end=").await;
        let unfiltered: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(unfiltered.len(), 3);
    }

    #[tokio::test]
    async fn test_export_is_csv_attachment() {
        let app = test_app();
        app.store.insert(&record("Ana Gómez", "Botas", 1)).unwrap();
        app.store.insert(&record("Juan Pérez", "Zapatos", 2)).unwrap();

        let (status, headers, body) = get(&app.router, "/dashboard/export?q=zapatos").await;
        let csv = String::from_utf8(body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type(&headers), "text/csv; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"facturas.csv\""
        );

        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Fecha,Cliente,CUIT/DNI,Descripción,Importe,Pago,Archivo PDF");
        assert!(lines[1].starts_with("2024-03-02 12:00,Juan Pérez,20-12345678-9,Zapatos,1500,"));
    }
}
