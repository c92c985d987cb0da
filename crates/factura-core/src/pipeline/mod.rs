//! Request-to-invoice pipeline.
//!
//! parse -> validate -> generate document -> persist record -> email -> reply.
//!
//! Side effects are ordered but not transactional. A document written before
//! a failed insert stays on storage as an orphan and is only logged. Email
//! failures are logged and never undo the stored record.

mod reply;

pub use reply::Reply;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::document::{
    DocumentGenerator, DocumentStorage, FsDocumentStorage, PdfInvoiceRenderer, document_url,
};
use crate::error::{FacturaError, PipelineError};
use crate::models::config::FacturaConfig;
use crate::models::invoice::{InvoiceRecord, RawMessage};
use crate::notify::{Delivery, DisabledMailer, Mailer, SmtpMailer};
use crate::request::{parse_fields, validate};
use crate::store::{self, RecordStore};

/// Bodies that short-circuit the pipeline with the usage instructions.
pub const GREETINGS: &[&str] = &["hola", "factura", "inicio", "empezar"];

/// Pipeline states, in the order a successful request visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Parsed,
    Validated,
    DocumentGenerated,
    Persisted,
    Notified,
    NotifyFailed,
    Replied,
}

impl PipelineError {
    /// The stage whose work failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Validation(_) => Stage::Validated,
            PipelineError::Document(_) => Stage::DocumentGenerated,
            PipelineError::Persistence(_) => Stage::Persisted,
        }
    }
}

/// Result of the email step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyStatus {
    Sent,
    Skipped,
    Failed(String),
}

/// A successfully issued invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issued {
    pub record: InvoiceRecord,
    pub file_name: String,
    pub notification: NotifyStatus,
}

/// How a request ended.
#[derive(Debug)]
pub enum Resolution {
    /// Greeting keyword; instructions returned, nothing generated.
    Instructions,
    /// Document stored and record persisted.
    Issued(Issued),
    /// A stage failed before the record was persisted.
    Failed(PipelineError),
}

/// Everything the pipeline produced for one message.
#[derive(Debug)]
pub struct Outcome {
    /// States visited, ending in [`Stage::Replied`].
    pub path: Vec<Stage>,
    pub resolution: Resolution,
    pub reply: Reply,
}

impl Outcome {
    pub fn is_issued(&self) -> bool {
        matches!(self.resolution, Resolution::Issued(_))
    }

    pub fn issued(&self) -> Option<&Issued> {
        match &self.resolution {
            Resolution::Issued(issued) => Some(issued),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match &self.resolution {
            Resolution::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// The request-to-invoice orchestrator.
///
/// Collaborators are built once and shared by every request.
pub struct Pipeline {
    base_url: String,
    generator: Arc<dyn DocumentGenerator>,
    documents: Arc<dyn DocumentStorage>,
    store: Arc<dyn RecordStore>,
    mailer: Arc<dyn Mailer>,
}

impl Pipeline {
    pub fn new(
        base_url: impl Into<String>,
        generator: Arc<dyn DocumentGenerator>,
        documents: Arc<dyn DocumentStorage>,
        store: Arc<dyn RecordStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            generator,
            documents,
            store,
            mailer,
        }
    }

    /// Build the pipeline and its backends from configuration.
    ///
    /// Uses a blocking HTTP client for the Supabase backend, so call it
    /// outside of an async runtime.
    pub fn from_config(config: &FacturaConfig) -> Result<Self, FacturaError> {
        config.validate()?;

        let store = store::from_config(&config.store)?;

        let mailer: Arc<dyn Mailer> = if config.mail.enabled {
            Arc::new(SmtpMailer::new(&config.mail, config.issuer.name.clone())?)
        } else {
            Arc::new(DisabledMailer)
        };

        debug!(backend = ?config.store.backend, mail = config.mail.enabled, "pipeline configured");

        Ok(Self::new(
            config.server.base_url.clone(),
            Arc::new(PdfInvoiceRenderer::new(config.issuer.clone())),
            Arc::new(FsDocumentStorage::new(&config.server.static_dir)),
            store,
            mailer,
        ))
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn documents(&self) -> &dyn DocumentStorage {
        self.documents.as_ref()
    }

    /// Process one inbound message. Always produces exactly one reply.
    pub fn handle(&self, message: &RawMessage) -> Outcome {
        let mut path = vec![Stage::Received];

        if is_greeting(&message.body) {
            debug!(sender = %message.sender, "greeting received; sending instructions");
            path.push(Stage::Replied);
            return Outcome {
                path,
                resolution: Resolution::Instructions,
                reply: Reply::instructions(),
            };
        }

        let (resolution, reply) = match self.issue(message, &mut path) {
            Ok(issued) => {
                let reply = Reply::issued(&issued.record.document_url, &issued.notification);
                (Resolution::Issued(issued), reply)
            }
            Err(err) => {
                match &err {
                    PipelineError::Validation(e) => {
                        debug!(sender = %message.sender, "rejected request: {}", e)
                    }
                    other => error!(
                        sender = %message.sender,
                        stage = ?other.stage(),
                        "invoice request failed: {}",
                        other
                    ),
                }
                let reply = Reply::failure(&err);
                (Resolution::Failed(err), reply)
            }
        };

        path.push(Stage::Replied);
        Outcome {
            path,
            resolution,
            reply,
        }
    }

    fn issue(&self, message: &RawMessage, path: &mut Vec<Stage>) -> Result<Issued, PipelineError> {
        let fields = parse_fields(&message.body);
        path.push(Stage::Parsed);

        let request = validate(&fields)?;
        path.push(Stage::Validated);

        let created_at = Utc::now();
        let document = self.generator.generate(&request, created_at)?;
        self.documents.write(&document)?;
        path.push(Stage::DocumentGenerated);

        let url = document_url(&self.base_url, document.file_name());
        let record = InvoiceRecord::from_request(&request, url, &message.sender, created_at);

        if let Err(e) = self.store.insert(&record) {
            warn!(file = %document.file_name(), "record not persisted; document left orphaned");
            return Err(e.into());
        }
        path.push(Stage::Persisted);

        let notification = match self.mailer.send(request.email(), &document) {
            Ok(Delivery::Sent) => NotifyStatus::Sent,
            Ok(Delivery::Skipped) => NotifyStatus::Skipped,
            Err(e) => {
                warn!(to = %request.email(), file = %document.file_name(), "invoice email failed: {}", e);
                NotifyStatus::Failed(e.to_string())
            }
        };
        path.push(match notification {
            NotifyStatus::Failed(_) => Stage::NotifyFailed,
            _ => Stage::Notified,
        });

        info!(
            sender = %message.sender,
            customer = %record.customer_name,
            amount = %record.amount,
            file = %document.file_name(),
            "invoice issued"
        );

        Ok(Issued {
            record,
            file_name: document.file_name().to_string(),
            notification,
        })
    }
}

/// Whether `body` is one of the [`GREETINGS`] keywords, ignoring case and
/// surrounding whitespace.
pub fn is_greeting(body: &str) -> bool {
    let body = body.trim().to_lowercase();
    GREETINGS.contains(&body.as_str())
}
