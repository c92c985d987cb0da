//! Process command - run one message through the pipeline without the webhook.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use factura_core::{Pipeline, RawMessage, Resolution};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// File holding the message body, or `-` for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Sender identifier recorded with the invoice
    #[arg(short, long, default_value = "cli")]
    sender: String,

    /// Print the full outcome as JSON instead of the reply text
    #[arg(long)]
    json: bool,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    let body = if args.input.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        body
    } else {
        if !args.input.exists() {
            anyhow::bail!("Input file not found: {}", args.input.display());
        }
        std::fs::read_to_string(&args.input)?
    };

    let pipeline = Pipeline::from_config(&config)?;

    info!("Processing message from {}", args.sender);
    let outcome = pipeline.handle(&RawMessage::new(args.sender, body));

    if args.json {
        let issued = outcome.issued().map(|i| {
            serde_json::json!({
                "record": i.record,
                "file_name": i.file_name,
                "notification": i.notification,
            })
        });
        let value = serde_json::json!({
            "path": outcome.path,
            "issued": issued,
            "error": outcome.error().map(|e| e.to_string()),
            "reply": outcome.reply,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", outcome.reply.to_plain_text());
    }

    match &outcome.resolution {
        Resolution::Issued(issued) => eprintln!(
            "{} Invoice stored as {}",
            style("✓").green(),
            issued.file_name
        ),
        Resolution::Instructions => {}
        Resolution::Failed(e) => eprintln!("{} {}", style("✗").red(), e),
    }

    Ok(())
}
