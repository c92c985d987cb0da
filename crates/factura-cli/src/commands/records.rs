//! Records command - list and export stored invoices.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use factura_core::models::config::{StoreBackend, StoreConfig};
use factura_core::store::{self, RecordStore};
use factura_core::{InvoiceRecord, RecordFilter, export_csv};

/// Arguments for the records command.
#[derive(Args)]
pub struct RecordsArgs {
    #[command(subcommand)]
    command: RecordsCommand,
}

#[derive(Subcommand)]
enum RecordsCommand {
    /// List records, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Export records as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Match customer name or description (case-insensitive)
    #[arg(short, long)]
    query: Option<String>,

    /// Earliest creation date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Latest creation date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,
}

impl From<FilterArgs> for RecordFilter {
    fn from(args: FilterArgs) -> Self {
        RecordFilter {
            q: args.query,
            start: args.start,
            end: args.end,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub fn run(args: RecordsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let store = open_store(&config.store)?;

    match args.command {
        RecordsCommand::List { filter, format } => {
            let records = RecordFilter::from(filter).apply(store.list()?);
            let output = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&records)?,
                OutputFormat::Text => format_text(&records),
            };
            println!("{}", output);
        }
        RecordsCommand::Export { filter, output } => {
            let records = RecordFilter::from(filter).apply(store.list()?);
            match output {
                Some(path) => {
                    let file = fs::File::create(&path)?;
                    export_csv(&records, file)?;
                    eprintln!(
                        "{} Exported {} records to {}",
                        style("✓").green(),
                        records.len(),
                        path.display()
                    );
                }
                None => export_csv(&records, std::io::stdout().lock())?,
            }
        }
    }

    Ok(())
}

fn open_store(config: &StoreConfig) -> anyhow::Result<std::sync::Arc<dyn RecordStore>> {
    if config.backend == StoreBackend::Supabase
        && (config.supabase_url.trim().is_empty() || config.supabase_key.trim().is_empty())
    {
        anyhow::bail!("Supabase store selected but SUPABASE_URL / SUPABASE_KEY are not set");
    }
    Ok(store::from_config(config)?)
}

fn format_text(records: &[InvoiceRecord]) -> String {
    if records.is_empty() {
        return "No records found.".to_string();
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    for record in records {
        lines.push(format!(
            "{}  {:<24} {:>12}  {:<14} {}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.customer_name,
            format!("${:.2}", record.amount),
            record.payment_method,
            record.document_url,
        ));
    }
    lines.push(format!("{} record(s)", records.len()));
    lines.join("\n")
}
