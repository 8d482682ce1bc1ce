//! Process command - expand an invoice into Section 232 declaration rows.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use rust_decimal::Decimal;
use tracing::{debug, info};

use tariffmill_core::models::OutputFormat;
use tariffmill_core::processing::{InvoiceProcessor, PartsMaster};
use tariffmill_core::tariff::TariffTable;

use super::config::load_config;
use crate::input::{read_line_items, read_parts_master, read_tariff_table};
use crate::output::{render, validate_columns, write_split_by_invoice};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Invoice file (CSV or JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Total net weight of the shipment in kg
    #[arg(short = 'w', long, allow_negative_numbers = true)]
    net_weight: Decimal,

    /// Manufacturer ID (defaults to processing.default_mid)
    #[arg(short, long)]
    mid: Option<String>,

    /// Tariff table (CSV or JSON; defaults to tariff.table_path)
    #[arg(short, long)]
    tariffs: Option<PathBuf>,

    /// Parts master to merge before processing (CSV or JSON)
    #[arg(short, long)]
    parts: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (defaults to output.format)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Also write one CSV per invoice number into this directory
    #[arg(long)]
    split_by_invoice: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FormatArg {
    /// JSON document with rows and totals
    Json,
    /// CSV with the configured columns
    Csv,
    /// Plain text table
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if args.net_weight <= Decimal::ZERO {
        anyhow::bail!("Net weight must be greater than zero (got {})", args.net_weight);
    }
    validate_columns(&config.output.columns)?;

    info!("Processing file: {}", args.input.display());
    let lines = read_line_items(&args.input)?;

    let table = match args.tariffs.as_ref().or(config.tariff.table_path.as_ref()) {
        Some(path) => read_tariff_table(path)?,
        None => {
            info!("No tariff table given; unratioed lines default to steel");
            TariffTable::new()
        }
    };

    let parts = match args.parts.as_ref().or(config.processing.parts_master_path.as_ref()) {
        Some(path) => read_parts_master(path)?,
        None => PartsMaster::default(),
    };

    let mid = args
        .mid
        .clone()
        .unwrap_or_else(|| config.processing.default_mid.clone());

    let processor = InvoiceProcessor::from_table(table);
    let result = processor.process_with_parts(&lines, &parts, args.net_weight, &mid)?;

    let format = args.format.map(OutputFormat::from).unwrap_or(config.output.format);
    let rendered = render(&result, format, &config.output)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &rendered)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", rendered);
    }

    if let Some(dir) = &args.split_by_invoice {
        let written = write_split_by_invoice(result.data(), dir, &config.output)?;
        eprintln!(
            "{} Wrote {} invoice files to {}",
            style("✓").green(),
            written.len(),
            dir.display()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
