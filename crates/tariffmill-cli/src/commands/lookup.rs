//! Lookup command - classify a single HTS code.

use std::path::PathBuf;

use clap::Args;
use console::style;

use tariffmill_core::tariff::{normalize_hts, TariffLookup};

use super::config::load_config;
use crate::input::read_tariff_table;

/// Arguments for the lookup command.
#[derive(Args)]
pub struct LookupArgs {
    /// HTS code, dotted or undotted
    hts_code: String,

    /// Tariff table (CSV or JSON; defaults to tariff.table_path)
    #[arg(short, long)]
    tariffs: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: LookupArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let path = args
        .tariffs
        .or(config.tariff.table_path)
        .ok_or_else(|| anyhow::anyhow!("No tariff table given. Use --tariffs or set tariff.table_path."))?;

    let lookup = TariffLookup::new(read_tariff_table(&path)?);
    let info = lookup.get_info(&args.hts_code);

    if args.json {
        let value = serde_json::json!({
            "hts_code": normalize_hts(&args.hts_code),
            "material": info.material,
            "declaration_code": info.declaration_code,
            "smelt_flag": info.smelt_flag,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match &info.material {
        Some(material) => {
            println!("HTS code:         {}", normalize_hts(&args.hts_code));
            println!("Material:         {}", material);
            println!("Declaration code: {}", info.declaration_code);
            println!(
                "Smelt flag:       {}",
                if info.requires_smelt() { "Y" } else { "-" }
            );
        }
        None => {
            println!(
                "{} No tariff record for {}",
                style("ℹ").blue(),
                normalize_hts(&args.hts_code)
            );
        }
    }

    Ok(())
}
