//! Rendering of processing results as JSON, CSV and text.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, warn};

use tariffmill_core::models::config::OutputConfig;
use tariffmill_core::models::{ExpandedRow, OutputFormat, ProcessingResult};

/// Columns that can appear in CSV and text exports.
const KNOWN_COLUMNS: &[&str] = &[
    "Product No",
    "ValueUSD",
    "HTSCode",
    "MID",
    "Qty1",
    "Qty2",
    "DecTypeCd",
    "CountryofMelt",
    "CountryOfCast",
    "PrimCountryOfSmelt",
    "DeclarationFlag",
    "SteelRatio",
    "AluminumRatio",
    "CopperRatio",
    "WoodRatio",
    "AutoRatio",
    "NonSteelRatio",
    "CalcWtNet",
    "_232_flag",
    "_content_type",
    "Sec301_Exclusion_Tariff",
    "_not_in_db",
    "invoice_number",
    "quantity",
    "qty_unit",
];

/// Reject column lists naming fields the exporter does not know.
pub fn validate_columns(columns: &[String]) -> anyhow::Result<()> {
    let unknown: Vec<&str> = columns
        .iter()
        .map(String::as_str)
        .filter(|c| !KNOWN_COLUMNS.contains(c))
        .collect();

    if !unknown.is_empty() {
        anyhow::bail!(
            "Unknown output column(s): {}. Known columns: {}",
            unknown.join(", "),
            KNOWN_COLUMNS.join(", ")
        );
    }

    Ok(())
}

/// Round half to even and pad to exactly `decimals` places.
fn round(value: Decimal, decimals: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(decimals);
    rounded
}

fn fixed(value: Decimal, decimals: u32) -> String {
    round(value, decimals).to_string()
}

fn percent(value: Decimal) -> String {
    value.normalize().to_string()
}

fn cell(row: &ExpandedRow, column: &str, output: &OutputConfig) -> String {
    match column {
        "Product No" => row.part_number.clone(),
        "ValueUSD" => fixed(row.value_usd, output.value_decimals),
        "HTSCode" => row.hts_code.clone(),
        "MID" => row.mid.clone(),
        "Qty1" => row.qty1.clone(),
        "Qty2" => row.qty2.clone(),
        "DecTypeCd" => row.dec_type_cd.clone(),
        "CountryofMelt" => row.country_of_melt.clone(),
        "CountryOfCast" => row.country_of_cast.clone(),
        "PrimCountryOfSmelt" => row.prim_country_of_smelt.clone(),
        "DeclarationFlag" => row.declaration_flag.clone(),
        "SteelRatio" => percent(row.ratios.steel),
        "AluminumRatio" => percent(row.ratios.aluminum),
        "CopperRatio" => percent(row.ratios.copper),
        "WoodRatio" => percent(row.ratios.wood),
        "AutoRatio" => percent(row.ratios.auto),
        "NonSteelRatio" => percent(row.ratios.non_232),
        "CalcWtNet" => fixed(row.calc_wt_net, output.weight_decimals),
        "_232_flag" => row.flag_232.clone(),
        "_content_type" => row.content_type.to_string(),
        "Sec301_Exclusion_Tariff" => row.sec301_exclusion_tariff.clone().unwrap_or_default(),
        "_not_in_db" => row.not_in_db.to_string(),
        "invoice_number" => row.invoice_number.clone().unwrap_or_default(),
        "quantity" => row.quantity.map(percent).unwrap_or_default(),
        "qty_unit" => row.qty_unit.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

/// JSON document shape: batch totals plus rows, rounded for presentation.
#[derive(Serialize)]
struct JsonReport {
    original_row_count: usize,
    expanded_row_count: usize,
    total_value: Decimal,
    total_weight: Decimal,
    rows: Vec<ExpandedRow>,
}

/// Render a result in the requested format.
pub fn render(
    result: &ProcessingResult,
    format: OutputFormat,
    output: &OutputConfig,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => format_json(result, output),
        OutputFormat::Csv => format_csv(result.data(), output),
        OutputFormat::Text => Ok(format_text(result, output)),
    }
}

fn format_json(result: &ProcessingResult, output: &OutputConfig) -> anyhow::Result<String> {
    let rows = result
        .data()
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row.value_usd = round(row.value_usd, output.value_decimals);
            row.calc_wt_net = round(row.calc_wt_net, output.weight_decimals);
            row
        })
        .collect();

    let report = JsonReport {
        original_row_count: result.original_row_count(),
        expanded_row_count: result.expanded_row_count(),
        total_value: round(result.total_value(), output.value_decimals),
        total_weight: round(result.total_weight(), output.weight_decimals),
        rows,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

fn format_csv(rows: &[ExpandedRow], output: &OutputConfig) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(&output.columns)?;
    for row in rows {
        wtr.write_record(output.columns.iter().map(|c| cell(row, c, output)))?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ProcessingResult, output: &OutputConfig) -> String {
    let table: Vec<Vec<String>> = result
        .data()
        .iter()
        .map(|row| output.columns.iter().map(|c| cell(row, c, output)).collect())
        .collect();

    let widths: Vec<usize> = output
        .columns
        .iter()
        .enumerate()
        .map(|(i, header)| {
            table
                .iter()
                .map(|cells| cells[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut text = String::new();

    text.push_str(&format!(
        "Lines: {}  Rows: {}\n",
        result.original_row_count(),
        result.expanded_row_count()
    ));
    text.push_str(&format!(
        "Total value: {} USD\n",
        fixed(result.total_value(), output.value_decimals)
    ));
    text.push_str(&format!(
        "Net weight:  {} kg\n\n",
        fixed(result.total_weight(), output.weight_decimals)
    ));

    text.push_str(&pad_line(output.columns.iter().map(String::as_str), &widths));
    text.push('\n');
    for cells in &table {
        text.push_str(&pad_line(cells.iter().map(String::as_str), &widths));
        text.push('\n');
    }

    text
}

fn pad_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// File name for one invoice's export, with path separators replaced.
pub fn invoice_file_name(invoice_number: &str) -> String {
    format!("invoice_{}.csv", invoice_number.replace(['/', '\\'], "_"))
}

/// Write one CSV per distinct invoice number into `dir`, in order of first
/// appearance. Rows without an invoice number are left out.
pub fn write_split_by_invoice(
    rows: &[ExpandedRow],
    dir: &Path,
    output: &OutputConfig,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<ExpandedRow>> = HashMap::new();
    let mut skipped = 0usize;

    for row in rows {
        match row.invoice_number.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(number) => {
                let group = groups.entry(number).or_insert_with(|| {
                    order.push(number);
                    Vec::new()
                });
                group.push(row.clone());
            }
            None => skipped += 1,
        }
    }

    if order.is_empty() {
        anyhow::bail!("No invoice numbers found");
    }
    if skipped > 0 {
        warn!("{} rows have no invoice number and were not exported", skipped);
    }

    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(order.len());
    for number in order {
        let path = dir.join(invoice_file_name(number));
        let rows = groups.get(number).map(Vec::as_slice).unwrap_or_default();
        fs::write(&path, format_csv(rows, output)?)?;
        debug!("Wrote {} rows to {}", rows.len(), path.display());
        written.push(path);
    }

    Ok(written)
}
