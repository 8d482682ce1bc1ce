//! CSV and JSON ingestion of invoice lines, tariff tables and parts masters.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use tariffmill_core::models::{LineItem, PartRecord};
use tariffmill_core::processing::PartsMaster;
use tariffmill_core::tariff::{TariffRecord, TariffTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Json,
}

fn file_kind(path: &Path) -> anyhow::Result<FileKind> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => Ok(FileKind::Csv),
        "json" => Ok(FileKind::Json),
        _ => anyhow::bail!("Unsupported file format: {}", path.display()),
    }
}

fn ensure_exists(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(())
}

/// Read every record of a CSV file (with header row) or a JSON array.
///
/// CSV cells are handed to the models as text so codes like `0106900000`
/// keep their leading zeros; the lenient cell parsers do any number parsing.
fn read_records<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    ensure_exists(path)?;

    let records = match file_kind(path)? {
        FileKind::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::Headers)
                .from_path(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let headers = reader.headers()?.clone();

            let mut records = Vec::new();
            for (i, row) in reader.records().enumerate() {
                // Row 1 is the header
                let line = i + 2;
                let row = row.with_context(|| format!("{}: invalid row {}", path.display(), line))?;

                let cells: Map<String, Value> = headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
                    .collect();

                let record = serde_json::from_value(Value::Object(cells))
                    .with_context(|| format!("{}: invalid row {}", path.display(), line))?;
                records.push(record);
            }
            records
        }
        FileKind::Json => {
            let content = fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .with_context(|| format!("{}: expected a JSON array of records", path.display()))?
        }
    };

    Ok(records)
}

/// Invoice line items in file order.
pub fn read_line_items(path: &Path) -> anyhow::Result<Vec<LineItem>> {
    let lines: Vec<LineItem> = read_records(path)?;
    debug!("Read {} invoice lines from {}", lines.len(), path.display());
    Ok(lines)
}

/// Tariff table from CSV records, a JSON record array, or a JSON object
/// mapping HTS code to `{material, declaration_required}`.
pub fn read_tariff_table(path: &Path) -> anyhow::Result<TariffTable> {
    let table = match file_kind(path)? {
        FileKind::Csv => TariffTable::from_records(read_records::<TariffRecord>(path)?),
        FileKind::Json => {
            ensure_exists(path)?;
            let content = fs::read_to_string(path)?;
            let table = if content.trim_start().starts_with('[') {
                TariffTable::from_json_records(&content)
            } else {
                TariffTable::from_json_map(&content)
            };
            table.with_context(|| format!("Failed to load tariff table {}", path.display()))?
        }
    };

    debug!("Loaded {} tariff codes from {}", table.len(), path.display());
    Ok(table)
}

/// Parts master from CSV or a JSON array.
pub fn read_parts_master(path: &Path) -> anyhow::Result<PartsMaster> {
    let master = PartsMaster::from_records(read_records::<PartRecord>(path)?);
    debug!("Loaded {} parts from {}", master.len(), path.display());
    Ok(master)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_csv_line_items_are_lenient() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "invoice.csv",
            "part_number, value_usd ,hts_code,steel_ratio,aluminum_ratio,qty_unit\n\
             BRK-100,\"1,000.00\",0106.90.00,60,40%,PCS\n\
             BRK-200,abc,,,,\n\
             00417,12,0106900000,,,\n",
        );

        let lines = read_line_items(&path).unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].value_usd, Decimal::new(1000, 0));
        assert_eq!(lines[0].hts_code.as_deref(), Some("0106.90.00"));
        assert_eq!(lines[2].part_number, "00417");
        assert_eq!(lines[2].hts_code.as_deref(), Some("0106900000"));
        assert_eq!(lines[2].value_usd, Decimal::new(12, 0));
        assert_eq!(lines[0].aluminum_ratio, Decimal::new(40, 0));
        assert_eq!(lines[1].value_usd, Decimal::ZERO);
        assert_eq!(lines[1].hts_code, None);
        assert_eq!(lines[1].qty_unit, None);
    }

    #[test]
    fn test_json_line_items() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "invoice.json",
            r#"[{"part_number": "P1", "value_usd": 12.5, "copper_ratio": "100"},
                {"part_number": 12345, "value_usd": 10, "hts_code": 7326908688}]"#,
        );

        let lines = read_line_items(&path).unwrap();
        assert_eq!(lines[0].value_usd, Decimal::new(125, 1));
        assert_eq!(lines[0].copper_ratio, Decimal::new(100, 0));
        assert_eq!(lines[1].part_number, "12345");
        assert_eq!(lines[1].hts_code.as_deref(), Some("7326908688"));
    }

    #[test]
    fn test_tariff_table_forms() {
        let dir = TempDir::new().unwrap();
        let csv = write(
            &dir,
            "tariffs.csv",
            "hts_code,material,declaration_required\n7616.99.51,Aluminum,07 - SMELT & CAST\n",
        );
        let map = write(
            &dir,
            "tariffs.json",
            r#"{"7616995100": {"material": "Aluminum", "declaration_required": "07 - SMELT & CAST"}}"#,
        );

        assert_eq!(read_tariff_table(&csv).unwrap().len(), 1);
        assert_eq!(read_tariff_table(&map).unwrap().len(), 1);
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let xlsx = write(&dir, "invoice.xlsx", "");

        assert!(read_line_items(&xlsx).is_err());
        assert!(read_line_items(&dir.path().join("missing.csv")).is_err());
    }
}
