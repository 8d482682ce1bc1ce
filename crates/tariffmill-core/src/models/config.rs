//! Configuration structures for tariffmill.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TariffmillError};

/// Columns written by CSV and text exports, in order.
pub const DEFAULT_EXPORT_COLUMNS: &[&str] = &[
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
    "Sec301_Exclusion_Tariff",
    "_not_in_db",
    "invoice_number",
];

/// Main configuration for tariffmill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffmillConfig {
    /// Tariff table configuration.
    pub tariff: TariffConfig,

    /// Processing defaults.
    pub processing: ProcessingConfig,

    /// Export configuration.
    pub output: OutputConfig,
}

/// Where the Section 232 tariff table comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffConfig {
    /// Default tariff table (CSV or JSON).
    pub table_path: Option<PathBuf>,
}

/// Defaults applied when the caller does not supply a value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Manufacturer ID used when none is given on the command line.
    pub default_mid: String,

    /// Parts master merged into every invoice (CSV or JSON).
    pub parts_master_path: Option<PathBuf>,
}

/// Export format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// JSON document with rows and batch totals.
    #[default]
    Json,
    /// CSV with the configured columns.
    Csv,
    /// Plain text table.
    Text,
}

/// Presentation settings for exports.
///
/// Values are carried unrounded through processing; rounding to these
/// precisions happens only when rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default export format.
    pub format: OutputFormat,

    /// Decimal places for `ValueUSD`.
    pub value_decimals: u32,

    /// Decimal places for `CalcWtNet`.
    pub weight_decimals: u32,

    /// Columns for CSV and text exports.
    pub columns: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            value_decimals: 2,
            weight_decimals: 2,
            columns: DEFAULT_EXPORT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl TariffmillConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| TariffmillError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
