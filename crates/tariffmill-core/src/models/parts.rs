//! Parts-master records used to enrich invoice lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::lenient;

/// A row of the parts master table.
///
/// Every field besides `part_number` is optional; blank cells leave the
/// matching invoice value untouched during the merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub part_number: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub hts_code: Option<String>,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub steel_ratio: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub aluminum_ratio: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub copper_ratio: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub wood_ratio: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub auto_ratio: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub non_steel_ratio: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub qty_unit: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub country_of_melt: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub country_of_cast: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub country_of_smelt: Option<String>,

    #[serde(rename = "Sec301_Exclusion_Tariff", default, deserialize_with = "lenient::text")]
    pub sec301_exclusion_tariff: Option<String>,
}

impl PartRecord {
    /// Create a record with only the part number set.
    pub fn new(part_number: impl Into<String>) -> Self {
        Self {
            part_number: part_number.into(),
            ..Self::default()
        }
    }
}
