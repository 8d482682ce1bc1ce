//! Expanded customs rows and the batch processing result.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::line_item::{ContentType, LineItem, MaterialRatios};

/// One line item's value attributed to exactly one content type.
///
/// Created by the ratio expander with weight, quantities and classification
/// left blank; later pipeline stages fill those in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedRow {
    #[serde(rename = "Product No")]
    pub part_number: String,

    #[serde(rename = "_content_type")]
    pub content_type: ContentType,

    /// Value allocated to this content type.
    #[serde(rename = "ValueUSD")]
    pub value_usd: Decimal,

    /// Percentages with only this row's content type set.
    #[serde(flatten)]
    pub ratios: MaterialRatios,

    /// Net weight share (kg), unrounded.
    #[serde(rename = "CalcWtNet")]
    pub calc_wt_net: Decimal,

    #[serde(rename = "Qty1")]
    pub qty1: String,

    #[serde(rename = "Qty2")]
    pub qty2: String,

    /// HTS code as given on the source line.
    #[serde(rename = "HTSCode")]
    pub hts_code: String,

    #[serde(rename = "MID")]
    pub mid: String,

    #[serde(rename = "DecTypeCd")]
    pub dec_type_cd: String,

    #[serde(rename = "CountryofMelt")]
    pub country_of_melt: String,

    #[serde(rename = "CountryOfCast")]
    pub country_of_cast: String,

    #[serde(rename = "PrimCountryOfSmelt")]
    pub prim_country_of_smelt: String,

    /// Smelt declaration flag (`Y` or empty).
    #[serde(rename = "DeclarationFlag")]
    pub declaration_flag: String,

    #[serde(rename = "_232_flag")]
    pub flag_232: String,

    /// Source line fields carried through to the export.
    pub quantity: Option<Decimal>,
    pub qty_unit: Option<String>,
    pub invoice_number: Option<String>,

    #[serde(rename = "Sec301_Exclusion_Tariff")]
    pub sec301_exclusion_tariff: Option<String>,

    #[serde(rename = "_not_in_db")]
    pub not_in_db: bool,

    // Explicit country cells from the source line; used by the annotator.
    #[serde(skip)]
    pub(crate) source_countries: SourceCountries,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SourceCountries {
    pub melt: Option<String>,
    pub cast: Option<String>,
    pub smelt: Option<String>,
}

impl ExpandedRow {
    /// Child row of `line` carrying `value` for `content_type` at `pct` percent.
    pub fn from_line(line: &LineItem, content_type: ContentType, value: Decimal, pct: Decimal) -> Self {
        Self {
            part_number: line.part_number.clone(),
            content_type,
            value_usd: value,
            ratios: MaterialRatios::only(content_type, pct),
            calc_wt_net: Decimal::ZERO,
            qty1: String::new(),
            qty2: String::new(),
            hts_code: line.hts().to_string(),
            mid: String::new(),
            dec_type_cd: String::new(),
            country_of_melt: String::new(),
            country_of_cast: String::new(),
            prim_country_of_smelt: String::new(),
            declaration_flag: String::new(),
            flag_232: String::new(),
            quantity: line.quantity,
            qty_unit: line.qty_unit.clone(),
            invoice_number: line.invoice_number.clone(),
            sec301_exclusion_tariff: line.sec301_exclusion_tariff.clone(),
            not_in_db: line.not_in_db,
            source_countries: SourceCountries {
                melt: line.country_of_melt.clone(),
                cast: line.country_of_cast.clone(),
                smelt: line.country_of_smelt.clone(),
            },
        }
    }

    /// Allocation percentage of this row (its single nonzero ratio).
    pub fn ratio(&self) -> Decimal {
        self.ratios.get(self.content_type)
    }
}

/// Output of one processing run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    data: Vec<ExpandedRow>,
    original_row_count: usize,
    expanded_row_count: usize,
    total_value: Decimal,
    total_weight: Decimal,
}

impl ProcessingResult {
    pub(crate) fn new(
        data: Vec<ExpandedRow>,
        original_row_count: usize,
        total_value: Decimal,
        total_weight: Decimal,
    ) -> Self {
        let expanded_row_count = data.len();
        Self {
            data,
            original_row_count,
            expanded_row_count,
            total_value,
            total_weight,
        }
    }

    /// Expanded rows in output order.
    pub fn data(&self) -> &[ExpandedRow] {
        &self.data
    }

    /// Number of line items before expansion.
    pub fn original_row_count(&self) -> usize {
        self.original_row_count
    }

    /// Number of rows after expansion.
    pub fn expanded_row_count(&self) -> usize {
        self.expanded_row_count
    }

    /// Sum of all expanded row values.
    pub fn total_value(&self) -> Decimal {
        self.total_value
    }

    /// Net weight supplied by the caller.
    pub fn total_weight(&self) -> Decimal {
        self.total_weight
    }

}

impl fmt::Display for ProcessingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows ({} lines), value ${:.2}, weight {:.2} kg",
            self.expanded_row_count, self.original_row_count, self.total_value, self.total_weight
        )
    }
}
