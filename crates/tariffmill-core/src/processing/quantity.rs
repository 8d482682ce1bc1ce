//! CBP Qty1 / Qty2 resolution driven by the unit-of-quantity taxonomy.
//!
//! | Category     | Qty1                     | Qty2                     |
//! |--------------|--------------------------|--------------------------|
//! | no quantity  | empty                    | empty                    |
//! | weight       | net weight               | Section 232 rule         |
//! | count        | invoice quantity         | Section 232 rule         |
//! | dual         | invoice quantity         | net weight               |
//! | measure      | invoice quantity         | Section 232 rule         |
//! | unknown      | invoice quantity         | Section 232 rule         |
//!
//! Section 232 rule: CBP wants the net weight in Qty2 for every row carrying a
//! Section 232 content split, and for HTS chapters 72, 73, 74 and 76,
//! regardless of the declared unit. It overrides the dual-unit column.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{ContentType, ExpandedRow};
use crate::tariff::hts_chapter;

/// Units reported with neither quantity.
pub const NO_QTY_UNITS: &[&str] = &["M", "M2", "M3"];

/// Weight-only units.
pub const WEIGHT_UNITS: &[&str] = &["KG", "G", "T", "T ADW", "T DWB"];

/// Count-only units.
pub const COUNT_UNITS: &[&str] = &[
    "NO", "PCS", "DOZ", "DOZ. PRS", "DZ PCS", "GROSS", "HUNDREDS", "THOUSANDS", "PRS", "PACK",
    "DOSES", "CARAT",
];

/// Count plus weight units.
pub const DUAL_UNITS: &[&str] = &[
    "NO. AND KG", "NO/KG", "NO\\KG", "CU KG", "CY KG", "NI KG", "PB KG", "ZN KG", "KG AMC",
    "AG G", "AU G", "IR G", "OS G", "PD G", "PT G", "RH G", "RU G",
];

/// Volume, area and length units. `M`, `M2` and `M3` are listed here too but
/// resolve to [`UnitCategory::NoQuantity`] first.
pub const MEASURE_UNITS: &[&str] = &[
    "LITERS", "PF.LITERS", "BBL", "M", "LIN. M", "M2", "CM2", "M3", "SQUARE", "FIBER M", "GBQ",
    "MWH", "THOUSAND M", "THOUSAND M3",
];

/// HTS chapters that always report weight in Qty2.
pub const WEIGHT_REPORTED_CHAPTERS: &[&str] = &["72", "73", "74", "76"];

/// Unit-of-quantity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCategory {
    /// No unit declared.
    Blank,
    NoQuantity,
    Weight,
    Count,
    Dual,
    Measure,
    Unknown,
}

impl UnitCategory {
    /// Categorize a unit code (case-insensitive, trimmed).
    pub fn of(qty_unit: &str) -> Self {
        let unit = qty_unit.trim().to_uppercase();
        let unit = unit.as_str();

        if unit.is_empty() {
            UnitCategory::Blank
        } else if NO_QTY_UNITS.contains(&unit) {
            UnitCategory::NoQuantity
        } else if WEIGHT_UNITS.contains(&unit) {
            UnitCategory::Weight
        } else if COUNT_UNITS.contains(&unit) {
            UnitCategory::Count
        } else if DUAL_UNITS.contains(&unit) {
            UnitCategory::Dual
        } else if MEASURE_UNITS.contains(&unit) {
            UnitCategory::Measure
        } else {
            UnitCategory::Unknown
        }
    }
}

/// The per-row inputs Qty1/Qty2 depend on.
#[derive(Debug, Clone, Copy)]
pub struct QuantityInput<'a> {
    pub qty_unit: Option<&'a str>,
    pub quantity: Option<Decimal>,
    pub calc_wt_net: Decimal,
    /// `None` for rows that did not come out of ratio expansion.
    pub content_type: Option<ContentType>,
    pub hts_code: &'a str,
}

impl<'a> From<&'a ExpandedRow> for QuantityInput<'a> {
    fn from(row: &'a ExpandedRow) -> Self {
        Self {
            qty_unit: row.qty_unit.as_deref(),
            quantity: row.quantity,
            calc_wt_net: row.calc_wt_net,
            content_type: Some(row.content_type),
            hts_code: &row.hts_code,
        }
    }
}

/// Computes the two CBP quantity columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantityResolver;

impl QuantityResolver {
    pub fn new() -> Self {
        Self
    }

    /// `(Qty1, Qty2)` for a row; either may be empty.
    pub fn resolve(&self, input: &QuantityInput<'_>) -> (String, String) {
        let category = UnitCategory::of(input.qty_unit.unwrap_or(""));
        (self.qty1(category, input), self.qty2(category, input))
    }

    /// Fill `qty1` / `qty2` on an expanded row.
    pub fn apply(&self, row: &mut ExpandedRow) {
        let (qty1, qty2) = self.resolve(&QuantityInput::from(&*row));
        row.qty1 = qty1;
        row.qty2 = qty2;
    }

    fn qty1(&self, category: UnitCategory, input: &QuantityInput<'_>) -> String {
        match category {
            UnitCategory::Blank | UnitCategory::NoQuantity => String::new(),
            UnitCategory::Weight => format_weight(input.calc_wt_net),
            UnitCategory::Count
            | UnitCategory::Dual
            | UnitCategory::Measure
            | UnitCategory::Unknown => format_count(input.quantity),
        }
    }

    fn qty2(&self, category: UnitCategory, input: &QuantityInput<'_>) -> String {
        if category == UnitCategory::NoQuantity {
            return String::new();
        }

        if requires_weight(input) || category == UnitCategory::Dual {
            return format_weight(input.calc_wt_net);
        }

        String::new()
    }
}

/// Whether CBP requires Qty2 weight regardless of unit.
fn requires_weight(input: &QuantityInput<'_>) -> bool {
    input.content_type.is_some()
        || hts_chapter(input.hts_code)
            .is_some_and(|chapter| WEIGHT_REPORTED_CHAPTERS.contains(&chapter.as_str()))
}

/// Round half to even and format as an integer; empty when `weight <= 0`.
pub fn format_weight(weight: Decimal) -> String {
    if weight <= Decimal::ZERO {
        return String::new();
    }

    weight
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
        .map(|w| w.to_string())
        .unwrap_or_default()
}

/// Integer part of a piece count; empty when missing.
fn format_count(quantity: Option<Decimal>) -> String {
    quantity
        .and_then(|q| q.trunc().to_i64())
        .map(|q| q.to_string())
        .unwrap_or_default()
}
