//! Invoice line items and Section 232 content types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::lenient;

/// Material content category a row's value is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "steel")]
    Steel,
    #[serde(rename = "aluminum")]
    Aluminum,
    #[serde(rename = "copper")]
    Copper,
    #[serde(rename = "wood")]
    Wood,
    #[serde(rename = "auto")]
    Auto,
    /// Value not subject to Section 232 duties.
    #[serde(rename = "non_232")]
    Non232,
}

impl ContentType {
    /// All content types in row emission order.
    ///
    /// Expanded rows for one line item always appear in this order.
    pub const ALL: [ContentType; 6] = [
        ContentType::Steel,
        ContentType::Aluminum,
        ContentType::Copper,
        ContentType::Wood,
        ContentType::Auto,
        ContentType::Non232,
    ];

    /// Snake-case identifier (`steel`, ..., `non_232`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Steel => "steel",
            ContentType::Aluminum => "aluminum",
            ContentType::Copper => "copper",
            ContentType::Wood => "wood",
            ContentType::Auto => "auto",
            ContentType::Non232 => "non_232",
        }
    }

    /// Value of the `_232_flag` output column.
    pub fn flag_232(&self) -> &'static str {
        match self {
            ContentType::Steel => "232_Steel",
            ContentType::Aluminum => "232_Aluminum",
            ContentType::Copper => "232_Copper",
            ContentType::Wood => "232_Wood",
            ContentType::Auto => "232_Auto",
            ContentType::Non232 => "Non_232",
        }
    }

    /// Declaration code used when the tariff table has none for the row.
    ///
    /// `None` means the looked-up code is used verbatim, even if empty.
    pub fn fallback_declaration_code(&self) -> Option<&'static str> {
        match self {
            ContentType::Steel => Some("08"),
            ContentType::Aluminum => Some("07"),
            ContentType::Copper => Some("11"),
            ContentType::Wood => Some("10"),
            ContentType::Auto => Some(""),
            ContentType::Non232 => None,
        }
    }

    /// Map a tariff-table material name to a content type.
    ///
    /// Names are matched exactly as stored in the tariff table.
    pub fn from_material(material: &str) -> Option<Self> {
        match material {
            "Steel" => Some(ContentType::Steel),
            "Aluminum" => Some(ContentType::Aluminum),
            "Copper" => Some(ContentType::Copper),
            "Wood" => Some(ContentType::Wood),
            "Auto" => Some(ContentType::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six material content percentages (0-100) of a line.
///
/// Serialized under the export column names (`SteelRatio` .. `NonSteelRatio`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRatios {
    #[serde(rename = "SteelRatio", alias = "steel")]
    pub steel: Decimal,
    #[serde(rename = "AluminumRatio", alias = "aluminum")]
    pub aluminum: Decimal,
    #[serde(rename = "CopperRatio", alias = "copper")]
    pub copper: Decimal,
    #[serde(rename = "WoodRatio", alias = "wood")]
    pub wood: Decimal,
    #[serde(rename = "AutoRatio", alias = "auto")]
    pub auto: Decimal,
    #[serde(rename = "NonSteelRatio", alias = "non_232")]
    pub non_232: Decimal,
}

impl MaterialRatios {
    /// Ratios with a single content type set to `pct`.
    pub fn only(content_type: ContentType, pct: Decimal) -> Self {
        let mut ratios = Self::default();
        ratios.set(content_type, pct);
        ratios
    }

    /// Percentage for a content type.
    pub fn get(&self, content_type: ContentType) -> Decimal {
        match content_type {
            ContentType::Steel => self.steel,
            ContentType::Aluminum => self.aluminum,
            ContentType::Copper => self.copper,
            ContentType::Wood => self.wood,
            ContentType::Auto => self.auto,
            ContentType::Non232 => self.non_232,
        }
    }

    /// Set the percentage for a content type.
    pub fn set(&mut self, content_type: ContentType, pct: Decimal) {
        let slot = match content_type {
            ContentType::Steel => &mut self.steel,
            ContentType::Aluminum => &mut self.aluminum,
            ContentType::Copper => &mut self.copper,
            ContentType::Wood => &mut self.wood,
            ContentType::Auto => &mut self.auto,
            ContentType::Non232 => &mut self.non_232,
        };
        *slot = pct;
    }

    /// Whether every ratio is zero.
    pub fn is_all_zero(&self) -> bool {
        ContentType::ALL.iter().all(|ct| self.get(*ct).is_zero())
    }

    /// Ratios paired with their content type, in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (ContentType, Decimal)> + '_ {
        ContentType::ALL.iter().map(move |ct| (*ct, self.get(*ct)))
    }

    /// Sum of all six percentages.
    pub fn total(&self) -> Decimal {
        self.iter().map(|(_, pct)| pct).sum()
    }
}

/// A single commercial-invoice line as supplied by the caller.
///
/// Field names follow the invoice table columns so CSV and JSON exports map
/// straight onto this struct. Only `part_number` and `value_usd` are required
/// columns; every other cell degrades to empty or zero when blank or malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Part / product number.
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub part_number: String,

    /// Line value in USD (may be zero).
    #[serde(deserialize_with = "lenient::decimal_or_zero")]
    pub value_usd: Decimal,

    /// HTS code, dotted or undotted.
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub hts_code: Option<String>,

    /// Piece count from the invoice.
    #[serde(default, deserialize_with = "lenient::decimal", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,

    /// CBP unit of quantity (e.g. `KG`, `NO`, `NO/KG`).
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub qty_unit: Option<String>,

    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub steel_ratio: Decimal,

    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub aluminum_ratio: Decimal,

    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub copper_ratio: Decimal,

    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub wood_ratio: Decimal,

    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub auto_ratio: Decimal,

    /// Share of the value outside any Section 232 material.
    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub non_steel_ratio: Decimal,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub country_of_melt: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub country_of_cast: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub country_of_smelt: Option<String>,

    /// Section 301 exclusion tariff, if any.
    #[serde(
        rename = "Sec301_Exclusion_Tariff",
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub sec301_exclusion_tariff: Option<String>,

    /// Source invoice number, used to split exports.
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Set by the parts-master merge when the part has no master record.
    #[serde(rename = "_not_in_db", default, deserialize_with = "lenient::flag")]
    pub not_in_db: bool,
}

impl LineItem {
    /// Create a line with only the required fields set.
    pub fn new(part_number: impl Into<String>, value_usd: Decimal) -> Self {
        Self {
            part_number: part_number.into(),
            value_usd,
            ..Self::default()
        }
    }

    /// Set the HTS code.
    pub fn with_hts(mut self, hts_code: impl Into<String>) -> Self {
        self.hts_code = Some(hts_code.into());
        self
    }

    /// Set the unit of quantity.
    pub fn with_unit(mut self, qty_unit: impl Into<String>) -> Self {
        self.qty_unit = Some(qty_unit.into());
        self
    }

    /// Set the piece count.
    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Set one material percentage.
    pub fn with_ratio(mut self, content_type: ContentType, pct: Decimal) -> Self {
        let mut ratios = self.ratios();
        ratios.set(content_type, pct);
        self.set_ratios(ratios);
        self
    }

    /// Set the invoice number.
    pub fn with_invoice(mut self, invoice_number: impl Into<String>) -> Self {
        self.invoice_number = Some(invoice_number.into());
        self
    }

    /// Material percentages of this line.
    pub fn ratios(&self) -> MaterialRatios {
        MaterialRatios {
            steel: self.steel_ratio,
            aluminum: self.aluminum_ratio,
            copper: self.copper_ratio,
            wood: self.wood_ratio,
            auto: self.auto_ratio,
            non_232: self.non_steel_ratio,
        }
    }

    /// Overwrite all six material percentages.
    pub fn set_ratios(&mut self, ratios: MaterialRatios) {
        self.steel_ratio = ratios.steel;
        self.aluminum_ratio = ratios.aluminum;
        self.copper_ratio = ratios.copper;
        self.wood_ratio = ratios.wood;
        self.auto_ratio = ratios.auto;
        self.non_steel_ratio = ratios.non_232;
    }

    /// HTS code or an empty string.
    pub fn hts(&self) -> &str {
        self.hts_code.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_emission_order() {
        let names: Vec<&str> = ContentType::ALL.iter().map(|ct| ct.as_str()).collect();
        assert_eq!(
            names,
            vec!["steel", "aluminum", "copper", "wood", "auto", "non_232"]
        );
    }

    #[test]
    fn test_from_material() {
        assert_eq!(ContentType::from_material("Aluminum"), Some(ContentType::Aluminum));
        assert_eq!(ContentType::from_material("Steel"), Some(ContentType::Steel));
        assert_eq!(ContentType::from_material("steel"), None);
        assert_eq!(ContentType::from_material("Plastic"), None);
    }

    #[test]
    fn test_ratios_round_trip_through_line() {
        let line = LineItem::new("P-1", Decimal::new(100, 0))
            .with_ratio(ContentType::Steel, Decimal::new(60, 0))
            .with_ratio(ContentType::Non232, Decimal::new(40, 0));

        assert_eq!(line.non_steel_ratio, Decimal::new(40, 0));
        assert_eq!(line.ratios().total(), Decimal::new(100, 0));
        assert!(!line.ratios().is_all_zero());
    }

    #[test]
    fn test_deserialize_invoice_row() {
        let line: LineItem = serde_json::from_str(
            r#"{
                "part_number": "BRK-100",
                "value_usd": "1,250.00",
                "hts_code": "7326.90.8688",
                "quantity": "12",
                "qty_unit": "NO",
                "steel_ratio": 80,
                "non_steel_ratio": "twenty",
                "Sec301_Exclusion_Tariff": "9903.88.69"
            }"#,
        )
        .unwrap();

        assert_eq!(line.value_usd, Decimal::new(125000, 2));
        assert_eq!(line.quantity, Some(Decimal::new(12, 0)));
        assert_eq!(line.steel_ratio, Decimal::new(80, 0));
        assert_eq!(line.non_steel_ratio, Decimal::ZERO);
        assert_eq!(line.sec301_exclusion_tariff.as_deref(), Some("9903.88.69"));
        assert!(!line.not_in_db);
    }

    #[test]
    fn test_missing_required_column_fails() {
        let result: Result<LineItem, _> = serde_json::from_str(r#"{"part_number": "X"}"#);
        assert!(result.is_err());
    }
}
