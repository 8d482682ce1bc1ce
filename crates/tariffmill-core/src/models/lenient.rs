//! Lenient cell deserializers for spreadsheet-style input.
//!
//! Invoice and parts tables come from CSV exports, JSON dumps, and hand-edited
//! sheets. A single malformed cell must never abort a batch, so these helpers
//! turn blank or unparseable values into `None` (or zero) instead of failing.
//!
//! Text cells accept numbers as well as strings, so a JSON `"part_number": 12345`
//! becomes `"12345"`. Codes such as `0106900000` only keep their leading zeros
//! when they arrive as strings; tabular readers should hand cells over as text.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Deserializer, Visitor};

/// Parse a numeric cell such as `"1,234.50"`, `" 60 "`, `"40%"` or `"1e3"`.
///
/// Returns `None` for blank or non-numeric input.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Optional decimal cell; blank or malformed cells become `None`.
pub fn decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(DecimalCell)
}

/// Decimal cell defaulting to zero.
pub fn decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decimal(deserializer)?.unwrap_or(Decimal::ZERO))
}

/// Optional text cell; surrounding whitespace is trimmed and blank becomes `None`.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(TextCell)
}

/// Text cell defaulting to an empty string.
pub fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text(deserializer)?.unwrap_or_default())
}

/// Boolean marker cell (`true`, `1`, `yes`, `y`); anything else is `false`.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserializer.deserialize_option(FlagCell)?.unwrap_or(false))
}

struct DecimalCell;

impl<'de> Visitor<'de> for DecimalCell {
    type Value = Option<Decimal>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or numeric string")
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(DecimalCell)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        // Display gives the shortest round-trip form, e.g. 1000.1 rather than
        // 1000.1000000000000227.
        Ok(parse_decimal(&v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(parse_decimal(v))
    }
}

struct TextCell;

impl<'de> Visitor<'de> for TextCell {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(TextCell)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }
}

struct FlagCell;

impl<'de> Visitor<'de> for FlagCell {
    type Value = Option<bool>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a boolean marker")
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(FlagCell)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v != 0))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v != 0))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v != 0.0))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let v = v.trim().to_lowercase();
        Ok(Some(matches!(v.as_str(), "true" | "1" | "yes" | "y")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "decimal")]
        amount: Option<Decimal>,
        #[serde(default, deserialize_with = "decimal_or_zero")]
        ratio: Decimal,
        #[serde(default, deserialize_with = "text")]
        code: Option<String>,
        #[serde(default, deserialize_with = "flag")]
        marker: bool,
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1,234.50"), Some(Decimal::new(123450, 2)));
        assert_eq!(parse_decimal(" 60 "), Some(Decimal::new(60, 0)));
        assert_eq!(parse_decimal("40%"), Some(Decimal::new(40, 0)));
        assert_eq!(parse_decimal("1e3"), Some(Decimal::new(1000, 0)));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("n/a"), None);
    }

    #[test]
    fn test_json_cells() {
        let row: Row = serde_json::from_str(
            r#"{"amount": 1000.1, "ratio": "abc", "code": "  7208.10  ", "marker": true}"#,
        )
        .unwrap();

        assert_eq!(row.amount, Some(Decimal::new(10001, 1)));
        assert_eq!(row.ratio, Decimal::ZERO);
        assert_eq!(row.code.as_deref(), Some("7208.10"));
        assert!(row.marker);
    }

    #[test]
    fn test_numeric_text_cells() {
        let row: Row = serde_json::from_str(r#"{"code": 7326908688}"#).unwrap();
        assert_eq!(row.code.as_deref(), Some("7326908688"));

        let row: Row = serde_json::from_str(r#"{"code": 12.5}"#).unwrap();
        assert_eq!(row.code.as_deref(), Some("12.5"));

        let row: Row = serde_json::from_str(r#"{"code": "0106900000"}"#).unwrap();
        assert_eq!(row.code.as_deref(), Some("0106900000"));
    }

    #[test]
    fn test_json_nulls_and_missing() {
        let row: Row = serde_json::from_str(r#"{"amount": null, "code": "   "}"#).unwrap();

        assert_eq!(row.amount, None);
        assert_eq!(row.ratio, Decimal::ZERO);
        assert_eq!(row.code, None);
        assert!(!row.marker);
    }
}
