//! Section 232 flags, declaration codes and country attribution.

use crate::models::ExpandedRow;
use crate::tariff::TariffClassifier;

/// Annotates expanded rows with declaration fields.
pub struct ClassificationAnnotator<'a, C: ?Sized> {
    classifier: &'a C,
    mid: &'a str,
    country_fallback: String,
}

impl<'a, C: TariffClassifier + ?Sized> ClassificationAnnotator<'a, C> {
    /// Create an annotator for a batch with manufacturer ID `mid`.
    pub fn new(classifier: &'a C, mid: &'a str) -> Self {
        Self {
            classifier,
            mid,
            country_fallback: mid.chars().take(2).collect(),
        }
    }

    /// Country code used when a row has no explicit country.
    pub fn country_fallback(&self) -> &str {
        &self.country_fallback
    }

    /// Fill `_232_flag`, `DecTypeCd`, country columns, `DeclarationFlag` and `MID`.
    pub fn annotate(&self, row: &mut ExpandedRow) {
        let info = self.classifier.get_info(&row.hts_code);

        row.flag_232 = row.content_type.flag_232().to_string();

        row.dec_type_cd = if info.declaration_code.is_empty() {
            row.content_type
                .fallback_declaration_code()
                .unwrap_or_default()
                .to_string()
        } else {
            info.declaration_code
        };

        row.country_of_melt = self.country(row.source_countries.melt.as_deref());
        row.country_of_cast = self.country(row.source_countries.cast.as_deref());
        row.prim_country_of_smelt = self.country(row.source_countries.smelt.as_deref());

        row.declaration_flag = info.smelt_flag;
        row.mid = self.mid.to_string();
    }

    /// Explicit non-blank cell as given, else the MID prefix.
    fn country(&self, explicit: Option<&str>) -> String {
        match explicit {
            Some(code) if !code.trim().is_empty() => code.to_string(),
            _ => self.country_fallback.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, LineItem};
    use crate::tariff::{TariffLookup, TariffRecord, TariffTable};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn tariffs() -> TariffLookup {
        TariffLookup::new(TariffTable::from_records(vec![
            TariffRecord::new("7616.99.51", "Aluminum", "07 - SMELT & CAST"),
            TariffRecord::new("7326.90.86", "Steel", "08 - MELT & POUR"),
        ]))
    }

    fn row(line: &LineItem, content_type: ContentType) -> ExpandedRow {
        ExpandedRow::from_line(line, content_type, line.value_usd, Decimal::ONE_HUNDRED)
    }

    #[test]
    fn test_flags_per_content_type() {
        let tariffs = TariffLookup::empty();
        let annotator = ClassificationAnnotator::new(&tariffs, "");
        let line = LineItem::new("P", Decimal::ONE);

        let expected = [
            (ContentType::Steel, "232_Steel", "08"),
            (ContentType::Aluminum, "232_Aluminum", "07"),
            (ContentType::Copper, "232_Copper", "11"),
            (ContentType::Wood, "232_Wood", "10"),
            (ContentType::Auto, "232_Auto", ""),
            (ContentType::Non232, "Non_232", ""),
        ];

        for (ct, flag, dec) in expected {
            let mut r = row(&line, ct);
            annotator.annotate(&mut r);
            assert_eq!(r.flag_232, flag);
            assert_eq!(r.dec_type_cd, dec, "content type {}", ct);
            assert_eq!(r.declaration_flag, "");
        }
    }

    #[test]
    fn test_lookup_declaration_wins_over_fallback() {
        let tariffs = tariffs();
        let annotator = ClassificationAnnotator::new(&tariffs, "CNABCMAN123GUA");
        let line = LineItem::new("P", Decimal::ONE).with_hts("7616.99.5190");

        let mut steel = row(&line, ContentType::Steel);
        annotator.annotate(&mut steel);
        assert_eq!(steel.dec_type_cd, "07");
        assert_eq!(steel.declaration_flag, "Y");

        let mut non232 = row(&line, ContentType::Non232);
        annotator.annotate(&mut non232);
        assert_eq!(non232.dec_type_cd, "07");
        assert_eq!(non232.flag_232, "Non_232");
    }

    #[test]
    fn test_country_fallback_from_mid() {
        let tariffs = tariffs();
        let annotator = ClassificationAnnotator::new(&tariffs, "CNABCMAN123GUA");
        let mut line = LineItem::new("P", Decimal::ONE).with_hts("7326.90.8688");
        line.country_of_melt = Some("KR".to_string());
        line.country_of_smelt = Some("  ".to_string());

        let mut r = row(&line, ContentType::Steel);
        annotator.annotate(&mut r);

        assert_eq!(r.country_of_melt, "KR");
        assert_eq!(r.country_of_cast, "CN");
        assert_eq!(r.prim_country_of_smelt, "CN");
        assert_eq!(r.mid, "CNABCMAN123GUA");
        assert_eq!(r.dec_type_cd, "08");
    }

    #[test]
    fn test_short_or_missing_mid() {
        let tariffs = TariffLookup::empty();
        assert_eq!(ClassificationAnnotator::new(&tariffs, "").country_fallback(), "");
        assert_eq!(ClassificationAnnotator::new(&tariffs, "M").country_fallback(), "M");
    }

    #[test]
    fn test_mid_and_countries_are_used_as_given() {
        let tariffs = TariffLookup::empty();
        let annotator = ClassificationAnnotator::new(&tariffs, " CNABC");
        let mut line = LineItem::new("P", Decimal::ONE);
        line.country_of_cast = Some("MX ".to_string());

        let mut r = row(&line, ContentType::Steel);
        annotator.annotate(&mut r);

        assert_eq!(annotator.country_fallback(), " C");
        assert_eq!(r.country_of_melt, " C");
        assert_eq!(r.country_of_cast, "MX ");
        assert_eq!(r.mid, " CNABC");
    }
}
