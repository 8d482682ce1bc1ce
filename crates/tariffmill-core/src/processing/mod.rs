//! Invoice expansion pipeline.
//!
//! Processing runs in two phases. Every line is expanded first, because the
//! weight pool is the total value of the whole expanded batch. Only then are
//! weights, quantities and declaration fields filled in row by row.

mod classify;
mod expand;
mod merge;
mod quantity;
mod weight;

pub use classify::ClassificationAnnotator;
pub use expand::{Allocation, RatioExpander};
pub use merge::PartsMaster;
pub use quantity::{
    format_weight, QuantityInput, QuantityResolver, UnitCategory, COUNT_UNITS, DUAL_UNITS,
    MEASURE_UNITS, NO_QTY_UNITS, WEIGHT_REPORTED_CHAPTERS, WEIGHT_UNITS,
};
pub use weight::WeightAllocator;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::{ExpandedRow, LineItem, ProcessingResult};
use crate::tariff::{TariffClassifier, TariffInfo, TariffLookup};

/// Expand, weigh and classify an invoice batch.
///
/// `net_weight` is the total net weight (kg) of the shipment and `mid` the
/// manufacturer ID whose first two characters stand in for missing country
/// codes.
pub fn process_invoice<C>(
    lines: &[LineItem],
    net_weight: Decimal,
    mid: &str,
    classifier: &C,
) -> Result<ProcessingResult>
where
    C: TariffClassifier + ?Sized,
{
    check_batch(lines)?;

    let expander = RatioExpander::new(classifier);
    let mut rows: Vec<ExpandedRow> = lines.iter().flat_map(|line| expander.expand_rows(line)).collect();
    debug!("Expanded {} lines into {} rows", lines.len(), rows.len());

    let total_value = WeightAllocator::new(net_weight).allocate(&mut rows)?;

    let quantities = QuantityResolver::new();
    let annotator = ClassificationAnnotator::new(classifier, mid);
    for row in rows.iter_mut() {
        quantities.apply(row);
        annotator.annotate(row);
    }

    let result = ProcessingResult::new(rows, lines.len(), total_value, net_weight);
    info!("Processed invoice: {}", result);

    Ok(result)
}

fn check_batch(lines: &[LineItem]) -> std::result::Result<(), ProcessingError> {
    if lines.is_empty() {
        return Err(ProcessingError::EmptyBatch);
    }

    if lines.iter().all(|line| line.part_number.trim().is_empty()) {
        return Err(ProcessingError::MissingField("part_number".to_string()));
    }

    Ok(())
}

/// Caller-owned processor bundling a tariff classifier.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use tariffmill_core::models::{ContentType, LineItem};
/// use tariffmill_core::processing::InvoiceProcessor;
/// use tariffmill_core::tariff::TariffTable;
///
/// let processor = InvoiceProcessor::from_table(TariffTable::new());
/// let line = LineItem::new("BRK-100", Decimal::new(1000, 0))
///     .with_ratio(ContentType::Steel, Decimal::new(60, 0))
///     .with_ratio(ContentType::Aluminum, Decimal::new(40, 0));
///
/// let result = processor.process(&[line], Decimal::new(500, 0), "CNABC123").unwrap();
/// assert_eq!(result.expanded_row_count(), 2);
/// assert_eq!(result.data()[0].flag_232, "232_Steel");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InvoiceProcessor<C = TariffLookup> {
    classifier: C,
}

impl InvoiceProcessor<TariffLookup> {
    /// Processor backed by an in-memory tariff table.
    pub fn from_table(table: crate::tariff::TariffTable) -> Self {
        Self::new(TariffLookup::new(table))
    }
}

impl<C: TariffClassifier> InvoiceProcessor<C> {
    /// Create a processor around a classifier.
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// The tariff classifier.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Process a batch of invoice lines.
    pub fn process(&self, lines: &[LineItem], net_weight: Decimal, mid: &str) -> Result<ProcessingResult> {
        process_invoice(lines, net_weight, mid, &self.classifier)
    }

    /// Enrich lines from a parts master, then process them.
    pub fn process_with_parts(
        &self,
        lines: &[LineItem],
        parts: &PartsMaster,
        net_weight: Decimal,
        mid: &str,
    ) -> Result<ProcessingResult> {
        let merged = parts.merge(lines);
        self.process(&merged, net_weight, mid)
    }

    /// Look up tariff information for one HTS code.
    pub fn lookup_tariff(&self, hts_code: &str) -> TariffInfo {
        self.classifier.get_info(hts_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TariffmillError;
    use crate::models::{ContentType, PartRecord};
    use crate::tariff::{TariffRecord, TariffTable};
    use pretty_assertions::assert_eq;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn processor() -> InvoiceProcessor {
        InvoiceProcessor::from_table(TariffTable::from_records(vec![
            TariffRecord::new("7616.99.51", "Aluminum", "07 - SMELT & CAST"),
            TariffRecord::new("7326.90.86", "Steel", "08 - MELT & POUR"),
            TariffRecord::new("7408.11.60", "Copper", "11 - SMELT & CAST"),
        ]))
    }

    #[test]
    fn test_steel_aluminum_split_end_to_end() {
        let line = LineItem::new("BRK-100", dec(1000))
            .with_ratio(ContentType::Steel, dec(60))
            .with_ratio(ContentType::Aluminum, dec(40));

        let result = processor().process(&[line], dec(500), "CNABC123").unwrap();

        assert_eq!(result.original_row_count(), 1);
        assert_eq!(result.expanded_row_count(), 2);
        assert_eq!(result.total_value(), dec(1000));
        assert_eq!(result.total_weight(), dec(500));

        let steel = &result.data()[0];
        assert_eq!(steel.value_usd, dec(600));
        assert_eq!(steel.calc_wt_net, dec(300));
        assert_eq!(steel.flag_232, "232_Steel");
        assert_eq!(steel.dec_type_cd, "08");
        assert_eq!(steel.qty2, "300");

        let aluminum = &result.data()[1];
        assert_eq!(aluminum.value_usd, dec(400));
        assert_eq!(aluminum.calc_wt_net, dec(200));
        assert_eq!(aluminum.flag_232, "232_Aluminum");
        assert_eq!(aluminum.dec_type_cd, "07");
        assert_eq!(aluminum.country_of_melt, "CN");
    }

    #[test]
    fn test_unclassified_line_becomes_single_steel_row() {
        let line = LineItem::new("MISC-1", dec(250)).with_hts("9403.20.0050");

        let result = processor().process(&[line], dec(10), "").unwrap();

        assert_eq!(result.expanded_row_count(), 1);
        let row = &result.data()[0];
        assert_eq!(row.content_type, ContentType::Steel);
        assert_eq!(row.ratio(), dec(100));
        assert_eq!(row.value_usd, dec(250));
        assert_eq!(row.dec_type_cd, "08");
        assert_eq!(row.calc_wt_net, dec(10));
    }

    #[test]
    fn test_weight_pool_spans_all_lines() {
        let lines = vec![
            LineItem::new("A", dec(300))
                .with_ratio(ContentType::Steel, dec(50))
                .with_ratio(ContentType::Non232, dec(50)),
            LineItem::new("B", dec(100)).with_hts("7408.11.6000"),
        ];

        let result = processor().process(&lines, dec(40), "").unwrap();

        let weights: Vec<Decimal> = result.data().iter().map(|r| r.calc_wt_net).collect();
        assert_eq!(weights, vec![dec(15), dec(15), dec(10)]);
        assert_eq!(result.data()[2].content_type, ContentType::Copper);
        assert_eq!(result.data()[2].declaration_flag, "Y");
        assert_eq!(result.data()[2].dec_type_cd, "11");
    }

    #[test]
    fn test_quantities_follow_units() {
        let lines = vec![
            LineItem::new("A", dec(100))
                .with_hts("7616.99.5190")
                .with_unit("PCS")
                .with_quantity(dec(25)),
            LineItem::new("B", dec(100))
                .with_hts("7308.90.9590")
                .with_unit("M2")
                .with_quantity(dec(8)),
        ];

        let result = processor().process(&lines, dec(90), "").unwrap();

        assert_eq!(result.data()[0].qty1, "25");
        assert_eq!(result.data()[0].qty2, "45");
        assert_eq!(result.data()[1].qty1, "");
        assert_eq!(result.data()[1].qty2, "");
    }

    #[test]
    fn test_zero_value_batch() {
        let lines = vec![
            LineItem::new("A", Decimal::ZERO).with_ratio(ContentType::Steel, dec(100)),
            LineItem::new("B", Decimal::ZERO).with_unit("KG"),
        ];

        let result = processor().process(&lines, dec(100), "").unwrap();

        assert_eq!(result.total_value(), Decimal::ZERO);
        assert!(result.data().iter().all(|r| r.calc_wt_net.is_zero()));
        assert!(result.data().iter().all(|r| r.qty1.is_empty() && r.qty2.is_empty()));
    }

    #[test]
    fn test_large_line_value_is_conserved() {
        let value = Decimal::from_i128_with_scale(2 * 10i128.pow(27), 0);
        let line = LineItem::new("BIG-1", value)
            .with_ratio(ContentType::Steel, dec(60))
            .with_ratio(ContentType::Aluminum, dec(40));

        let result = processor().process(&[line], dec(1000), "").unwrap();

        let values: Vec<Decimal> = result.data().iter().map(|r| r.value_usd).collect();
        assert!(values.iter().all(|v| !v.is_zero()));
        assert_eq!(values.iter().copied().sum::<Decimal>(), value);
        assert_eq!(result.data()[0].calc_wt_net, dec(600));
    }

    #[test]
    fn test_batch_value_overflow_is_rejected() {
        let huge = Decimal::from_i128_with_scale(5 * 10i128.pow(28), 0);
        let lines = vec![LineItem::new("A", huge), LineItem::new("B", huge)];

        let err = processor().process(&lines, dec(1), "").unwrap_err();
        assert!(matches!(
            err,
            TariffmillError::Processing(ProcessingError::ValueOverflow)
        ));
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let err = processor().process(&[], dec(1), "").unwrap_err();
        assert!(matches!(
            err,
            TariffmillError::Processing(ProcessingError::EmptyBatch)
        ));
    }

    #[test]
    fn test_batch_without_part_numbers_is_rejected() {
        let lines = vec![LineItem::new("", dec(1)), LineItem::new("  ", dec(2))];
        let err = processor().process(&lines, dec(1), "").unwrap_err();
        assert!(matches!(
            err,
            TariffmillError::Processing(ProcessingError::MissingField(ref f)) if f == "part_number"
        ));
    }

    #[test]
    fn test_process_with_parts() {
        let mut part = PartRecord::new("BRK-100");
        part.aluminum_ratio = Some(dec(100));
        part.hts_code = Some("7616.99.5160".to_string());
        let parts = PartsMaster::from_records(vec![part]);

        let lines = vec![
            LineItem::new("BRK-100", dec(50)),
            LineItem::new("NEW-1", dec(50)),
        ];

        let result = processor()
            .process_with_parts(&lines, &parts, dec(20), "MXABC")
            .unwrap();

        assert_eq!(result.data()[0].content_type, ContentType::Aluminum);
        assert!(!result.data()[0].not_in_db);
        assert_eq!(result.data()[1].content_type, ContentType::Steel);
        assert!(result.data()[1].not_in_db);
        assert_eq!(result.data()[1].country_of_cast, "MX");
    }

    #[test]
    fn test_closure_classifier() {
        let processor = InvoiceProcessor::new(|code: &str| {
            if code.starts_with("44") {
                TariffInfo::from_record(&TariffRecord::new(code, "Wood", "10 - HARVEST"))
            } else {
                TariffInfo::unmatched()
            }
        });

        let line = LineItem::new("TBL-1", dec(80)).with_hts("4418.99");
        let result = processor.process(&[line], dec(8), "").unwrap();

        assert_eq!(result.data()[0].flag_232, "232_Wood");
        assert_eq!(result.data()[0].dec_type_cd, "10");
        assert_eq!(processor.lookup_tariff("4418").smelt_flag, "Y");
    }
}
