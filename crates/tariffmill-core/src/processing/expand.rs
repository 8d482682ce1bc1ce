//! Material ratio expansion.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::{ContentType, ExpandedRow, LineItem, MaterialRatios};
use crate::tariff::TariffClassifier;

/// Share of a line's value attributed to one content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub content_type: ContentType,
    /// Allocated value in USD.
    pub value: Decimal,
    /// Allocation percentage (0-100).
    pub ratio: Decimal,
}

/// Splits invoice lines into one row per material with nonzero content.
pub struct RatioExpander<'a, C: ?Sized> {
    classifier: &'a C,
}

impl<'a, C: TariffClassifier + ?Sized> RatioExpander<'a, C> {
    /// Create an expander that classifies unratioed lines with `classifier`.
    pub fn new(classifier: &'a C) -> Self {
        Self { classifier }
    }

    /// Allocations for one line, in steel, aluminum, copper, wood, auto,
    /// non_232 order.
    ///
    /// Lines with no ratios at all take their material from the tariff
    /// table; when the table has nothing either, the whole value is treated
    /// as steel. Ratios are not re-normalized, so percentages that do not add
    /// up to 100 carry straight through to the allocated values.
    pub fn expand(&self, line: &LineItem) -> Vec<Allocation> {
        let mut ratios = line.ratios();

        if ratios.is_all_zero() {
            ratios = self.classify_by_tariff(line);
        }

        ratios
            .iter()
            .filter(|(_, pct)| *pct > Decimal::ZERO)
            .map(|(content_type, pct)| {
                let value = allocate_value(line.value_usd, pct).unwrap_or_else(|| {
                    warn!(
                        "Value {} of part {} at {}% {} is out of range; allocated 0",
                        line.value_usd, line.part_number, pct, content_type
                    );
                    Decimal::ZERO
                });
                Allocation { content_type, value, ratio: pct }
            })
            .collect()
    }

    /// Expand a line straight into output rows.
    pub fn expand_rows(&self, line: &LineItem) -> Vec<ExpandedRow> {
        self.expand(line)
            .into_iter()
            .map(|a| ExpandedRow::from_line(line, a.content_type, a.value, a.ratio))
            .collect()
    }

    fn classify_by_tariff(&self, line: &LineItem) -> MaterialRatios {
        let info = self.classifier.get_info(line.hts());
        let content_type = info
            .material
            .as_deref()
            .and_then(ContentType::from_material)
            .unwrap_or_else(|| {
                debug!(
                    "No Section 232 material for part {} (HTS '{}'), defaulting to steel",
                    line.part_number,
                    line.hts()
                );
                ContentType::Steel
            });

        MaterialRatios::only(content_type, Decimal::ONE_HUNDRED)
    }
}

/// `value * (pct / 100)`. The share is at most 1 for ratios up to 100, so
/// only ratios above 100 can overflow.
fn allocate_value(value: Decimal, pct: Decimal) -> Option<Decimal> {
    pct.checked_div(Decimal::ONE_HUNDRED)
        .and_then(|share| value.checked_mul(share))
}
