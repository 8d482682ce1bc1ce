//! Batch-wide net weight allocation.

use rust_decimal::Decimal;
use tracing::warn;

use crate::error::ProcessingError;
use crate::models::ExpandedRow;

/// Distributes one net weight across all rows of a batch by value.
#[derive(Debug, Clone, Copy)]
pub struct WeightAllocator {
    net_weight: Decimal,
}

impl WeightAllocator {
    pub fn new(net_weight: Decimal) -> Self {
        Self { net_weight }
    }

    /// Sum of row values, `None` when it exceeds the decimal range.
    pub fn total_value(rows: &[ExpandedRow]) -> Option<Decimal> {
        rows.iter()
            .try_fold(Decimal::ZERO, |total, row| total.checked_add(row.value_usd))
    }

    /// Set `calc_wt_net` on every row and return the batch total value.
    ///
    /// Each row gets `value / total_value * net_weight`, unrounded. The pool
    /// is the whole batch, not the source line. A zero total value or a
    /// non-positive net weight gives every row zero weight.
    pub fn allocate(&self, rows: &mut [ExpandedRow]) -> Result<Decimal, ProcessingError> {
        let total_value = Self::total_value(rows).ok_or(ProcessingError::ValueOverflow)?;

        if total_value.is_zero() || self.net_weight <= Decimal::ZERO {
            if !rows.is_empty() {
                warn!(
                    "Cannot distribute net weight {} over total value {}; all weights set to 0",
                    self.net_weight, total_value
                );
            }
            for row in rows.iter_mut() {
                row.calc_wt_net = Decimal::ZERO;
            }
            return Ok(total_value);
        }

        for row in rows.iter_mut() {
            row.calc_wt_net = self.share(row.value_usd, total_value);
        }

        Ok(total_value)
    }

    fn share(&self, value: Decimal, total_value: Decimal) -> Decimal {
        value
            .checked_div(total_value)
            .and_then(|fraction| fraction.checked_mul(self.net_weight))
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, LineItem};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn row(value: Decimal) -> ExpandedRow {
        let line = LineItem::new("P", value);
        ExpandedRow::from_line(&line, ContentType::Steel, value, Decimal::ONE_HUNDRED)
    }

    #[test]
    fn test_proportional_allocation() {
        let mut rows = vec![row(Decimal::new(600, 0)), row(Decimal::new(400, 0))];

        let total = WeightAllocator::new(Decimal::new(500, 0)).allocate(&mut rows).unwrap();

        assert_eq!(total, Decimal::new(1000, 0));
        assert_eq!(rows[0].calc_wt_net, Decimal::new(300, 0));
        assert_eq!(rows[1].calc_wt_net, Decimal::new(200, 0));
    }

    #[test]
    fn test_zero_total_value() {
        let mut rows = vec![row(Decimal::ZERO), row(Decimal::ZERO)];

        let total = WeightAllocator::new(Decimal::new(500, 0)).allocate(&mut rows).unwrap();

        assert_eq!(total, Decimal::ZERO);
        assert!(rows.iter().all(|r| r.calc_wt_net.is_zero()));
    }

    #[test]
    fn test_non_positive_net_weight() {
        let mut rows = vec![row(Decimal::new(10, 0))];

        WeightAllocator::new(Decimal::new(-5, 0)).allocate(&mut rows).unwrap();
        assert_eq!(rows[0].calc_wt_net, Decimal::ZERO);

        WeightAllocator::new(Decimal::ZERO).allocate(&mut rows).unwrap();
        assert_eq!(rows[0].calc_wt_net, Decimal::ZERO);
    }

    #[test]
    fn test_total_value_overflow_is_an_error() {
        let huge = Decimal::from_i128_with_scale(5 * 10i128.pow(28), 0);
        let mut rows = vec![row(huge), row(huge)];

        assert_eq!(WeightAllocator::total_value(&rows), None);
        assert_eq!(
            WeightAllocator::new(Decimal::ONE).allocate(&mut rows),
            Err(ProcessingError::ValueOverflow)
        );
    }

    #[test]
    fn test_weights_are_unrounded() {
        let mut rows = vec![
            row(Decimal::ONE),
            row(Decimal::ONE),
            row(Decimal::ONE),
        ];

        WeightAllocator::new(Decimal::new(10, 0)).allocate(&mut rows).unwrap();

        let third = rows[0].calc_wt_net;
        assert!(third > Decimal::new(3333, 3) && third < Decimal::new(3334, 3));
    }

    proptest! {
        #[test]
        fn weight_is_conserved(
            cents in prop::collection::vec(1i64..10_000_000, 1..20),
            grams in 1i64..100_000_000,
        ) {
            let mut rows: Vec<ExpandedRow> = cents.iter().map(|c| row(Decimal::new(*c, 2))).collect();
            let net_weight = Decimal::new(grams, 3);

            WeightAllocator::new(net_weight).allocate(&mut rows).unwrap();

            let total: Decimal = rows.iter().map(|r| r.calc_wt_net).sum();
            prop_assert!((total - net_weight).abs() <= Decimal::new(1, 6));
        }
    }
}
