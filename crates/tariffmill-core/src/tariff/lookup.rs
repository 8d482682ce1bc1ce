//! Tariff lookup with 10-digit then 8-digit matching.

use super::{normalize_hts, prefix, TariffClassifier, TariffInfo, TariffRecord, TariffSource, TariffTable};

/// Section 232 tariff lookup over a backing source.
///
/// # Example
///
/// ```
/// use tariffmill_core::tariff::{TariffLookup, TariffRecord, TariffTable};
///
/// let table = TariffTable::from_records(vec![
///     TariffRecord::new("7601.10.00", "Aluminum", "07 - SMELT & CAST"),
/// ]);
/// let lookup = TariffLookup::new(table);
///
/// let info = lookup.get_info("7601.10.0030");
/// assert_eq!(info.material.as_deref(), Some("Aluminum"));
/// assert_eq!(info.declaration_code, "07");
/// assert_eq!(info.smelt_flag, "Y");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TariffLookup<S = TariffTable> {
    source: S,
}

impl<S: TariffSource> TariffLookup<S> {
    /// Create a lookup over a source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Look up tariff information for an HTS code (dotted or undotted).
    ///
    /// Unknown or empty codes yield [`TariffInfo::unmatched`].
    pub fn get_info(&self, hts_code: &str) -> TariffInfo {
        self.resolve(hts_code)
    }

    /// Whether the code resolves to a record.
    pub fn contains(&self, hts_code: &str) -> bool {
        self.find(hts_code).is_some()
    }

    /// The backing source.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn resolve(&self, hts_code: &str) -> TariffInfo {
        match self.find(hts_code) {
            Some(record) => TariffInfo::from_record(&record),
            None => TariffInfo::unmatched(),
        }
    }

    fn find(&self, hts_code: &str) -> Option<TariffRecord> {
        let normalized = normalize_hts(hts_code);
        if normalized.is_empty() {
            return None;
        }

        let hts_10 = prefix(&normalized, 10);
        let hts_8 = prefix(&normalized, 8);

        self.source
            .record(hts_10)
            .or_else(|| self.source.record(hts_8))
            .map(|record| record.into_owned())
    }
}

impl TariffLookup<TariffTable> {
    /// Lookup with no tariff data; every code is unmatched.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of codes in the table.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Whether the table has no codes.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

impl<S: TariffSource> TariffClassifier for TariffLookup<S> {
    fn get_info(&self, hts_code: &str) -> TariffInfo {
        self.resolve(hts_code)
    }
}

impl From<TariffTable> for TariffLookup<TariffTable> {
    fn from(table: TariffTable) -> Self {
        Self::new(table)
    }
}
