//! In-memory tariff table.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use super::{normalize_hts, TariffRecord, TariffSource};
use crate::error::TariffError;

/// Tariff records keyed by normalized HTS code.
#[derive(Debug, Clone, Default)]
pub struct TariffTable {
    records: HashMap<String, TariffRecord>,
}

/// Value side of the JSON mapping form (`{"7208100000": {...}}`).
#[derive(Debug, Deserialize)]
struct MappedRecord {
    #[serde(default)]
    material: String,
    #[serde(default)]
    declaration_required: String,
}

impl TariffTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from records.
    ///
    /// Codes are normalized, records with a blank code are skipped, and a
    /// later record replaces an earlier one with the same code.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = TariffRecord>,
    {
        let mut table = Self::new();
        for record in records {
            table.insert(record);
        }
        debug!("Loaded {} tariff codes", table.len());
        table
    }

    /// Build a table from a JSON object mapping HTS code to
    /// `{"material": ..., "declaration_required": ...}`.
    pub fn from_json_map(json: &str) -> Result<Self, TariffError> {
        let map: HashMap<String, MappedRecord> =
            serde_json::from_str(json).map_err(|e| TariffError::Parse(e.to_string()))?;

        Ok(Self::from_records(map.into_iter().map(|(code, rec)| {
            TariffRecord::new(code, rec.material, rec.declaration_required)
        })))
    }

    /// Build a table from a JSON array of records.
    pub fn from_json_records(json: &str) -> Result<Self, TariffError> {
        let records: Vec<TariffRecord> =
            serde_json::from_str(json).map_err(|e| TariffError::Parse(e.to_string()))?;
        Ok(Self::from_records(records))
    }

    /// Insert a record under its normalized code.
    pub fn insert(&mut self, mut record: TariffRecord) {
        let key = normalize_hts(&record.hts_code);
        if key.is_empty() {
            return;
        }
        record.hts_code = key.clone();
        record.material = record.material.trim().to_string();
        self.records.insert(key, record);
    }

    /// Number of codes in the table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no codes.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TariffSource for TariffTable {
    fn record(&self, key: &str) -> Option<Cow<'_, TariffRecord>> {
        self.records.get(key).map(Cow::Borrowed)
    }
}

impl FromIterator<TariffRecord> for TariffTable {
    fn from_iter<T: IntoIterator<Item = TariffRecord>>(iter: T) -> Self {
        Self::from_records(iter)
    }
}
