//! Section 232 tariff classification.
//!
//! A tariff table maps normalized HTS codes to a material and the declaration
//! CBP requires for it. Lookups try the 10-digit statistical suffix first and
//! fall back to the 8-digit subheading, because most tables only list
//! subheadings while some country-specific entries add the extra digits.

mod lookup;
mod table;

pub use lookup::TariffLookup;
pub use table::TariffTable;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::models::lenient;

/// Materials whose declarations require a primary country of smelt.
pub const SMELT_MATERIALS: [&str; 3] = ["Aluminum", "Wood", "Copper"];

/// A tariff table entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffRecord {
    /// HTS code as stored; normalized when loaded into a table.
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub hts_code: String,

    /// Material name, e.g. `Steel` or `Aluminum`.
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub material: String,

    /// Declaration text, e.g. `08 - MELT & POUR`.
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub declaration_required: String,
}

impl TariffRecord {
    pub fn new(
        hts_code: impl Into<String>,
        material: impl Into<String>,
        declaration_required: impl Into<String>,
    ) -> Self {
        Self {
            hts_code: hts_code.into(),
            material: material.into(),
            declaration_required: declaration_required.into(),
        }
    }

    /// Declaration code: the text before the first `" - "`, or all of it.
    pub fn declaration_code(&self) -> &str {
        match self.declaration_required.split_once(" - ") {
            Some((code, _)) => code,
            None => &self.declaration_required,
        }
    }
}

/// Result of a tariff lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TariffInfo {
    /// Resolved material, `None` when the code is not in the table.
    pub material: Option<String>,

    /// Declaration code, empty when unknown.
    pub declaration_code: String,

    /// `Y` for smelt-declared materials, otherwise empty.
    pub smelt_flag: String,
}

impl TariffInfo {
    /// Info for a code with no tariff record.
    pub fn unmatched() -> Self {
        Self::default()
    }

    /// Build info from a matched record.
    pub fn from_record(record: &TariffRecord) -> Self {
        let smelt_flag = if SMELT_MATERIALS.contains(&record.material.as_str()) {
            "Y"
        } else {
            ""
        };

        Self {
            material: Some(record.material.clone()),
            declaration_code: record.declaration_code().to_string(),
            smelt_flag: smelt_flag.to_string(),
        }
    }

    /// Whether the material requires a smelt declaration.
    pub fn requires_smelt(&self) -> bool {
        self.smelt_flag == "Y"
    }
}

/// Backing store addressed by normalized HTS code.
///
/// Implemented by the in-memory [`TariffTable`]; database-backed stores live
/// outside this crate and only need to answer keyed reads.
pub trait TariffSource {
    /// Record stored under an exact normalized key.
    fn record(&self, key: &str) -> Option<Cow<'_, TariffRecord>>;
}

/// Anything that can classify an HTS code.
pub trait TariffClassifier {
    /// Resolve material, declaration code and smelt flag. Never fails.
    fn get_info(&self, hts_code: &str) -> TariffInfo;
}

impl<F> TariffClassifier for F
where
    F: Fn(&str) -> TariffInfo,
{
    fn get_info(&self, hts_code: &str) -> TariffInfo {
        self(hts_code)
    }
}

/// Normalize an HTS code: drop dots, trim, uppercase.
pub fn normalize_hts(code: &str) -> String {
    code.replace('.', "").trim().to_uppercase()
}

/// HTS chapter (first two characters of the normalized code).
pub fn hts_chapter(code: &str) -> Option<String> {
    let normalized = normalize_hts(code);
    let chapter: String = normalized.chars().take(2).collect();
    if chapter.chars().count() == 2 {
        Some(chapter)
    } else {
        None
    }
}

/// First `n` characters of a normalized code.
pub(crate) fn prefix(normalized: &str, n: usize) -> &str {
    match normalized.char_indices().nth(n) {
        Some((idx, _)) => &normalized[..idx],
        None => normalized,
    }
}
