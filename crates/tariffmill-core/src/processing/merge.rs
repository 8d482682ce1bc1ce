//! Parts-master enrichment of invoice lines.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::models::{LineItem, PartRecord};

/// Parts master indexed by part number.
#[derive(Debug, Clone, Default)]
pub struct PartsMaster {
    parts: HashMap<String, PartRecord>,
}

impl PartsMaster {
    /// Index records by part number. The first record for a part wins;
    /// blank part numbers are skipped.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PartRecord>,
    {
        let mut parts = HashMap::new();
        let mut duplicates = 0usize;

        for record in records {
            let key = record.part_number.trim().to_string();
            if key.is_empty() {
                continue;
            }
            if parts.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            parts.insert(key, record);
        }

        if duplicates > 0 {
            warn!("Parts master has {} duplicate part numbers; kept the first of each", duplicates);
        }

        Self { parts }
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the master is empty.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Master record for a part number.
    pub fn get(&self, part_number: &str) -> Option<&PartRecord> {
        self.parts.get(part_number.trim())
    }

    /// Left-join invoice lines with the master.
    ///
    /// Non-blank master fields replace the invoice values; blank master
    /// fields keep them. Lines without a master record are marked
    /// `not_in_db`. An empty master returns the lines unchanged.
    pub fn merge(&self, lines: &[LineItem]) -> Vec<LineItem> {
        if self.is_empty() {
            return lines.to_vec();
        }

        let mut unmatched = 0usize;
        let merged: Vec<LineItem> = lines
            .iter()
            .map(|line| {
                let mut line = line.clone();
                match self.get(&line.part_number) {
                    Some(part) => {
                        apply_part(&mut line, part);
                        line.not_in_db = false;
                    }
                    None => {
                        unmatched += 1;
                        line.not_in_db = true;
                    }
                }
                line
            })
            .collect();

        info!(
            "Merged {} lines with parts master ({} not found)",
            merged.len(),
            unmatched
        );

        merged
    }
}

impl FromIterator<PartRecord> for PartsMaster {
    fn from_iter<T: IntoIterator<Item = PartRecord>>(iter: T) -> Self {
        Self::from_records(iter)
    }
}

fn apply_part(line: &mut LineItem, part: &PartRecord) {
    override_text(&mut line.hts_code, &part.hts_code);
    override_text(&mut line.qty_unit, &part.qty_unit);
    override_text(&mut line.country_of_melt, &part.country_of_melt);
    override_text(&mut line.country_of_cast, &part.country_of_cast);
    override_text(&mut line.country_of_smelt, &part.country_of_smelt);
    override_text(&mut line.sec301_exclusion_tariff, &part.sec301_exclusion_tariff);

    override_ratio(&mut line.steel_ratio, part.steel_ratio);
    override_ratio(&mut line.aluminum_ratio, part.aluminum_ratio);
    override_ratio(&mut line.copper_ratio, part.copper_ratio);
    override_ratio(&mut line.wood_ratio, part.wood_ratio);
    override_ratio(&mut line.auto_ratio, part.auto_ratio);
    override_ratio(&mut line.non_steel_ratio, part.non_steel_ratio);
}

fn override_text(target: &mut Option<String>, master: &Option<String>) {
    if let Some(value) = master.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        *target = Some(value.to_string());
    }
}

fn override_ratio(target: &mut Decimal, master: Option<Decimal>) {
    if let Some(value) = master {
        *target = value;
    }
}
