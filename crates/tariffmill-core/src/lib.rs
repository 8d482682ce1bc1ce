//! Core library for Section 232 invoice processing.
//!
//! This crate provides:
//! - Material ratio expansion (one output row per Section 232 content type)
//! - Batch-wide net weight allocation by value
//! - CBP Qty1/Qty2 resolution from the unit-of-quantity taxonomy
//! - HTS tariff lookup (10-digit, then 8-digit prefix)
//! - Declaration codes, smelt flags and country attribution
//! - Parts-master enrichment of invoice lines

pub mod error;
pub mod models;
pub mod processing;
pub mod tariff;

pub use error::{ProcessingError, Result, TariffError, TariffmillError};
pub use models::{
    ContentType, ExpandedRow, LineItem, MaterialRatios, OutputFormat, PartRecord,
    ProcessingResult, TariffmillConfig,
};
pub use processing::{process_invoice, InvoiceProcessor, PartsMaster, QuantityResolver};
pub use tariff::{TariffClassifier, TariffInfo, TariffLookup, TariffRecord, TariffTable};
