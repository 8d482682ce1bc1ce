//! Error types for the tariffmill-core library.

use thiserror::Error;

/// Main error type for the tariffmill library.
#[derive(Error, Debug)]
pub enum TariffmillError {
    /// Batch-level processing failure.
    #[error("processing error: {0}")]
    Processing(#[from] ProcessingError),

    /// Tariff table could not be loaded.
    #[error("tariff error: {0}")]
    Tariff(#[from] TariffError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Structural problems with an invoice batch.
///
/// Data-quality issues on individual cells never end up here; they degrade to
/// zero or empty values instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProcessingError {
    /// The batch contains no line items.
    #[error("invoice batch is empty")]
    EmptyBatch,

    /// A required field is blank on every line of the batch.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The batch total value exceeds the decimal range.
    #[error("total invoice value is out of range")]
    ValueOverflow,
}

/// Errors related to tariff table sources.
#[derive(Error, Debug)]
pub enum TariffError {
    /// Failed to parse tariff data.
    #[error("failed to parse tariff data: {0}")]
    Parse(String),
}

/// Result type for the tariffmill library.
pub type Result<T> = std::result::Result<T, TariffmillError>;
