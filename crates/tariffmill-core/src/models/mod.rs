//! Data models for invoice lines, expanded customs rows and configuration.

pub mod config;
pub mod expanded;
pub mod lenient;
pub mod line_item;
pub mod parts;

pub use config::{OutputFormat, TariffmillConfig};
pub use expanded::{ExpandedRow, ProcessingResult};
pub use line_item::{ContentType, LineItem, MaterialRatios};
pub use parts::PartRecord;
