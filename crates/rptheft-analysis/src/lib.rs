//! rptheft-analysis crate
//!
//! Slot classification: address normalization, relay canonicalization, wei
//! conversion, vanilla-block and theft detection, plus the pipeline and batch
//! runner that apply them to whole datasets.

pub mod address;
pub mod batch;
pub mod pipeline;
pub mod relay;
pub mod surrounding;
pub mod theft;
pub mod units;
pub mod vanilla;

pub use pipeline::{enrich_dataset, enrich_record, EnrichOptions};
pub use theft::detect_theft;
