//! rptheft-data crate
//!
//! Slot record types and CSV dataset I/O for the Rocket Pool MEV theft
//! classifier.

pub mod dataset;
pub mod types;

pub use types::{Column, EnrichedSlot, Header, SlotRecord, TheftVerdict};
