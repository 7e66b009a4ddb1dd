//! Record enrichment pipeline.
//!
//! Per row: wei → ETH conversion, relay canonicalization, address
//! normalization, vanilla-block classification and theft detection. Rows are
//! independent of each other; only the optional surrounding bid average
//! looks at neighbouring rows.

use rptheft_data::types::{EnrichedDataset, RawDataset};
use rptheft_data::{EnrichedSlot, SlotRecord, TheftVerdict};
use serde::Serialize;

use crate::address::{normalize_address, ADDRESS_COLUMNS};
use crate::relay::{canonicalize_relays, RELAY_COLUMNS};
use crate::surrounding::{surrounding_max_bids, BidPair};
use crate::theft::detect_theft;
use crate::units::{wei_to_eth, WEI_COLUMNS};
use crate::vanilla::is_vanilla_block;

/// Optional enrichment steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Compute `surrounding_max_bid` for every row.
    pub surrounding_mev: bool,
}

/// Converts the wei columns of a record to ETH.
///
/// Unparseable amounts become missing.
pub fn convert_amounts(record: SlotRecord<String>) -> SlotRecord<f64> {
    record.map_amounts(|column, raw| {
        debug_assert!(WEI_COLUMNS.contains(&column));
        wei_to_eth(&raw)
    })
}

/// Canonicalizes relay names and lowercases address columns.
pub fn normalize_text(mut record: SlotRecord<f64>) -> SlotRecord<f64> {
    for column in RELAY_COLUMNS {
        if let Some(field) = record.text_mut(column) {
            *field = field.take().map(|relays| canonicalize_relays(&relays));
        }
    }
    for column in ADDRESS_COLUMNS {
        if let Some(field) = record.text_mut(column) {
            *field = field.take().map(|address| normalize_address(&address));
        }
    }
    record
}

/// Enriches a single slot.
pub fn enrich_record(record: SlotRecord<String>) -> EnrichedSlot {
    let record = normalize_text(convert_amounts(record));
    let vanilla_block = is_vanilla_block(&record);
    let theft = detect_theft(&record);

    EnrichedSlot {
        record,
        vanilla_block,
        theft,
        surrounding_max_bid: None,
    }
}

/// Enriches every row of a dataset, keeping row order and headers.
#[tracing::instrument(skip_all, fields(dataset = %dataset.name, rows = dataset.len()))]
pub fn enrich_dataset(dataset: RawDataset, options: EnrichOptions) -> EnrichedDataset {
    let mut rows: Vec<EnrichedSlot> = dataset.rows.into_iter().map(enrich_record).collect();

    if options.surrounding_mev {
        let bids: Vec<BidPair> = rows
            .iter()
            .map(|row| (row.record.max_bid, row.record.mevmonitor_max_bid))
            .collect();
        for (row, average) in rows.iter_mut().zip(surrounding_max_bids(&bids)) {
            row.surrounding_max_bid = Some(average);
        }
    }

    EnrichedDataset {
        name: dataset.name,
        headers: dataset.headers,
        rows,
    }
}

/// Classification counts of one enriched dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub dataset: String,
    pub rows: usize,
    pub vanilla_blocks: usize,
    pub sp_thefts: usize,
    pub reg_thefts: usize,
}

impl DatasetSummary {
    pub fn from_dataset(dataset: &EnrichedDataset) -> Self {
        let mut summary = Self {
            dataset: dataset.name.clone(),
            rows: dataset.len(),
            ..Default::default()
        };

        for row in &dataset.rows {
            summary.vanilla_blocks += usize::from(row.vanilla_block);
            match row.theft {
                TheftVerdict::SmoothingPool => summary.sp_thefts += 1,
                TheftVerdict::Regular => summary.reg_thefts += 1,
                TheftVerdict::None => {}
            }
        }

        summary
    }
}
