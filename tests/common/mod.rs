//! Shared test helpers and utilities.
//!
//! Provides factory functions for slot records and on-disk datasets.

#![allow(dead_code)]

use rptheft_data::SlotRecord;
use std::path::{Path, PathBuf};

/// Header of a dataset carrying every indicator column.
pub const FULL_HEADER: &str = "slot,is_rocketpool,in_smoothing_pool,node_address,distributor_address,\
relay_fee_recipient,mevmonitor_fee_recipient,beaconcha_fee_recipient,last_tx_recipient,\
max_bid,max_bid_relay,mev_reward,mev_reward_relay,beaconcha_mev_reward,beaconcha_mev_reward_relay,\
mevmonitor_max_bid,mevmonitor_max_bid_relay,mevmonitor_mev_reward,mevmonitor_mev_reward_relay,\
priority_fees,last_tx_value";

/// A Rocket Pool slot with no MEV data from any source.
///
/// # Example
/// ```ignore
/// let slot = sample_slot(100);
/// assert_eq!(slot.in_smoothing_pool, Some(false));
/// ```
pub fn sample_slot(slot: u64) -> SlotRecord<String> {
    SlotRecord {
        slot,
        is_rocketpool: Some(true),
        in_smoothing_pool: Some(false),
        node_address: Some("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string()),
        proposer_index: Some("123456".to_string()),
        ..Default::default()
    }
}

/// A smoothing-pool slot whose relay paid `recipient`.
pub fn pool_slot(slot: u64, recipient: &str) -> SlotRecord<String> {
    SlotRecord {
        in_smoothing_pool: Some(true),
        relay_fee_recipient: Some(recipient.to_string()),
        mev_reward: Some("50000000000000000".to_string()), // 0.05 ETH
        mev_reward_relay: Some("Flashbots".to_string()),
        ..sample_slot(slot)
    }
}

/// A non-pool slot with a fee distributor whose relay paid `recipient`.
pub fn regular_slot(slot: u64, distributor: &str, recipient: &str) -> SlotRecord<String> {
    SlotRecord {
        distributor_address: Some(distributor.to_string()),
        relay_fee_recipient: Some(recipient.to_string()),
        mev_reward: Some("50000000000000000".to_string()),
        mev_reward_relay: Some("Ultra Sound".to_string()),
        ..sample_slot(slot)
    }
}

/// Writes `content` to `dir/name` and returns the path.
///
/// # Panics
/// Panics if the file cannot be written.
pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("fixture csv should write");
    path
}

/// Reads a CSV written by the pipeline into header and rows of cells.
///
/// Cells are split on commas; fixtures never quote.
///
/// # Panics
/// Panics if the file cannot be read or is empty.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let content = std::fs::read_to_string(path).expect("output csv should read");
    let mut lines = content.lines();
    let split = |line: &str| line.split(',').map(str::to_string).collect::<Vec<_>>();

    let header = split(lines.next().expect("output should have a header"));
    let rows = lines.map(split).collect();
    (header, rows)
}

/// Value of `column` in `row`, looked up through `header`.
///
/// # Panics
/// Panics if the column is absent.
pub fn cell<'a>(header: &[String], row: &'a [String], column: &str) -> &'a str {
    let index = header
        .iter()
        .position(|name| name == column)
        .unwrap_or_else(|| panic!("column {column} should exist"));
    &row[index]
}
