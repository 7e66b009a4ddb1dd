//! High-confidence MEV theft detection.
//!
//! For every slot the expected reward recipient is compared with all
//! recipients observed by the data sources:
//! - smoothing-pool members must pay the Rocket Pool smoothing pool contract;
//! - everyone else must pay their node's fee distributor.
//!
//! Matching is substring containment on lowercase addresses so compound
//! recipient cells still match. The flip side is that an unrelated address
//! containing the expected one would also match. This is a heuristic, not a
//! proof of theft.

use std::collections::BTreeSet;

use rptheft_data::{Column, SlotRecord, TheftVerdict};
use tracing::warn;

use crate::address::{extract_normalized_addresses, normalize_address};

/// Rocket Pool smoothing pool contract on mainnet.
pub const SMOOTHING_POOL_ADDRESS: &str = "0xd4e96ef8eee8678dbff4d535e033ed1a4f7605b7";

/// Columns holding observed MEV reward recipients.
pub const RECIPIENT_COLUMNS: [Column; 4] = [
    Column::RelayFeeRecipient,
    Column::MevmonitorFeeRecipient,
    Column::BeaconchaFeeRecipient,
    Column::LastTxRecipient,
];

/// Union of normalized addresses across all recipient columns.
pub fn recipient_set<A>(record: &SlotRecord<A>) -> BTreeSet<String> {
    RECIPIENT_COLUMNS
        .iter()
        .flat_map(|column| extract_normalized_addresses(record.text(*column)))
        .collect()
}

fn paid_to(recipients: &BTreeSet<String>, expected: &str) -> bool {
    recipients
        .iter()
        .any(|recipient| recipient.contains(expected))
}

/// Judges one slot without side effects.
///
/// - `in_smoothing_pool == true`: theft unless the pool address appears in
///   some recipient. An empty recipient set counts as theft.
/// - otherwise: theft unless the distributor appears in some recipient. With
///   no distributor on record there is no evidence either way.
pub fn classify_theft<A>(record: &SlotRecord<A>) -> TheftVerdict {
    let recipients = recipient_set(record);

    if record.in_smoothing_pool == Some(true) {
        if !paid_to(&recipients, SMOOTHING_POOL_ADDRESS) {
            return TheftVerdict::SmoothingPool;
        }
    } else if let Some(distributor) = record.distributor_address.as_deref() {
        let distributor = normalize_address(distributor);
        if !paid_to(&recipients, &distributor) {
            return TheftVerdict::Regular;
        }
    }

    TheftVerdict::None
}

/// Judges one slot and emits a `warn` event for every positive verdict.
pub fn detect_theft<A>(record: &SlotRecord<A>) -> TheftVerdict {
    let verdict = classify_theft(record);
    if verdict != TheftVerdict::None {
        warn!(slot = record.slot, theft = %verdict, "high-confidence theft detected");
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_member(recipient: Option<&str>) -> SlotRecord<f64> {
        SlotRecord {
            slot: 1,
            in_smoothing_pool: Some(true),
            relay_fee_recipient: recipient.map(str::to_string),
            ..Default::default()
        }
    }

    fn regular(distributor: Option<&str>, recipient: &str) -> SlotRecord<f64> {
        SlotRecord {
            slot: 2,
            in_smoothing_pool: Some(false),
            distributor_address: distributor.map(str::to_string),
            relay_fee_recipient: Some(recipient.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn recipient_set_unions_all_sources() {
        let record = SlotRecord::<f64> {
            relay_fee_recipient: Some("0xAAA;0xbbb".to_string()),
            mevmonitor_fee_recipient: Some("0xaaa".to_string()),
            last_tx_recipient: Some("0xCCC".to_string()),
            ..Default::default()
        };

        let set = recipient_set(&record);
        let expected: BTreeSet<String> = ["0xaaa", "0xbbb", "0xccc"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn pool_member_paying_elsewhere_is_flagged() {
        let record = pool_member(Some("0xabc;0xdef"));
        assert_eq!(detect_theft(&record), TheftVerdict::SmoothingPool);
    }

    #[test]
    fn pool_member_paying_pool_is_clean() {
        let record = pool_member(Some("0xabc;0xD4E96EF8EEE8678DBFF4D535E033ED1A4F7605B7"));
        assert_eq!(detect_theft(&record), TheftVerdict::None);
    }

    #[test]
    fn pool_member_without_recipients_is_flagged() {
        assert_eq!(detect_theft(&pool_member(None)), TheftVerdict::SmoothingPool);
    }

    #[test]
    fn pool_match_is_substring_based() {
        let compound = format!("fee to {SMOOTHING_POOL_ADDRESS} via relay");
        assert_eq!(detect_theft(&pool_member(Some(&compound))), TheftVerdict::None);
    }

    #[test]
    fn regular_distributor_missing_from_recipients_is_flagged() {
        let record = regular(Some("0x111"), "0x222");
        assert_eq!(detect_theft(&record), TheftVerdict::Regular);
    }

    #[test]
    fn regular_distributor_as_substring_is_clean() {
        let record = regular(Some("0x111"), "0x111 and fee");
        assert_eq!(detect_theft(&record), TheftVerdict::None);
    }

    #[test]
    fn regular_distributor_compared_case_insensitively() {
        let record = regular(Some("0xABCDEF"), "0xabcdef");
        assert_eq!(detect_theft(&record), TheftVerdict::None);
    }

    #[test]
    fn missing_distributor_abstains() {
        let record = regular(None, "0x222");
        assert_eq!(detect_theft(&record), TheftVerdict::None);
    }

    #[test]
    fn unknown_pool_membership_takes_regular_branch() {
        let mut record = regular(Some("0x111"), "0x222");
        record.in_smoothing_pool = None;
        assert_eq!(detect_theft(&record), TheftVerdict::Regular);
    }

    #[test]
    fn pool_branch_ignores_distributor() {
        let mut record = pool_member(Some(SMOOTHING_POOL_ADDRESS));
        record.distributor_address = Some("0x999".to_string());
        assert_eq!(detect_theft(&record), TheftVerdict::None);
    }
}
