//! Vanilla block classification.
//!
//! A vanilla block is one for which none of the sources recorded an MEV
//! reward, a reward relay, or a relay fee recipient.

use rptheft_data::{Column, SlotRecord};

/// Columns whose presence signals MEV activity for a slot.
pub const INDICATOR_COLUMNS: [Column; 8] = [
    Column::MevReward,
    Column::MevRewardRelay,
    Column::RelayFeeRecipient,
    Column::BeaconchaMevReward,
    Column::BeaconchaMevRewardRelay,
    Column::BeaconchaFeeRecipient,
    Column::MevmonitorMevReward,
    Column::MevmonitorMevRewardRelay,
];

/// True iff every indicator column is missing.
///
/// Presence is what counts, not value: a zero reward still disqualifies the
/// slot. A column the dataset does not have is always missing, so datasets
/// lacking a source can only overcount vanilla blocks, never undercount them.
pub fn is_vanilla_block<A>(record: &SlotRecord<A>) -> bool {
    INDICATOR_COLUMNS
        .iter()
        .all(|column| !record.is_present(*column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_indicators_missing_is_vanilla() {
        let record = SlotRecord::<f64> {
            slot: 100,
            in_smoothing_pool: Some(false),
            max_bid: Some(0.2),
            max_bid_relay: Some("flashbots-relay".to_string()),
            ..Default::default()
        };
        assert!(is_vanilla_block(&record));
    }

    #[test]
    fn zero_reward_is_not_vanilla() {
        let record = SlotRecord::<f64> {
            mev_reward: Some(0.0),
            ..Default::default()
        };
        assert!(!is_vanilla_block(&record));
    }

    #[test]
    fn any_single_indicator_disqualifies() {
        for column in INDICATOR_COLUMNS {
            let mut record = SlotRecord::<f64>::default();
            if let Some(amount) = record.amount_mut(column) {
                *amount = Some(0.0);
            }
            if let Some(text) = record.text_mut(column) {
                *text = Some("x".to_string());
            }
            assert!(!is_vanilla_block(&record), "{column} should disqualify");
        }
    }
}
