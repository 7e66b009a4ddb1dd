//! Slot-level max bid averaging.
//!
//! Gives each slot the average MEV bid offered around it, for context when a
//! slot itself has no bid on record.

use crate::units::{round_to, ETH_DECIMALS};

/// Rows taken on each side of the current row.
pub const WINDOW_RADIUS: usize = 2;

/// `(max_bid, mevmonitor_max_bid)` of one slot, in ETH.
pub type BidPair = (Option<f64>, Option<f64>);

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Windowed max bid average for every row.
///
/// For row `i` the window is `i - 2 ..= i + 2`, clipped to the dataset. Each
/// source is averaged over its present values, then the available source
/// averages are averaged. Rows whose window has no bid at all get `0.0`.
pub fn surrounding_max_bids(bids: &[BidPair]) -> Vec<f64> {
    (0..bids.len())
        .map(|index| {
            let start = index.saturating_sub(WINDOW_RADIUS);
            let end = (index + WINDOW_RADIUS).min(bids.len() - 1);
            let window = &bids[start..=end];

            let relay = mean(window.iter().filter_map(|(bid, _)| *bid));
            let monitor = mean(window.iter().filter_map(|(_, bid)| *bid));

            mean([relay, monitor].into_iter().flatten())
                .map(|value| round_to(value, ETH_DECIMALS))
                .unwrap_or(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dataset() {
        assert!(surrounding_max_bids(&[]).is_empty());
    }

    #[test]
    fn averages_each_source_then_sources() {
        let bids = vec![
            (Some(1.0), None),
            (Some(3.0), Some(4.0)),
            (None, None),
        ];
        let out = surrounding_max_bids(&bids);
        // Every window covers all three rows: relay mean 2.0, monitor mean 4.0.
        assert_eq!(out, vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn window_is_clipped_to_two_rows_each_side() {
        let bids: Vec<BidPair> = (0..6).map(|i| (Some(i as f64), None)).collect();
        let out = surrounding_max_bids(&bids);
        // Row 0: rows 0..=2 -> 1.0; row 3: rows 1..=5 -> 3.0; row 5: rows 3..=5 -> 4.0.
        assert_eq!(out[0], 1.0);
        assert_eq!(out[3], 3.0);
        assert_eq!(out[5], 4.0);
    }

    #[test]
    fn no_bids_in_window_is_zero() {
        let bids: Vec<BidPair> = vec![(None, None); 3];
        assert_eq!(surrounding_max_bids(&bids), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn result_is_rounded() {
        let bids = vec![(Some(0.1), None), (Some(0.2), None), (Some(0.2), None)];
        // (0.1 + 0.2 + 0.2) / 3 = 0.1666...
        assert_eq!(surrounding_max_bids(&bids)[0], 0.16666667);
    }
}
