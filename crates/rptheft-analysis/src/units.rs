//! Wei to ETH conversion.

use rptheft_data::Column;

/// Columns recorded in wei and converted to ETH.
pub const WEI_COLUMNS: [Column; 8] = [
    Column::LastTxValue,
    Column::PriorityFees,
    Column::EthCollatRatio,
    Column::MaxBid,
    Column::MevReward,
    Column::BeaconchaMevReward,
    Column::MevmonitorMaxBid,
    Column::MevmonitorMevReward,
];

/// Decimal places kept after conversion.
pub const ETH_DECIMALS: usize = 8;

const WEI_PER_ETH: f64 = 1e18;

/// Rounds to `decimals` places.
///
/// Rounding is done on the exact decimal expansion of `value`, so a value
/// stored just below a half (25 gwei is `2.4999999999999998e-8` ETH) rounds
/// down. Exact ties go to even.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

/// Converts a wei cell to ETH rounded to 8 decimals.
///
/// Accepts integers, decimals and scientific notation. Returns `None` for
/// anything that does not parse to a finite number.
pub fn wei_to_eth(raw: &str) -> Option<f64> {
    let wei = raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())?;
    Some(round_to(wei / WEI_PER_ETH, ETH_DECIMALS))
}
