//! Type definitions for slot-level block-building records.

use std::collections::BTreeMap;
use std::fmt;

/// Column holding the `vanilla_block` verdict.
pub const VANILLA_BLOCK: &str = "vanilla_block";
/// Column holding the smoothing-pool theft flag.
pub const SP_HIGH_CONFIDENCE_THEFT: &str = "sp_high-confidence_theft";
/// Column holding the regular (distributor) theft flag.
pub const REG_HIGH_CONFIDENCE_THEFT: &str = "reg_high-confidence_theft";
/// Optional column holding the windowed max-bid average.
pub const SURROUNDING_MAX_BID: &str = "surrounding_max_bid";

/// How a known column's cells are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// The integer slot key.
    Key,
    /// Tri-state boolean (`true` / `false` / missing).
    Flag,
    /// Free text: addresses, relay names, passthrough identifiers.
    Text,
    /// Numeric amount recorded in wei.
    Amount,
}

/// Columns the classifier knows about.
///
/// Anything else found in a dataset header is carried through as a
/// [`Header::Other`] column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Slot,
    IsRocketpool,
    InSmoothingPool,
    NodeAddress,
    ProposerIndex,
    DistributorAddress,
    RelayFeeRecipient,
    MevmonitorFeeRecipient,
    BeaconchaFeeRecipient,
    LastTxRecipient,
    MaxBidRelay,
    MevRewardRelay,
    BeaconchaMevRewardRelay,
    MevmonitorMaxBidRelay,
    MevmonitorMevRewardRelay,
    MaxBid,
    MevReward,
    BeaconchaMevReward,
    MevmonitorMaxBid,
    MevmonitorMevReward,
    PriorityFees,
    LastTxValue,
    EthCollatRatio,
}

impl Column {
    /// Every known column, in no particular order of significance.
    pub const ALL: [Column; 23] = [
        Column::Slot,
        Column::IsRocketpool,
        Column::InSmoothingPool,
        Column::NodeAddress,
        Column::ProposerIndex,
        Column::DistributorAddress,
        Column::RelayFeeRecipient,
        Column::MevmonitorFeeRecipient,
        Column::BeaconchaFeeRecipient,
        Column::LastTxRecipient,
        Column::MaxBidRelay,
        Column::MevRewardRelay,
        Column::BeaconchaMevRewardRelay,
        Column::MevmonitorMaxBidRelay,
        Column::MevmonitorMevRewardRelay,
        Column::MaxBid,
        Column::MevReward,
        Column::BeaconchaMevReward,
        Column::MevmonitorMaxBid,
        Column::MevmonitorMevReward,
        Column::PriorityFees,
        Column::LastTxValue,
        Column::EthCollatRatio,
    ];

    /// Header name as it appears in the CSV files.
    pub const fn name(self) -> &'static str {
        match self {
            Column::Slot => "slot",
            Column::IsRocketpool => "is_rocketpool",
            Column::InSmoothingPool => "in_smoothing_pool",
            Column::NodeAddress => "node_address",
            Column::ProposerIndex => "proposer_index",
            Column::DistributorAddress => "distributor_address",
            Column::RelayFeeRecipient => "relay_fee_recipient",
            Column::MevmonitorFeeRecipient => "mevmonitor_fee_recipient",
            Column::BeaconchaFeeRecipient => "beaconcha_fee_recipient",
            Column::LastTxRecipient => "last_tx_recipient",
            Column::MaxBidRelay => "max_bid_relay",
            Column::MevRewardRelay => "mev_reward_relay",
            Column::BeaconchaMevRewardRelay => "beaconcha_mev_reward_relay",
            Column::MevmonitorMaxBidRelay => "mevmonitor_max_bid_relay",
            Column::MevmonitorMevRewardRelay => "mevmonitor_mev_reward_relay",
            Column::MaxBid => "max_bid",
            Column::MevReward => "mev_reward",
            Column::BeaconchaMevReward => "beaconcha_mev_reward",
            Column::MevmonitorMaxBid => "mevmonitor_max_bid",
            Column::MevmonitorMevReward => "mevmonitor_mev_reward",
            Column::PriorityFees => "priority_fees",
            Column::LastTxValue => "last_tx_value",
            Column::EthCollatRatio => "eth_collat_ratio",
        }
    }

    /// Looks up a known column by its exact header name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|column| column.name() == name)
    }

    pub const fn kind(self) -> ColumnKind {
        match self {
            Column::Slot => ColumnKind::Key,
            Column::IsRocketpool | Column::InSmoothingPool => ColumnKind::Flag,
            Column::MaxBid
            | Column::MevReward
            | Column::BeaconchaMevReward
            | Column::MevmonitorMaxBid
            | Column::MevmonitorMevReward
            | Column::PriorityFees
            | Column::LastTxValue
            | Column::EthCollatRatio => ColumnKind::Amount,
            _ => ColumnKind::Text,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One header cell of a dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Header {
    /// A column the classifier interprets.
    Known(Column),
    /// Any other column, carried verbatim.
    Other(String),
}

impl Header {
    pub fn parse(name: &str) -> Self {
        match Column::from_name(name) {
            Some(column) => Header::Known(column),
            None => Header::Other(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Header::Known(column) => column.name(),
            Header::Other(name) => name,
        }
    }
}

/// One consensus slot joined across the relay, beaconcha.in and mevmonitor sources.
///
/// `A` is the representation of the wei-valued amount fields: raw cell text
/// on ingestion (`SlotRecord<String>`), ETH after conversion
/// (`SlotRecord<f64>`). Every field except `slot` is optional; `None` means
/// the cell was empty or the column is absent from the dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotRecord<A = String> {
    /// Consensus slot number.
    pub slot: u64,
    pub is_rocketpool: Option<bool>,
    pub in_smoothing_pool: Option<bool>,
    /// Node operator address (passthrough).
    pub node_address: Option<String>,
    /// Validator index (passthrough).
    pub proposer_index: Option<String>,
    /// Fee distributor the protocol expects rewards to reach.
    pub distributor_address: Option<String>,
    /// Semicolon-delimited fee recipients reported by the relays.
    pub relay_fee_recipient: Option<String>,
    /// Semicolon-delimited fee recipients reported by mevmonitor.
    pub mevmonitor_fee_recipient: Option<String>,
    /// Semicolon-delimited fee recipients reported by beaconcha.in.
    pub beaconcha_fee_recipient: Option<String>,
    /// Recipient of the last transaction in the block.
    pub last_tx_recipient: Option<String>,
    pub max_bid_relay: Option<String>,
    pub mev_reward_relay: Option<String>,
    pub beaconcha_mev_reward_relay: Option<String>,
    pub mevmonitor_max_bid_relay: Option<String>,
    pub mevmonitor_mev_reward_relay: Option<String>,
    pub max_bid: Option<A>,
    pub mev_reward: Option<A>,
    pub beaconcha_mev_reward: Option<A>,
    pub mevmonitor_max_bid: Option<A>,
    pub mevmonitor_mev_reward: Option<A>,
    pub priority_fees: Option<A>,
    pub last_tx_value: Option<A>,
    pub eth_collat_ratio: Option<A>,
    /// Cells of columns the classifier does not interpret, keyed by header
    /// position so duplicate header names keep their own values.
    pub extra: BTreeMap<usize, String>,
}

impl<A> SlotRecord<A> {
    /// Value of a text column, `None` if missing or if `column` is not text.
    pub fn text(&self, column: Column) -> Option<&str> {
        match column {
            Column::NodeAddress => self.node_address.as_deref(),
            Column::ProposerIndex => self.proposer_index.as_deref(),
            Column::DistributorAddress => self.distributor_address.as_deref(),
            Column::RelayFeeRecipient => self.relay_fee_recipient.as_deref(),
            Column::MevmonitorFeeRecipient => self.mevmonitor_fee_recipient.as_deref(),
            Column::BeaconchaFeeRecipient => self.beaconcha_fee_recipient.as_deref(),
            Column::LastTxRecipient => self.last_tx_recipient.as_deref(),
            Column::MaxBidRelay => self.max_bid_relay.as_deref(),
            Column::MevRewardRelay => self.mev_reward_relay.as_deref(),
            Column::BeaconchaMevRewardRelay => self.beaconcha_mev_reward_relay.as_deref(),
            Column::MevmonitorMaxBidRelay => self.mevmonitor_max_bid_relay.as_deref(),
            Column::MevmonitorMevRewardRelay => self.mevmonitor_mev_reward_relay.as_deref(),
            _ => None,
        }
    }

    /// Mutable slot of a text column, `None` if `column` is not text.
    pub fn text_mut(&mut self, column: Column) -> Option<&mut Option<String>> {
        match column {
            Column::NodeAddress => Some(&mut self.node_address),
            Column::ProposerIndex => Some(&mut self.proposer_index),
            Column::DistributorAddress => Some(&mut self.distributor_address),
            Column::RelayFeeRecipient => Some(&mut self.relay_fee_recipient),
            Column::MevmonitorFeeRecipient => Some(&mut self.mevmonitor_fee_recipient),
            Column::BeaconchaFeeRecipient => Some(&mut self.beaconcha_fee_recipient),
            Column::LastTxRecipient => Some(&mut self.last_tx_recipient),
            Column::MaxBidRelay => Some(&mut self.max_bid_relay),
            Column::MevRewardRelay => Some(&mut self.mev_reward_relay),
            Column::BeaconchaMevRewardRelay => Some(&mut self.beaconcha_mev_reward_relay),
            Column::MevmonitorMaxBidRelay => Some(&mut self.mevmonitor_max_bid_relay),
            Column::MevmonitorMevRewardRelay => Some(&mut self.mevmonitor_mev_reward_relay),
            _ => None,
        }
    }

    /// Value of an amount column, `None` if missing or if `column` is not an amount.
    pub fn amount(&self, column: Column) -> Option<&A> {
        match column {
            Column::MaxBid => self.max_bid.as_ref(),
            Column::MevReward => self.mev_reward.as_ref(),
            Column::BeaconchaMevReward => self.beaconcha_mev_reward.as_ref(),
            Column::MevmonitorMaxBid => self.mevmonitor_max_bid.as_ref(),
            Column::MevmonitorMevReward => self.mevmonitor_mev_reward.as_ref(),
            Column::PriorityFees => self.priority_fees.as_ref(),
            Column::LastTxValue => self.last_tx_value.as_ref(),
            Column::EthCollatRatio => self.eth_collat_ratio.as_ref(),
            _ => None,
        }
    }

    pub fn amount_mut(&mut self, column: Column) -> Option<&mut Option<A>> {
        match column {
            Column::MaxBid => Some(&mut self.max_bid),
            Column::MevReward => Some(&mut self.mev_reward),
            Column::BeaconchaMevReward => Some(&mut self.beaconcha_mev_reward),
            Column::MevmonitorMaxBid => Some(&mut self.mevmonitor_max_bid),
            Column::MevmonitorMevReward => Some(&mut self.mevmonitor_mev_reward),
            Column::PriorityFees => Some(&mut self.priority_fees),
            Column::LastTxValue => Some(&mut self.last_tx_value),
            Column::EthCollatRatio => Some(&mut self.eth_collat_ratio),
            _ => None,
        }
    }

    pub fn flag(&self, column: Column) -> Option<bool> {
        match column {
            Column::IsRocketpool => self.is_rocketpool,
            Column::InSmoothingPool => self.in_smoothing_pool,
            _ => None,
        }
    }

    pub fn flag_mut(&mut self, column: Column) -> Option<&mut Option<bool>> {
        match column {
            Column::IsRocketpool => Some(&mut self.is_rocketpool),
            Column::InSmoothingPool => Some(&mut self.in_smoothing_pool),
            _ => None,
        }
    }

    /// Whether the record carries a value for `column`.
    pub fn is_present(&self, column: Column) -> bool {
        match column.kind() {
            ColumnKind::Key => true,
            ColumnKind::Flag => self.flag(column).is_some(),
            ColumnKind::Text => self.text(column).is_some(),
            ColumnKind::Amount => self.amount(column).is_some(),
        }
    }

    /// Re-types the amount fields, keeping everything else.
    ///
    /// `f` sees each present amount with its column; returning `None` marks
    /// the converted value as missing.
    pub fn map_amounts<B>(self, mut f: impl FnMut(Column, A) -> Option<B>) -> SlotRecord<B> {
        let mut convert = |column: Column, value: Option<A>| value.and_then(|v| f(column, v));

        SlotRecord {
            max_bid: convert(Column::MaxBid, self.max_bid),
            mev_reward: convert(Column::MevReward, self.mev_reward),
            beaconcha_mev_reward: convert(Column::BeaconchaMevReward, self.beaconcha_mev_reward),
            mevmonitor_max_bid: convert(Column::MevmonitorMaxBid, self.mevmonitor_max_bid),
            mevmonitor_mev_reward: convert(Column::MevmonitorMevReward, self.mevmonitor_mev_reward),
            priority_fees: convert(Column::PriorityFees, self.priority_fees),
            last_tx_value: convert(Column::LastTxValue, self.last_tx_value),
            eth_collat_ratio: convert(Column::EthCollatRatio, self.eth_collat_ratio),
            slot: self.slot,
            is_rocketpool: self.is_rocketpool,
            in_smoothing_pool: self.in_smoothing_pool,
            node_address: self.node_address,
            proposer_index: self.proposer_index,
            distributor_address: self.distributor_address,
            relay_fee_recipient: self.relay_fee_recipient,
            mevmonitor_fee_recipient: self.mevmonitor_fee_recipient,
            beaconcha_fee_recipient: self.beaconcha_fee_recipient,
            last_tx_recipient: self.last_tx_recipient,
            max_bid_relay: self.max_bid_relay,
            mev_reward_relay: self.mev_reward_relay,
            beaconcha_mev_reward_relay: self.beaconcha_mev_reward_relay,
            mevmonitor_max_bid_relay: self.mevmonitor_max_bid_relay,
            mevmonitor_mev_reward_relay: self.mevmonitor_mev_reward_relay,
            extra: self.extra,
        }
    }
}

/// Theft verdict for one slot.
///
/// The smoothing-pool and regular checks run on disjoint branches of
/// `in_smoothing_pool`, so a slot carries at most one of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TheftVerdict {
    /// No high-confidence theft detected, or not enough evidence to judge.
    #[default]
    None,
    /// Smoothing-pool member whose MEV reward never reached the pool contract.
    SmoothingPool,
    /// Non-member whose MEV reward never reached its fee distributor.
    Regular,
}

impl TheftVerdict {
    pub fn sp_high_confidence_theft(self) -> bool {
        matches!(self, TheftVerdict::SmoothingPool)
    }

    pub fn reg_high_confidence_theft(self) -> bool {
        matches!(self, TheftVerdict::Regular)
    }
}

impl fmt::Display for TheftVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TheftVerdict::None => "none",
            TheftVerdict::SmoothingPool => "smoothing_pool",
            TheftVerdict::Regular => "regular",
        })
    }
}

/// A slot after conversion, canonicalization and classification.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedSlot {
    /// Source record with amounts in ETH and normalized text fields.
    pub record: SlotRecord<f64>,
    pub vanilla_block: bool,
    pub theft: TheftVerdict,
    /// Average max bid over the neighbouring slots, when requested.
    pub surrounding_max_bid: Option<f64>,
}

/// One tabular dataset (one source file).
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset<R> {
    /// File name the dataset was read from.
    pub name: String,
    /// Header cells in their original order.
    pub headers: Vec<Header>,
    pub rows: Vec<R>,
}

/// Dataset as read from disk, amounts still in wei text.
pub type RawDataset = Dataset<SlotRecord<String>>;

/// Dataset ready to be written back out.
pub type EnrichedDataset = Dataset<EnrichedSlot>;

impl<R> Dataset<R> {
    pub fn has_column(&self, column: Column) -> bool {
        self.headers.contains(&Header::Known(column))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How boolean flag columns are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlagStyle {
    /// `true` / `false`.
    #[default]
    Boolean,
    /// `TRUE` / empty cell, as read by the older spreadsheet-based reports.
    Legacy,
}

impl FlagStyle {
    pub fn render(self, value: bool) -> &'static str {
        match (self, value) {
            (FlagStyle::Boolean, true) => "true",
            (FlagStyle::Boolean, false) => "false",
            (FlagStyle::Legacy, true) => "TRUE",
            (FlagStyle::Legacy, false) => "",
        }
    }
}

/// Output layout of an enriched dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub flag_style: FlagStyle,
    /// Append the `surrounding_max_bid` column.
    pub surrounding_max_bid: bool,
}
