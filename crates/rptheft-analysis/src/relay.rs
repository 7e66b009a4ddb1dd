//! Relay name canonicalization.
//!
//! The three sources spell relays differently (brand names on one side,
//! relay domains on the other). Every known spelling maps to one canonical
//! identifier; unknown names are kept as they are.

use rptheft_data::Column;

use crate::address::FIELD_SEPARATOR;

/// Relay-name columns rewritten to canonical identifiers.
pub const RELAY_COLUMNS: [Column; 5] = [
    Column::MaxBidRelay,
    Column::MevRewardRelay,
    Column::BeaconchaMevRewardRelay,
    Column::MevmonitorMaxBidRelay,
    Column::MevmonitorMevRewardRelay,
];

/// Known relay spellings and their canonical identifier.
pub const RELAY_ALIASES: [(&str, &str); 17] = [
    ("Flashbots", "flashbots-relay"),
    ("bloXroute Max Profit", "bloxroute-max-profit-relay"),
    ("bloXroute Regulated", "bloxroute-regulated-relay"),
    ("Blocknative", "mainnet-relay.securerpc.com"),
    ("Eden Network", "relay.edennetwork.io"),
    ("Ultra Sound", "ultrasound-relay"),
    ("Aestus", "aestus-relay"),
    ("Titan Global", "agnostic-relay"),
    ("Titan Regional", "agnostic-relay"),
    ("bloxroute.max-profit.blxrbdn.com", "bloxroute-max-profit-relay"),
    ("boost-relay.flashbots.net", "flashbots-relay"),
    ("relay.ultrasound.money", "ultrasound-relay"),
    ("bloxroute.regulated.blxrbdn.com", "bloxroute-regulated-relay"),
    ("aestus.live", "aestus-relay"),
    ("mainnet-relay.securerpc.com", "mainnet-relay.securerpc.com"),
    ("relay.edennetwork.io", "relay.edennetwork.io"),
    ("agnostic-relay.net", "agnostic-relay"),
];

/// Canonical identifier of a single relay name.
///
/// Lookup is exact after trimming; unknown names come back trimmed.
pub fn canonical_relay(name: &str) -> &str {
    let name = name.trim();
    RELAY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

/// Canonicalizes every token of a semicolon-delimited relay field.
///
/// Token order and count are preserved.
pub fn canonicalize_relays(field: &str) -> String {
    field
        .split(FIELD_SEPARATOR)
        .map(canonical_relay)
        .collect::<Vec<_>>()
        .join(";")
}
