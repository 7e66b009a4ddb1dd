//! Address normalization.
//!
//! Lowercases account identifiers so values from different sources compare
//! equal. No format validation is done; anything that is not an address is
//! lowercased and passed through.

use rptheft_data::Column;

/// Address columns rewritten to lowercase in the enriched output.
pub const ADDRESS_COLUMNS: [Column; 5] = [
    Column::RelayFeeRecipient,
    Column::MevmonitorFeeRecipient,
    Column::BeaconchaFeeRecipient,
    Column::LastTxRecipient,
    Column::DistributorAddress,
];

/// Separator of multi-valued address and relay fields.
pub const FIELD_SEPARATOR: char = ';';

pub fn normalize_address(address: &str) -> String {
    address.to_lowercase()
}

/// Splits a semicolon-delimited address field into normalized addresses.
///
/// A missing field yields an empty list. Tokens are not trimmed.
pub fn extract_normalized_addresses(field: Option<&str>) -> Vec<String> {
    field
        .map(|value| value.split(FIELD_SEPARATOR).map(normalize_address).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_checksummed_address() {
        assert_eq!(
            normalize_address("0xD4E96eF8eee8678dBFf4d535E033Ed1a4F7605b7"),
            "0xd4e96ef8eee8678dbff4d535e033ed1a4f7605b7"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_address("0xAbC;Not An Address");
        assert_eq!(normalize_address(&once), once);
    }

    #[test]
    fn splits_multi_valued_field() {
        assert_eq!(
            extract_normalized_addresses(Some("0xAAA;0xBbB")),
            vec!["0xaaa".to_string(), "0xbbb".to_string()]
        );
    }

    #[test]
    fn missing_field_is_empty() {
        assert!(extract_normalized_addresses(None).is_empty());
    }

    #[test]
    fn malformed_tokens_pass_through() {
        assert_eq!(
            extract_normalized_addresses(Some("N/A; 0xAA")),
            vec!["n/a".to_string(), " 0xaa".to_string()]
        );
    }
}
