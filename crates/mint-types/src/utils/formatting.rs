//! String formatting utilities.
//!
//! Provides helpers for log-friendly display of digests and addresses and
//! for normalizing hex input received over the API.

/// Truncates a hex string for display purposes.
///
/// Shows only the first 10 characters (`0x` plus four bytes) followed by
/// ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 10 {
		id.to_string()
	} else {
		format!("{}..", &id[..10])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Decodes a hex string with or without a "0x" prefix.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, hex::FromHexError> {
	hex::decode(without_0x_prefix(hex_str))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("0x1234"), "0x1234");
		assert_eq!(
			truncate_id("0xdeadbeefcafebabe0000000000000000"),
			"0xdeadbeef.."
		);
	}

	#[test]
	fn test_prefix_helpers() {
		assert_eq!(with_0x_prefix("abcd"), "0xabcd");
		assert_eq!(with_0x_prefix("0Xabcd"), "0Xabcd");
		assert_eq!(without_0x_prefix("0xabcd"), "abcd");
		assert_eq!(without_0x_prefix("abcd"), "abcd");
	}

	#[test]
	fn test_decode_hex() {
		assert_eq!(decode_hex("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
		assert_eq!(decode_hex("0a0b").unwrap(), vec![0x0a, 0x0b]);
		assert!(decode_hex("0xzz").is_err());
	}
}
