//! Utility functions for EIP-712 encoding and string formatting.

pub mod eip712;
pub mod formatting;

pub use eip712::{
	compute_domain_hash, compute_final_digest, Eip712AbiEncoder, DOMAIN_TYPE, MINT_REQUEST_TYPE,
	PROTOCOL_DOMAIN_NAME, PROTOCOL_DOMAIN_VERSION,
};
pub use formatting::{decode_hex, truncate_id, with_0x_prefix, without_0x_prefix};
