//! EIP-712 domain of a protocol instance.

use mint_types::utils::{compute_domain_hash, PROTOCOL_DOMAIN_NAME, PROTOCOL_DOMAIN_VERSION};
use mint_types::{Address, B256};

/// Domain binding authorizations to one protocol on one chain.
///
/// The separator is computed when the domain is created and never again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedDataDomain {
	name: &'static str,
	version: &'static str,
	chain_id: u64,
	verifying_contract: Address,
	separator: B256,
}

impl TypedDataDomain {
	/// Domain of the protocol deployed at `verifying_contract`.
	pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
		Self {
			name: PROTOCOL_DOMAIN_NAME,
			version: PROTOCOL_DOMAIN_VERSION,
			chain_id,
			verifying_contract,
			separator: compute_domain_hash(
				PROTOCOL_DOMAIN_NAME,
				PROTOCOL_DOMAIN_VERSION,
				chain_id,
				&verifying_contract,
			),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn version(&self) -> &'static str {
		self.version
	}

	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	pub fn verifying_contract(&self) -> Address {
		self.verifying_contract
	}

	/// The domain separator.
	pub fn separator(&self) -> B256 {
		self.separator
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	const PROTOCOL: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");

	#[test]
	fn test_separator_is_deterministic() {
		assert_eq!(
			TypedDataDomain::new(31337, PROTOCOL).separator(),
			TypedDataDomain::new(31337, PROTOCOL).separator()
		);
	}

	#[test]
	fn test_separator_binds_chain_and_contract() {
		let base = TypedDataDomain::new(31337, PROTOCOL);
		assert_ne!(base.separator(), TypedDataDomain::new(1, PROTOCOL).separator());
		assert_ne!(
			base.separator(),
			TypedDataDomain::new(31337, Address::repeat_byte(0x01)).separator()
		);
	}

	#[test]
	fn test_separator_matches_sol_types_domain() {
		let domain = TypedDataDomain::new(31337, PROTOCOL);
		let reference = alloy_sol_types::eip712_domain! {
			name: "Protocol",
			version: "v1",
			chain_id: 31337,
			verifying_contract: PROTOCOL,
		};

		assert_eq!(domain.separator(), reference.hash_struct());
		assert_eq!((domain.name(), domain.version()), ("Protocol", "v1"));
		assert_eq!(domain.verifying_contract(), PROTOCOL);
	}
}
