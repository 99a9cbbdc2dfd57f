//! Storage-related types for the protocol and token state.

use alloy_primitives::Address;

/// Storage namespaces for contract state.
///
/// Every contract keeps its state under its own namespace so several
/// deployments can share one storage backend. Use [`StorageKey::scoped`] to
/// build the namespace for a specific contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Digests that have already authorized a mint.
	ConsumedDigests,
	/// Token balances keyed by holder address.
	Balances,
	/// Token-wide totals (total supply).
	Supply,
	/// Owner of an access-controlled contract.
	Owner,
	/// Address a token accepts mint calls from.
	MintingProtocol,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::ConsumedDigests => "consumed_digests",
			StorageKey::Balances => "balances",
			StorageKey::Supply => "supply",
			StorageKey::Owner => "owner",
			StorageKey::MintingProtocol => "minting_protocol",
		}
	}

	/// Namespace for this key owned by the contract at `contract`.
	///
	/// Formatted as `<key>@<lowercase hex address>`, for example
	/// `consumed_digests@0xe7f1725e7734ce288f8367e1bb143e90bb3f0512`.
	pub fn scoped(&self, contract: &Address) -> String {
		format!("{}@0x{:x}", self.as_str(), contract)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scoped_namespaces_are_distinct_per_contract() {
		let contract = Address::repeat_byte(0xab);
		assert_eq!(
			StorageKey::ConsumedDigests.scoped(&contract),
			"consumed_digests@0xabababababababababababababababababababab"
		);
		assert_eq!(
			StorageKey::MintingProtocol.scoped(&Address::ZERO),
			"minting_protocol@0x0000000000000000000000000000000000000000"
		);
		assert_ne!(
			StorageKey::Balances.scoped(&contract),
			StorageKey::Balances.scoped(&Address::repeat_byte(0xcd))
		);
	}
}
