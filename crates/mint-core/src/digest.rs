//! Typed-data digest of a mint authorization.

use crate::domain::TypedDataDomain;
use alloy_primitives::keccak256;
use mint_types::utils::{compute_final_digest, Eip712AbiEncoder, MINT_REQUEST_TYPE};
use mint_types::{Address, B256, U256};

/// Authorization to mint `amount` tokens to `minter`.
///
/// Only its digest is ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintRequest {
	pub minter: Address,
	pub amount: U256,
}

impl MintRequest {
	pub fn new(minter: Address, amount: U256) -> Self {
		Self { minter, amount }
	}

	/// `keccak256(typeHash || minter || amount)`.
	pub fn struct_hash(&self) -> B256 {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&keccak256(MINT_REQUEST_TYPE.as_bytes()));
		enc.push_address(&self.minter);
		enc.push_u256(self.amount);
		keccak256(enc.finish())
	}

	/// Digest the authorized signer signs: `keccak256(0x1901 || separator || structHash)`.
	pub fn signing_digest(&self, domain: &TypedDataDomain) -> B256 {
		compute_final_digest(&domain.separator(), &self.struct_hash())
	}
}
