//! Signer recovery for 65-byte ECDSA signatures.

use alloy_primitives::keccak256;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use mint_types::{Address, B256};
use thiserror::Error;

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Reasons a signature does not yield a signer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecoveryError {
	#[error("invalid signature length {0}")]
	InvalidLength(usize),
	#[error("invalid recovery byte {0}")]
	InvalidRecoveryId(u8),
	#[error("invalid signature scalars")]
	InvalidScalars,
	/// `s` lies in the upper half of the curve order.
	#[error("malleable signature")]
	HighS,
	#[error("public key recovery failed")]
	RecoveryFailed,
	#[error("recovered {recovered}, expected {expected}")]
	WrongSigner { recovered: Address, expected: Address },
}

/// Recovers the address that produced `signature` over `digest`.
///
/// `signature` is `r || s || v` with `v` in `{27, 28}` or `{0, 1}`.
pub fn recover_signer(digest: &B256, signature: &[u8]) -> Result<Address, RecoveryError> {
	if signature.len() != SIGNATURE_LENGTH {
		return Err(RecoveryError::InvalidLength(signature.len()));
	}

	let v = signature[64];
	let parity = match v {
		27 | 28 => v - 27,
		0 | 1 => v,
		other => return Err(RecoveryError::InvalidRecoveryId(other)),
	};
	let recovery_id = RecoveryId::from_byte(parity).ok_or(RecoveryError::InvalidRecoveryId(v))?;

	let sig = Signature::from_slice(&signature[..64]).map_err(|_| RecoveryError::InvalidScalars)?;
	if sig.normalize_s().is_some() {
		return Err(RecoveryError::HighS);
	}

	let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
		.map_err(|_| RecoveryError::RecoveryFailed)?;
	let point = key.to_encoded_point(false);
	let hash = keccak256(&point.as_bytes()[1..]);
	Ok(Address::from_slice(&hash[12..]))
}

/// Checks signatures against the one address allowed to authorize mints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureVerifier {
	signer: Address,
}

impl SignatureVerifier {
	pub fn new(signer: Address) -> Self {
		Self { signer }
	}

	/// The authorized signer.
	pub fn signer(&self) -> Address {
		self.signer
	}

	/// Succeeds only if `signature` over `digest` was made by the authorized signer.
	pub fn verify(&self, digest: &B256, signature: &[u8]) -> Result<(), RecoveryError> {
		let recovered = recover_signer(digest, signature)?;
		if recovered != self.signer {
			return Err(RecoveryError::WrongSigner {
				recovered,
				expected: self.signer,
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, U256};
	use alloy_signer::SignerSync;
	use alloy_signer_local::PrivateKeySigner;

	const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
	const SIGNER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

	/// secp256k1 group order.
	fn order() -> U256 {
		"0xfffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"
			.parse()
			.unwrap()
	}

	fn sign(digest: &B256) -> Vec<u8> {
		let signer: PrivateKeySigner = KEY.parse().unwrap();
		signer.sign_hash_sync(digest).unwrap().as_bytes().to_vec()
	}

	#[test]
	fn test_recovers_signer() {
		let digest = keccak256(b"authorization");
		let signature = sign(&digest);

		assert!(signature[64] == 27 || signature[64] == 28);
		assert_eq!(recover_signer(&digest, &signature).unwrap(), SIGNER);
	}

	#[test]
	fn test_accepts_raw_parity_byte() {
		let digest = keccak256(b"authorization");
		let mut signature = sign(&digest);
		signature[64] -= 27;

		assert_eq!(recover_signer(&digest, &signature).unwrap(), SIGNER);
	}

	#[test]
	fn test_rejects_malformed_input() {
		let digest = keccak256(b"authorization");
		let signature = sign(&digest);

		assert_eq!(
			recover_signer(&digest, &signature[..64]),
			Err(RecoveryError::InvalidLength(64))
		);
		assert_eq!(recover_signer(&digest, &[]), Err(RecoveryError::InvalidLength(0)));

		let mut bad_v = signature.clone();
		bad_v[64] = 29;
		assert_eq!(
			recover_signer(&digest, &bad_v),
			Err(RecoveryError::InvalidRecoveryId(29))
		);

		let mut zero = [0u8; 65];
		zero[64] = 27;
		assert_eq!(
			recover_signer(&digest, &zero),
			Err(RecoveryError::InvalidScalars)
		);
	}

	#[test]
	fn test_rejects_high_s_twin() {
		let digest = keccak256(b"authorization");
		let signature = sign(&digest);

		// (r, n - s, v ^ 1) recovers the same key but is not canonical
		let s = U256::from_be_slice(&signature[32..64]);
		let mut twin = signature.clone();
		twin[32..64].copy_from_slice(&(order() - s).to_be_bytes::<32>());
		twin[64] = if signature[64] == 27 { 28 } else { 27 };

		assert_eq!(recover_signer(&digest, &twin), Err(RecoveryError::HighS));
	}

	#[test]
	fn test_verifier_rejects_other_signers_and_digests() {
		let digest = keccak256(b"authorization");
		let signature = sign(&digest);

		assert!(SignatureVerifier::new(SIGNER).verify(&digest, &signature).is_ok());
		assert!(matches!(
			SignatureVerifier::new(Address::repeat_byte(0x01)).verify(&digest, &signature),
			Err(RecoveryError::WrongSigner { recovered, .. }) if recovered == SIGNER
		));
		assert!(SignatureVerifier::new(SIGNER)
			.verify(&keccak256(b"other"), &signature)
			.is_err());
	}
}
