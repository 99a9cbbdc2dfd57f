//! Local private-key account.
//!
//! Holds the signing key in process memory. Suitable for development and for
//! an issuer running next to its key material.

use crate::{AccountError, AccountInterface};
use alloy_primitives::{Address, Bytes, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use mint_types::{ConfigSchema, Field, FieldType, Schema, SecretString, ValidationError};

/// Account backed by a secp256k1 private key held in memory.
pub struct LocalAccount {
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Creates an account from a hex private key, with or without `0x` prefix.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		let signer = private_key.with_exposed(|key| {
			key.parse::<PrivateKeySigner>()
				.map_err(|_| AccountError::InvalidKey("Invalid private key format".to_string()))
		})?;
		Ok(Self { signer })
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalAccountSchema)
	}

	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_hash(&self, hash: &B256) -> Result<Bytes, AccountError> {
		let signature = self
			.signer
			.sign_hash_sync(hash)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
		Ok(Bytes::from(signature.as_bytes().to_vec()))
	}
}

/// Configuration schema for LocalAccount.
pub struct LocalAccountSchema;

impl ConfigSchema for LocalAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![Field::new("private_key", FieldType::PrivateKey)], vec![]).validate(config)
	}
}

/// Factory function to create a local account from configuration.
///
/// Configuration parameters:
/// - `private_key`: 32-byte hex private key (usually `${SIGNER_PRIVATE_KEY}`)
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalAccountSchema
		.validate(config)
		.map_err(|e| AccountError::Configuration(e.to_string()))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| AccountError::Configuration("private_key is required".to_string()))?;

	let account = LocalAccount::new(&private_key)?;
	tracing::info!(address = %account.signer.address(), "Loaded local signing account");
	Ok(Box::new(account))
}

/// Registry for the local account implementation.
pub struct Registry;

impl mint_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl crate::AccountRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, keccak256};

	// Second default Hardhat account.
	const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

	fn config(key: &str) -> toml::Value {
		toml::from_str(&format!("private_key = \"{}\"", key)).unwrap()
	}

	#[tokio::test]
	async fn test_address_from_known_key() {
		let account = create_account(&config(KEY)).unwrap();
		assert_eq!(
			account.address().await.unwrap(),
			address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
		);
	}

	#[tokio::test]
	async fn test_signature_layout() {
		let account = LocalAccount::new(&SecretString::from(KEY)).unwrap();
		let signature = account.sign_hash(&keccak256(b"digest")).await.unwrap();

		assert_eq!(signature.len(), 65);
		assert!(signature[64] == 27 || signature[64] == 28);
	}

	#[test]
	fn test_rejects_malformed_key() {
		assert!(matches!(
			create_account(&config("0x1234")),
			Err(AccountError::Configuration(_))
		));
		assert!(matches!(
			create_account(&toml::Value::Table(Default::default())),
			Err(AccountError::Configuration(_))
		));
	}
}
