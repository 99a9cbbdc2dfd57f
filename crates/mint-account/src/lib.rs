//! Account management for off-chain authorization issuers.
//!
//! An account owns a secp256k1 key and signs 32-byte digests. The protocol
//! never holds keys; only the party issuing mint authorizations does. This
//! crate defines the interface such a party implements and a service wrapper
//! around the configured implementation.

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use mint_types::{ConfigSchema, ImplementationRegistry};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when the account configuration is rejected.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Interface implemented by every account backend.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Retrieves the address associated with this account.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a 32-byte digest without any message prefix.
	///
	/// Returns the 65-byte `r || s || v` encoding with `v` in `{27, 28}`,
	/// which is what EIP-712 tooling produces for typed-data signatures.
	async fn sign_hash(&self, hash: &B256) -> Result<Bytes, AccountError>;
}

/// Type alias for account factory functions.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service that manages account operations.
pub struct AccountService {
	/// The underlying account implementation.
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	/// Creates a new AccountService with the specified implementation.
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the address associated with the managed account.
	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs a digest using the managed account.
	pub async fn sign_hash(&self, hash: &B256) -> Result<Bytes, AccountError> {
		self.implementation.sign_hash(hash).await
	}
}
