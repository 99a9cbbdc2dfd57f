//! Configuration module for the signature-mint service.
//!
//! This module provides the structures describing a deployment of the
//! protocol: which chain it runs on, who deploys it, which address is allowed
//! to sign mint authorizations, where consumed digests are persisted, and how
//! the HTTP API is exposed. Configuration is loaded from TOML and validated
//! before any component is constructed.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)
//!
//! Values may reference environment variables as `${VAR}` or
//! `${VAR:-default}`; this is how signing keys are kept out of config files.

mod loader;

use mint_types::Address;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep only the message, not the dump of the input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the signature-mint service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Chain and protocol deployment parameters.
	pub protocol: ProtocolConfig,
	/// Metadata of the mintable token deployed alongside the protocol.
	#[serde(default)]
	pub token: TokenConfig,
	/// Configuration for the state storage backend.
	pub storage: StorageConfig,
	/// Signing account used to issue authorizations. Optional; without it the
	/// service only accepts authorizations signed elsewhere.
	pub account: Option<AccountConfig>,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Chain and protocol deployment parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolConfig {
	/// Chain id bound into the EIP-712 domain.
	pub chain_id: u64,
	/// Account that deploys the token and the protocol, and owns the token.
	pub deployer: Address,
	/// Address whose signatures authorize mints. Defaults to the address of
	/// the configured signing account.
	pub signer: Option<Address>,
}

/// Token metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
	#[serde(default = "default_token_name")]
	pub name: String,
	#[serde(default = "default_token_symbol")]
	pub symbol: String,
}

impl Default for TokenConfig {
	fn default() -> Self {
		Self {
			name: default_token_name(),
			symbol: default_token_symbol(),
		}
	}
}

fn default_token_name() -> String {
	"Signature Mint Token".to_string()
}

fn default_token_symbol() -> String {
	"SMT".to_string()
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the signing account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Origins allowed by CORS. Empty means any origin.
	#[serde(default)]
	pub allowed_origins: Vec<String>,
}

/// Returns the default API host.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
fn default_api_port() -> u16 {
	3000
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut replacements = Vec::new();
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match (std::env::var(var_name.as_str()), default_value) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)));
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply in reverse order so earlier offsets stay valid
	let mut result = input.to_string();
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives and
	/// resolving environment variables.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// - Chain id must be non-zero
	/// - Deployer and signer must be non-zero addresses
	/// - A signer must be configured or derivable from the account section
	/// - Primary storage and account implementations must exist
	/// - An enabled API needs a host and a non-zero port
	fn validate(&self) -> Result<(), ConfigError> {
		if self.protocol.chain_id == 0 {
			return Err(ConfigError::Validation(
				"protocol.chain_id must be greater than 0".into(),
			));
		}
		if self.protocol.deployer == Address::ZERO {
			return Err(ConfigError::Validation(
				"protocol.deployer cannot be the zero address".into(),
			));
		}
		match self.protocol.signer {
			Some(signer) if signer == Address::ZERO => {
				return Err(ConfigError::Validation(
					"protocol.signer cannot be the zero address".into(),
				));
			},
			None if self.account.is_none() => {
				return Err(ConfigError::Validation(
					"protocol.signer is required when no [account] section is configured".into(),
				));
			},
			_ => {},
		}

		if self.token.name.is_empty() || self.token.symbol.is_empty() {
			return Err(ConfigError::Validation(
				"Token name and symbol cannot be empty".into(),
			));
		}

		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		if let Some(ref account) = self.account {
			if !account.implementations.contains_key(&account.primary) {
				return Err(ConfigError::Validation(format!(
					"Primary account '{}' not found in implementations",
					account.primary
				)));
			}
		}

		if let Some(ref api) = self.api {
			if api.enabled {
				if api.host.is_empty() {
					return Err(ConfigError::Validation("API host cannot be empty".into()));
				}
				if api.port == 0 {
					return Err(ConfigError::Validation(
						"API port must be greater than 0".into(),
					));
				}
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[protocol]
chain_id = 31337
deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
signer = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

[storage]
primary = "memory"
[storage.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("MINT_TEST_HOST", "localhost");
		std::env::set_var("MINT_TEST_PORT", "8080");

		let input = "host = \"${MINT_TEST_HOST}:${MINT_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:8080\"");

		std::env::remove_var("MINT_TEST_HOST");
		std::env::remove_var("MINT_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${MINT_MISSING_VAR:-fallback}\"";
		assert_eq!(resolve_env_vars(input).unwrap(), "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${MINT_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("MINT_MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_defaults() {
		let config: Config = BASE.parse().unwrap();

		assert_eq!(config.protocol.chain_id, 31337);
		assert_eq!(config.token.symbol, "SMT");
		assert!(config.account.is_none());
		assert!(config.api.is_none());
	}

	#[test]
	fn test_account_key_from_env() {
		let config_str = r#"
[protocol]
chain_id = 31337
deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"

[storage]
primary = "memory"
[storage.implementations.memory]

[account]
primary = "local"
[account.implementations.local]
private_key = "${MINT_TEST_SIGNER_KEY:-0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d}"

[api]
enabled = true
port = 4000
"#;
		let config: Config = config_str.parse().unwrap();
		let account = config.account.unwrap();
		assert_eq!(
			account.implementations["local"]
				.get("private_key")
				.and_then(|v| v.as_str()),
			Some("0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d")
		);

		let api = config.api.unwrap();
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 4000);
	}

	#[test]
	fn test_signer_required_without_account() {
		let config_str = BASE.replace(
			"signer = \"0x70997970C51812dc3A010C7d01b50e0d17dc79C8\"\n",
			"",
		);
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("protocol.signer is required"));
	}

	#[test]
	fn test_zero_addresses_rejected() {
		let zero_signer = BASE.replace(
			"0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
			"0x0000000000000000000000000000000000000000",
		);
		assert!(zero_signer
			.parse::<Config>()
			.unwrap_err()
			.to_string()
			.contains("protocol.signer cannot be the zero address"));

		let zero_chain = BASE.replace("chain_id = 31337", "chain_id = 0");
		assert!(matches!(
			zero_chain.parse::<Config>(),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_unknown_primary_storage_rejected() {
		let config_str = BASE.replace("primary = \"memory\"", "primary = \"file\"");
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary storage 'file'"));
	}

	#[test]
	fn test_malformed_address_is_parse_error() {
		let config_str = BASE.replace(
			"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
			"not-an-address",
		);
		assert!(matches!(
			config_str.parse::<Config>(),
			Err(ConfigError::Parse(_))
		));
	}
}
