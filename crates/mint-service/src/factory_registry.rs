//! Registry of the storage and account implementations compiled into the service.
//!
//! Configuration names implementations by key. The registry maps those keys
//! to factory functions so the builder can instantiate whatever is configured.

use mint_account::AccountFactory;
use mint_config::Config;
use mint_core::{MintBuilder, MintEngine, MintFactories};
use mint_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Factories for every available implementation, keyed by name.
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub account: HashMap<String, AccountFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			account: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the process-wide registry, populating it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in mint_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in mint_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		registry
	})
}

/// Picks the factory for every configured implementation, failing on unknown names.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the engine from configuration using the registered implementations.
pub async fn build_engine_from_config(
	config: Config,
) -> Result<MintEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let account_factories = match &config.account {
		Some(account) => build_factories!(registry, account.implementations, account, "account"),
		None => HashMap::new(),
	};

	let factories = MintFactories {
		storage_factories,
		account_factories,
	};

	Ok(MintBuilder::new(config).build(factories).await?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_registry_contains_builtin_implementations() {
		let registry = get_registry();

		assert!(registry.storage.contains_key("memory"));
		assert!(registry.storage.contains_key("file"));
		assert!(registry.account.contains_key("local"));
	}

	#[tokio::test]
	async fn test_unknown_implementation_is_reported() {
		let config: Config = r#"
[protocol]
chain_id = 31337
deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
signer = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

[storage]
primary = "redis"
[storage.implementations.redis]
"#
		.parse()
		.unwrap();

		let err = build_engine_from_config(config).await.err().unwrap();
		assert_eq!(
			err.to_string(),
			"Unknown storage implementation 'redis'. Available: [file, memory]"
		);
	}

	#[tokio::test]
	async fn test_builds_engine_without_account() {
		let config: Config = r#"
[protocol]
chain_id = 31337
deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
signer = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

[storage]
primary = "memory"
[storage.implementations.memory]
"#
		.parse()
		.unwrap();

		let engine = build_engine_from_config(config).await.unwrap();
		assert!(engine.issuer().is_none());
	}
}
