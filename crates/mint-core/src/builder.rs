//! Assembles a running deployment from configuration.
//!
//! Storage and account implementations are created through factory functions
//! keyed by implementation name. The builder then deploys the token and the
//! protocol from the configured deployer and points the token at the protocol,
//! all in one transaction.

use crate::engine::MintEngine;
use crate::issuer::AuthorizationIssuer;
use crate::protocol::Protocol;
use mint_account::{AccountError, AccountInterface, AccountService};
use mint_chain::{Chain, EventBus};
use mint_config::Config;
use mint_storage::{StorageError, StorageInterface, StorageService};
use mint_token::SignatureMintToken;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Capacity of the event bus created for each engine.
const EVENT_BUS_CAPACITY: usize = 1000;

/// Errors that can occur while building an engine.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Deployment failed: {0}")]
	Deployment(String),
}

/// Factory functions for every pluggable component.
pub struct MintFactories<SF, AF> {
	pub storage_factories: HashMap<String, SF>,
	pub account_factories: HashMap<String, AF>,
}

/// Builder for a [`MintEngine`].
pub struct MintBuilder {
	config: Config,
}

impl MintBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Creates storage and accounts, deploys the contracts and returns the engine.
	pub async fn build<SF, AF>(self, factories: MintFactories<SF, AF>) -> Result<MintEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
	{
		let storage = self.build_storage(&factories.storage_factories)?;
		let account = self.build_account(&factories.account_factories)?;

		let protocol_config = &self.config.protocol;
		let account_address = match &account {
			Some(account) => Some(account.get_address().await.map_err(|e| {
				BuilderError::Config(format!("Failed to get account address: {}", e))
			})?),
			None => None,
		};
		let signer = match (protocol_config.signer, account_address) {
			(Some(signer), Some(address)) if signer != address => {
				return Err(BuilderError::Config(format!(
					"Configured signer {} does not match account address {}",
					signer, address
				)));
			},
			(Some(signer), _) => signer,
			(None, Some(address)) => address,
			(None, None) => {
				return Err(BuilderError::Config(
					"No signer configured and no account to derive it from".into(),
				));
			},
		};

		let chain = Arc::new(Chain::new(
			protocol_config.chain_id,
			storage,
			EventBus::new(EVENT_BUS_CAPACITY),
		));
		let deployer = protocol_config.deployer;

		let tx = chain.begin(deployer).await;
		let deployed = async {
			let token = SignatureMintToken::deploy(
				chain.clone(),
				deployer,
				self.config.token.name.clone(),
				self.config.token.symbol.clone(),
			)
			.await
			.map_err(|e| BuilderError::Deployment(format!("token: {}", e)))?;
			let protocol = Protocol::deploy(chain.clone(), deployer, signer, token.address())
				.await
				.map_err(|e| BuilderError::Deployment(format!("protocol: {}", e)))?;
			token
				.set_protocol(tx.context(), protocol.address())
				.await
				.map_err(|e| BuilderError::Deployment(format!("set_protocol: {}", e)))?;
			Ok::<_, BuilderError>((token, protocol))
		}
		.await;

		let (token, protocol) = match deployed {
			Ok(contracts) => {
				tx.commit()
					.await
					.map_err(|e| BuilderError::Deployment(e.to_string()))?;
				contracts
			},
			Err(e) => {
				tx.revert()
					.await
					.map_err(|e| BuilderError::Deployment(e.to_string()))?;
				return Err(e);
			},
		};

		let issuer = account.map(|account| {
			tracing::info!(component = "issuer", signer = %signer, "Authorization issuing enabled");
			Arc::new(AuthorizationIssuer::new(account, protocol.domain().clone()))
		});

		Ok(MintEngine::new(self.config, chain, token, protocol, issuer))
	}

	fn build_storage<SF>(&self, factories: &HashMap<String, SF>) -> Result<StorageService, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let primary = &self.config.storage.primary;
		let config = self.config.storage.implementations.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Primary storage '{}' is not configured", primary))
		})?;
		let factory = factories.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Unknown storage implementation '{}'", primary))
		})?;

		match factory(config) {
			Ok(backend) => {
				tracing::info!(component = "storage", implementation = %primary, "Loaded");
				Ok(StorageService::new(backend))
			},
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary,
					error = %e,
					"Failed to create storage implementation"
				);
				Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary, e
				)))
			},
		}
	}

	fn build_account<AF>(
		&self,
		factories: &HashMap<String, AF>,
	) -> Result<Option<AccountService>, BuilderError>
	where
		AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
	{
		let Some(account_config) = &self.config.account else {
			tracing::info!(component = "account", "No signing account configured");
			return Ok(None);
		};

		let primary = &account_config.primary;
		let config = account_config.implementations.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Primary account '{}' is not configured", primary))
		})?;
		let factory = factories.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Unknown account implementation '{}'", primary))
		})?;

		match factory(config) {
			Ok(implementation) => {
				tracing::info!(component = "account", implementation = %primary, "Loaded");
				Ok(Some(AccountService::new(implementation)))
			},
			Err(e) => {
				tracing::error!(
					component = "account",
					implementation = %primary,
					error = %e,
					"Failed to create account implementation"
				);
				Err(BuilderError::Config(format!(
					"Failed to create account implementation '{}': {}",
					primary, e
				)))
			},
		}
	}
}
