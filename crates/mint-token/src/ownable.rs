//! Single-owner access control.
//!
//! The owner is kept in contract state, so an ownership change made inside a
//! transaction that later reverts is undone with it.

use mint_chain::{Chain, TokenError};
use mint_types::{Address, CallContext, MintEvent, StorageKey, TokenEvent};
use std::sync::Arc;
use thiserror::Error;

const OWNER_SLOT: &str = "current";

/// Errors raised by owner-gated operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
	#[error("Ownable: caller is not the owner")]
	NotOwner,
	#[error("Ownable: new owner is the zero address")]
	ZeroOwner,
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<AccessError> for TokenError {
	fn from(err: AccessError) -> Self {
		match err {
			AccessError::NotOwner => TokenError::NotOwner,
			AccessError::ZeroOwner => TokenError::ZeroOwner,
			AccessError::Storage(e) => TokenError::Storage(e),
		}
	}
}

/// Owner capability of one contract.
pub struct Ownable {
	contract: Address,
	chain: Arc<Chain>,
}

impl Ownable {
	/// Sets the initial owner of `contract`.
	pub async fn initialize(
		chain: Arc<Chain>,
		contract: Address,
		owner: Address,
	) -> Result<Self, AccessError> {
		let ownable = Self { contract, chain };
		ownable.set_owner(owner).await?;
		Ok(ownable)
	}

	/// Current owner. The zero address once ownership was renounced.
	pub async fn owner(&self) -> Result<Address, AccessError> {
		self.chain
			.storage()
			.load::<Address>(&self.namespace(), OWNER_SLOT)
			.await
			.map(Option::unwrap_or_default)
			.map_err(|e| AccessError::Storage(e.to_string()))
	}

	/// Fails unless `ctx.sender` is the owner.
	pub async fn only_owner(&self, ctx: &CallContext) -> Result<(), AccessError> {
		if self.owner().await? != ctx.sender {
			tracing::warn!(
				contract = %self.contract,
				caller = %ctx.sender,
				"Rejected owner-only call"
			);
			return Err(AccessError::NotOwner);
		}
		Ok(())
	}

	/// Hands ownership to `new_owner`.
	pub async fn transfer_ownership(
		&self,
		ctx: &CallContext,
		new_owner: Address,
	) -> Result<(), AccessError> {
		self.only_owner(ctx).await?;
		if new_owner == Address::ZERO {
			return Err(AccessError::ZeroOwner);
		}
		self.set_owner(new_owner).await
	}

	/// Leaves the contract without an owner. Owner-gated operations become
	/// unreachable for good.
	pub async fn renounce_ownership(&self, ctx: &CallContext) -> Result<(), AccessError> {
		self.only_owner(ctx).await?;
		tracing::warn!(contract = %self.contract, "Ownership renounced");
		self.set_owner(Address::ZERO).await
	}

	async fn set_owner(&self, new_owner: Address) -> Result<(), AccessError> {
		let previous = self.owner().await?;
		self.chain
			.storage()
			.store(&self.namespace(), OWNER_SLOT, &new_owner)
			.await
			.map_err(|e| AccessError::Storage(e.to_string()))?;
		self.chain
			.emit(MintEvent::Token(TokenEvent::OwnershipTransferred {
				contract: self.contract,
				previous,
				new: new_owner,
			}))
			.await;
		Ok(())
	}

	fn namespace(&self) -> String {
		StorageKey::Owner.scoped(&self.contract)
	}
}
