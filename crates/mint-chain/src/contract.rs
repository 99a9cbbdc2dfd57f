//! Capabilities a deployed contract can expose to other contracts.
//!
//! A contract is looked up by address through [`Chain::contract`](crate::Chain::contract)
//! and then asked for the capability the caller needs. A contract that lacks
//! the capability behaves like EVM code without the called function: the call
//! fails.

use async_trait::async_trait;
use mint_types::{Address, CallContext, U256};
use thiserror::Error;

/// Errors surfaced by token calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
	/// The caller is not the address the token accepts mints from.
	#[error("Only protocol")]
	OnlyProtocol,
	/// An owner-gated operation was called by someone else.
	#[error("Ownable: caller is not the owner")]
	NotOwner,
	#[error("Ownable: new owner is the zero address")]
	ZeroOwner,
	#[error("Mint to the zero address")]
	MintToZeroAddress,
	/// Balance or supply would exceed `U256::MAX`.
	#[error("Arithmetic overflow")]
	Overflow,
	/// The recipient contract rejected the mint.
	#[error("Rejected by receiver: {0}")]
	Rejected(String),
	#[error("Call depth exceeded")]
	CallDepthExceeded,
	#[error("Storage error: {0}")]
	Storage(String),
}

/// Code installed at an address.
pub trait Contract: Send + Sync {
	/// Address the contract is deployed at.
	fn address(&self) -> Address;

	/// Human readable name of the contract code, used in logs and the code registry.
	fn kind(&self) -> &'static str;

	/// Returns the mint entry point if the contract has one.
	fn as_mintable(&self) -> Option<&dyn Mintable> {
		None
	}

	/// Returns the mint notification hook if the contract has one.
	fn as_receiver(&self) -> Option<&dyn MintReceiver> {
		None
	}
}

/// Token entry point used by the protocol.
#[async_trait]
pub trait Mintable: Send + Sync {
	/// Credits `amount` new tokens to `recipient`.
	///
	/// `ctx.sender` is the contract making the call; tokens reject every
	/// sender except their configured protocol.
	async fn mint(&self, ctx: &CallContext, recipient: Address, amount: U256)
		-> Result<(), TokenError>;
}

/// Hook called on a recipient contract after tokens were minted to it.
///
/// The hook runs inside the mint call, so it may call back into the protocol.
#[async_trait]
pub trait MintReceiver: Send + Sync {
	/// `ctx.sender` is the token, `ctx.origin` the account that submitted
	/// the transaction.
	async fn on_mint(&self, ctx: &CallContext, amount: U256) -> Result<(), TokenError>;
}
