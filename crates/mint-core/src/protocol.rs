//! The signature-mint protocol contract.
//!
//! Anyone may submit an authorization signed by the configured signer. The
//! protocol rebuilds the typed-data digest, checks the signature, refuses
//! digests it has seen before and asks the token to mint. The digest is
//! marked consumed before the token is called, so a recipient contract that
//! calls back during the mint sees it as used. If the token call fails, the
//! mark and everything the token did are rolled back.

use crate::digest::MintRequest;
use crate::domain::TypedDataDomain;
use crate::replay::ReplayGuard;
use crate::verifier::SignatureVerifier;
use mint_chain::{Chain, ChainError, Contract};
use mint_storage::StorageError;
use mint_types::{truncate_id, Address, CallContext, MintEvent, ProtocolEvent, B256, U256};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
	#[error("Signer address zero")]
	SignerAddressZero,
	#[error("Token address zero")]
	TokenAddressZero,
	#[error("Token is not a contract")]
	TokenNotAContract,
	#[error("To zero address")]
	ToZeroAddress,
	/// Recovery failed or the signature is not from the authorized signer.
	#[error("Signature error")]
	SignatureError,
	#[error("Already minted")]
	AlreadyMinted,
	/// The token rejected the mint. All effects were rolled back.
	#[error("Token contract call failed")]
	ExternalCallFailed,
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<StorageError> for ProtocolError {
	fn from(err: StorageError) -> Self {
		ProtocolError::Storage(err.to_string())
	}
}

impl From<ChainError> for ProtocolError {
	fn from(err: ChainError) -> Self {
		ProtocolError::Storage(err.to_string())
	}
}

/// Outcome of a committed top-level mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
	/// Digest consumed by the mint.
	pub digest: B256,
	/// Events emitted by the transaction, in order.
	pub events: Vec<MintEvent>,
}

/// Signature-authorized minting front end of one token.
pub struct Protocol {
	address: Address,
	chain: Arc<Chain>,
	verifier: SignatureVerifier,
	mintable_token: Address,
	domain: TypedDataDomain,
	replay: ReplayGuard,
}

impl Protocol {
	/// Deploys a protocol that mints `token` on authorizations from `signer`.
	///
	/// The deployment address is taken from `deployer`'s nonce even when
	/// validation fails, as a reverted deployment still uses the nonce.
	pub async fn deploy(
		chain: Arc<Chain>,
		deployer: Address,
		signer: Address,
		token: Address,
	) -> Result<Arc<Self>, ProtocolError> {
		let address = chain.create_address(&deployer).await;

		if signer == Address::ZERO {
			return Err(ProtocolError::SignerAddressZero);
		}
		if token == Address::ZERO {
			return Err(ProtocolError::TokenAddressZero);
		}
		if !chain.has_code(&token).await {
			return Err(ProtocolError::TokenNotAContract);
		}

		let domain = TypedDataDomain::new(chain.chain_id(), address);
		let protocol = Arc::new(Self {
			address,
			chain: chain.clone(),
			verifier: SignatureVerifier::new(signer),
			mintable_token: token,
			replay: ReplayGuard::new(chain.clone(), &address),
			domain,
		});
		chain.install(protocol.clone()).await?;
		chain
			.emit(MintEvent::Protocol(ProtocolEvent::Deployed {
				protocol: address,
				signer,
				token,
				domain_separator: protocol.domain_separator(),
			}))
			.await;

		tracing::info!(
			protocol = %address,
			%signer,
			%token,
			chain_id = chain.chain_id(),
			"Deployed signature-mint protocol"
		);
		Ok(protocol)
	}

	pub fn address(&self) -> Address {
		self.address
	}

	/// The only address whose signatures authorize mints.
	pub fn mint_signer(&self) -> Address {
		self.verifier.signer()
	}

	/// The token this protocol mints.
	pub fn mintable_token(&self) -> Address {
		self.mintable_token
	}

	pub fn domain(&self) -> &TypedDataDomain {
		&self.domain
	}

	pub fn domain_separator(&self) -> B256 {
		self.domain.separator()
	}

	/// Digest an authorization for `(recipient, amount)` must sign.
	pub fn authorization_digest(&self, recipient: Address, amount: U256) -> B256 {
		MintRequest::new(recipient, amount).signing_digest(&self.domain)
	}

	/// Whether a committed transaction already used `digest`.
	pub async fn is_consumed(&self, digest: &B256) -> Result<bool, ProtocolError> {
		Ok(self.replay.is_consumed_committed(digest).await?)
	}

	/// Runs [`signature_mint`](Self::signature_mint) as a top-level
	/// transaction sent by `caller`.
	///
	/// Waits for any running transaction to finish. On success the
	/// transaction's events have been published on the event bus. Dropping
	/// the returned future before it completes rolls the transaction back,
	/// unless it was already handing its writes to storage, in which case
	/// that commit still finishes.
	pub async fn submit(
		&self,
		caller: Address,
		signature: &[u8],
		recipient: Address,
		amount: U256,
	) -> Result<MintReceipt, ProtocolError> {
		let tx = self.chain.begin(caller).await;
		let ctx = *tx.context();

		match self.signature_mint(&ctx, signature, recipient, amount).await {
			Ok(()) => {
				let events = tx.commit().await?;
				Ok(MintReceipt {
					digest: self.authorization_digest(recipient, amount),
					events,
				})
			},
			Err(e) => {
				tx.revert().await?;
				Err(e)
			},
		}
	}

	/// Mints `amount` to `recipient` if `signature` is an unused
	/// authorization for exactly that pair.
	///
	/// This is the entry point for calls made inside a running transaction,
	/// including calls back into the protocol from the token's recipient.
	/// It never waits for the transaction lock.
	pub async fn signature_mint(
		&self,
		ctx: &CallContext,
		signature: &[u8],
		recipient: Address,
		amount: U256,
	) -> Result<(), ProtocolError> {
		if recipient == Address::ZERO {
			tracing::warn!(caller = %ctx.sender, "Rejected mint to the zero address");
			return Err(ProtocolError::ToZeroAddress);
		}

		let digest = self.authorization_digest(recipient, amount);
		tracing::debug!(digest = %digest, %recipient, %amount, "Verifying authorization");

		if let Err(e) = self.verifier.verify(&digest, signature) {
			tracing::warn!(
				caller = %ctx.sender,
				digest = %truncate_id(&digest.to_string()),
				reason = %e,
				"Rejected authorization"
			);
			return Err(ProtocolError::SignatureError);
		}

		if self.replay.is_consumed(&digest).await? {
			tracing::warn!(
				caller = %ctx.sender,
				digest = %truncate_id(&digest.to_string()),
				depth = ctx.depth,
				"Rejected reused authorization"
			);
			return Err(ProtocolError::AlreadyMinted);
		}

		let snapshot = self.chain.snapshot().await;
		match self.consume_and_mint(ctx, &digest, recipient, amount).await {
			Ok(()) => {
				self.chain.commit(snapshot).await?;
				tracing::info!(
					caller = %ctx.sender,
					%recipient,
					%amount,
					digest = %truncate_id(&digest.to_string()),
					"Signature mint"
				);
				Ok(())
			},
			Err(e) => {
				self.chain.revert(snapshot).await?;
				Err(e)
			},
		}
	}

	async fn consume_and_mint(
		&self,
		ctx: &CallContext,
		digest: &B256,
		recipient: Address,
		amount: U256,
	) -> Result<(), ProtocolError> {
		self.replay.consume(digest).await?;

		let token = self.chain.contract(&self.mintable_token).await;
		let Some(mintable) = token.as_deref().and_then(|c| c.as_mintable()) else {
			tracing::warn!(token = %self.mintable_token, "Token has no mint entry point");
			return Err(ProtocolError::ExternalCallFailed);
		};

		let inner = ctx.nested(self.address);
		if inner.depth_exceeded() {
			return Err(ProtocolError::ExternalCallFailed);
		}
		if let Err(e) = mintable.mint(&inner, recipient, amount).await {
			tracing::warn!(token = %self.mintable_token, reason = %e, "Token mint failed");
			return Err(ProtocolError::ExternalCallFailed);
		}

		self.chain
			.emit(MintEvent::Protocol(ProtocolEvent::SignatureMint {
				protocol: self.address,
				caller: ctx.sender,
				recipient,
				amount,
			}))
			.await;
		Ok(())
	}
}

impl Contract for Protocol {
	fn address(&self) -> Address {
		self.address
	}

	fn kind(&self) -> &'static str {
		"SignatureMintProtocol"
	}
}
