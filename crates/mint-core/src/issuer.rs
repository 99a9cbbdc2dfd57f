//! Off-chain issuance of mint authorizations.

use crate::digest::MintRequest;
use crate::domain::TypedDataDomain;
use alloy_primitives::Bytes;
use mint_account::{AccountError, AccountService};
use mint_types::{Address, B256, U256};

/// A signed authorization ready to be submitted to the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAuthorization {
	pub recipient: Address,
	pub amount: U256,
	pub digest: B256,
	/// 65-byte `r || s || v` signature over `digest`.
	pub signature: Bytes,
}

/// Signs mint authorizations for one protocol domain.
pub struct AuthorizationIssuer {
	account: AccountService,
	domain: TypedDataDomain,
}

impl AuthorizationIssuer {
	pub fn new(account: AccountService, domain: TypedDataDomain) -> Self {
		Self { account, domain }
	}

	/// Address of the signing account.
	pub async fn signer(&self) -> Result<Address, AccountError> {
		self.account.get_address().await
	}

	/// Signs an authorization to mint `amount` to `recipient`.
	pub async fn issue(
		&self,
		recipient: Address,
		amount: U256,
	) -> Result<SignedAuthorization, AccountError> {
		let digest = MintRequest::new(recipient, amount).signing_digest(&self.domain);
		let signature = self.account.sign_hash(&digest).await?;
		tracing::debug!(%recipient, %amount, %digest, "Issued mint authorization");

		Ok(SignedAuthorization {
			recipient,
			amount,
			digest,
			signature,
		})
	}
}
