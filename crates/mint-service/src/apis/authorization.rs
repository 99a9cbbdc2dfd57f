//! Issuing signed mint authorizations.
//!
//! Only instances configured with a signing account can issue. The returned
//! signature can be submitted by anyone, from this service or elsewhere.

use alloy_primitives::{hex, Address};
use mint_core::MintEngine;
use mint_types::{with_0x_prefix, APIError, AuthorizationResponse, IssueAuthorizationRequest};

/// Signs an authorization for `request.recipient` and `request.amount`.
pub async fn issue_authorization(
	engine: &MintEngine,
	request: IssueAuthorizationRequest,
) -> Result<AuthorizationResponse, APIError> {
	let Some(issuer) = engine.issuer() else {
		return Err(APIError::ServiceUnavailable {
			error_type: "ISSUER_NOT_CONFIGURED".to_string(),
			message: "This instance has no signing account".to_string(),
		});
	};

	if request.recipient == Address::ZERO {
		return Err(APIError::BadRequest {
			error_type: "TO_ZERO_ADDRESS".to_string(),
			message: "Authorizations for the zero address can never be minted".to_string(),
		});
	}

	let signing_error = |e: mint_account::AccountError| APIError::InternalServerError {
		error_type: "SIGNING_FAILED".to_string(),
		message: e.to_string(),
	};
	let signer = issuer.signer().await.map_err(signing_error)?;
	let auth = issuer
		.issue(request.recipient, request.amount)
		.await
		.map_err(signing_error)?;

	tracing::info!(
		recipient = %auth.recipient,
		amount = %auth.amount,
		"Issued authorization"
	);

	Ok(AuthorizationResponse {
		recipient: auth.recipient,
		amount: auth.amount,
		signer,
		digest: auth.digest,
		signature: with_0x_prefix(&hex::encode(&auth.signature)),
	})
}
