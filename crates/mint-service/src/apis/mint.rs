//! Submitting signature mint transactions.

use mint_core::{MintEngine, ProtocolError};
use mint_types::{decode_hex, APIError, SubmitMintRequest, SubmitMintResponse};

/// Submits `request` to the protocol as a transaction from `request.caller`.
pub async fn submit_mint(
	engine: &MintEngine,
	request: SubmitMintRequest,
) -> Result<SubmitMintResponse, APIError> {
	let signature = parse_signature(&request.signature)?;

	let receipt = engine
		.protocol()
		.submit(request.caller, &signature, request.recipient, request.amount)
		.await
		.map_err(protocol_error)?;

	Ok(SubmitMintResponse {
		digest: receipt.digest,
		events: receipt.events,
	})
}

/// Decodes a hex signature, `0x` prefix optional.
fn parse_signature(raw: &str) -> Result<Vec<u8>, APIError> {
	decode_hex(raw).map_err(|e| APIError::BadRequest {
		error_type: "INVALID_SIGNATURE_ENCODING".to_string(),
		message: format!("Signature is not hex: {}", e),
	})
}

/// Maps a protocol failure onto its HTTP status class.
pub fn protocol_error(err: ProtocolError) -> APIError {
	let message = err.to_string();
	match err {
		ProtocolError::ToZeroAddress => APIError::BadRequest {
			error_type: "TO_ZERO_ADDRESS".to_string(),
			message,
		},
		ProtocolError::SignatureError => APIError::BadRequest {
			error_type: "SIGNATURE_ERROR".to_string(),
			message,
		},
		ProtocolError::AlreadyMinted => APIError::Conflict {
			error_type: "ALREADY_MINTED".to_string(),
			message,
		},
		ProtocolError::ExternalCallFailed => APIError::BadGateway {
			error_type: "EXTERNAL_CALL_FAILED".to_string(),
			message,
		},
		ProtocolError::SignerAddressZero
		| ProtocolError::TokenAddressZero
		| ProtocolError::TokenNotAContract
		| ProtocolError::Storage(_) => APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message,
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_signature_hex_with_or_without_prefix() {
		assert_eq!(parse_signature("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
		assert_eq!(parse_signature("0A0B").unwrap(), vec![0x0a, 0x0b]);

		let err = parse_signature("0xnot-hex").unwrap_err();
		assert_eq!(err.status_code(), 400);
		assert_eq!(err.to_error_response().error, "INVALID_SIGNATURE_ENCODING");
	}

	#[test]
	fn test_protocol_errors_map_to_status_classes() {
		let cases = [
			(ProtocolError::ToZeroAddress, 400, "TO_ZERO_ADDRESS"),
			(ProtocolError::SignatureError, 400, "SIGNATURE_ERROR"),
			(ProtocolError::AlreadyMinted, 409, "ALREADY_MINTED"),
			(ProtocolError::ExternalCallFailed, 502, "EXTERNAL_CALL_FAILED"),
			(ProtocolError::Storage("disk".into()), 500, "INTERNAL_ERROR"),
		];

		for (err, status, code) in cases {
			let api = protocol_error(err);
			assert_eq!(api.status_code(), status);
			assert_eq!(api.to_error_response().error, code);
		}
	}
}
