//! API types for the protocol HTTP API.
//!
//! Amounts travel as decimal strings so that 256-bit values survive JSON
//! clients that parse numbers as doubles.

use crate::MintEvent;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Static description of a deployed protocol instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInfo {
	pub protocol: Address,
	pub token: Address,
	pub mint_signer: Address,
	pub chain_id: u64,
	pub domain_name: String,
	pub domain_version: String,
	pub domain_separator: B256,
}

/// Request to issue a signed mint authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAuthorizationRequest {
	pub recipient: Address,
	#[serde(with = "u256_serde")]
	pub amount: U256,
}

/// A signed authorization ready to be submitted by anyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationResponse {
	pub recipient: Address,
	#[serde(with = "u256_serde")]
	pub amount: U256,
	pub signer: Address,
	pub digest: B256,
	/// 65-byte `r || s || v` signature, 0x-prefixed hex.
	pub signature: String,
}

/// Request to submit a signature mint transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMintRequest {
	/// Account submitting the transaction.
	pub caller: Address,
	/// 0x-prefixed hex signature.
	pub signature: String,
	pub recipient: Address,
	#[serde(with = "u256_serde")]
	pub amount: U256,
}

/// Result of a committed signature mint transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMintResponse {
	pub digest: B256,
	pub events: Vec<MintEvent>,
}

/// Token balance of a holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
	pub address: Address,
	#[serde(with = "u256_serde")]
	pub balance: U256,
	#[serde(with = "u256_serde")]
	pub total_supply: U256,
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Machine readable error code, e.g. `ALREADY_MINTED`.
	pub error: String,
	/// Human readable message.
	pub message: String,
}

/// API error with its HTTP status class.
#[derive(Debug, Clone)]
pub enum APIError {
	/// Invalid input or rejected authorization (400).
	BadRequest { error_type: String, message: String },
	/// Authorization already consumed (409).
	Conflict { error_type: String, message: String },
	/// The token collaborator rejected the call (502).
	BadGateway { error_type: String, message: String },
	/// Feature not configured on this instance (503).
	ServiceUnavailable { error_type: String, message: String },
	/// Internal server error (500).
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Conflict { .. } => 409,
			APIError::BadGateway { .. } => 502,
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message) = match self {
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::Conflict {
				error_type,
				message,
			}
			| APIError::BadGateway {
				error_type,
				message,
			}
			| APIError::ServiceUnavailable {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let response = self.to_error_response();
		write!(f, "{} ({}): {}", response.error, self.status_code(), response.message)
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}

/// Serde module for U256 serialization/deserialization as decimal strings.
pub mod u256_serde {
	use alloy_primitives::U256;
	use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.to_string().serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		U256::from_str_radix(&s, 10).map_err(D::Error::custom)
	}
}
