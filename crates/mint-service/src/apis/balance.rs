//! Token balance queries.

use alloy_primitives::Address;
use mint_core::MintEngine;
use mint_types::{APIError, BalanceResponse};
use std::fmt::Display;

/// Returns the balance of `address` along with the total supply.
pub async fn get_balance(engine: &MintEngine, address: &str) -> Result<BalanceResponse, APIError> {
	let address: Address = address.parse().map_err(|_| APIError::BadRequest {
		error_type: "INVALID_ADDRESS".to_string(),
		message: format!("Not an address: {}", address),
	})?;

	let token = engine.token();
	Ok(BalanceResponse {
		address,
		balance: token.balance_of(&address).await.map_err(storage_error)?,
		total_supply: token.total_supply().await.map_err(storage_error)?,
	})
}

fn storage_error(e: impl Display) -> APIError {
	APIError::InternalServerError {
		error_type: "STORAGE_ERROR".to_string(),
		message: e.to_string(),
	}
}
