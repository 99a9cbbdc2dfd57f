//! Token contract without a mint entry point.
//!
//! Pointing the protocol at this contract makes every mint call fail, which
//! is how a misconfigured deployment with an incompatible token behaves.

use mint_chain::{Chain, ChainError, Contract};
use mint_types::Address;
use std::sync::Arc;

pub struct PlainToken {
	address: Address,
}

impl PlainToken {
	pub async fn deploy(chain: &Chain, deployer: Address) -> Result<Arc<Self>, ChainError> {
		let token = Arc::new(Self {
			address: chain.create_address(&deployer).await,
		});
		chain.install(token.clone()).await?;
		Ok(token)
	}
}

impl Contract for PlainToken {
	fn address(&self) -> Address {
		self.address
	}

	fn kind(&self) -> &'static str {
		"PlainToken"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mint_chain::EventBus;
	use mint_storage::{implementations::memory::MemoryStorage, StorageService};

	#[tokio::test]
	async fn test_plain_token_has_code_but_no_mint() {
		let chain = Chain::new(
			1,
			StorageService::new(Box::new(MemoryStorage::new())),
			EventBus::new(4),
		);
		let token = PlainToken::deploy(&chain, Address::repeat_byte(0x01))
			.await
			.unwrap();

		assert!(chain.has_code(&token.address()).await);
		let code = chain.contract(&token.address()).await.unwrap();
		assert!(code.as_mintable().is_none());
	}
}
