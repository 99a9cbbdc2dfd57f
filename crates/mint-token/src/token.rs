//! Fungible token that only its protocol may mint.
//!
//! Balances and total supply live in contract state. Minting is restricted
//! to one protocol address chosen by the owner. Transfers and allowances are
//! not supported.

use crate::ownable::Ownable;
use async_trait::async_trait;
use mint_chain::{Chain, Contract, Mintable, TokenError};
use mint_types::{Address, CallContext, MintEvent, StorageKey, TokenEvent, U256};
use std::sync::Arc;

const TOTAL_SUPPLY_SLOT: &str = "total";
const PROTOCOL_SLOT: &str = "current";

fn storage_err(err: mint_storage::StorageError) -> TokenError {
	TokenError::Storage(err.to_string())
}

/// Token contract minted through signature authorizations.
pub struct SignatureMintToken {
	address: Address,
	name: String,
	symbol: String,
	chain: Arc<Chain>,
	ownable: Ownable,
}

impl SignatureMintToken {
	/// Deploys a token owned by `deployer` with no protocol set.
	pub async fn deploy(
		chain: Arc<Chain>,
		deployer: Address,
		name: impl Into<String>,
		symbol: impl Into<String>,
	) -> Result<Arc<Self>, TokenError> {
		let address = chain.create_address(&deployer).await;
		let ownable = Ownable::initialize(chain.clone(), address, deployer).await?;

		let token = Arc::new(Self {
			address,
			name: name.into(),
			symbol: symbol.into(),
			chain: chain.clone(),
			ownable,
		});
		chain
			.install(token.clone())
			.await
			.map_err(|e| TokenError::Storage(e.to_string()))?;

		tracing::info!(
			token = %address,
			symbol = %token.symbol,
			owner = %deployer,
			"Deployed token"
		);
		Ok(token)
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	/// Access control of this token.
	pub fn ownable(&self) -> &Ownable {
		&self.ownable
	}

	/// Address allowed to mint. Zero while unset.
	pub async fn protocol(&self) -> Result<Address, TokenError> {
		self.chain
			.storage()
			.load::<Address>(&StorageKey::MintingProtocol.scoped(&self.address), PROTOCOL_SLOT)
			.await
			.map(Option::unwrap_or_default)
			.map_err(storage_err)
	}

	/// Replaces the address allowed to mint. Owner only.
	///
	/// Setting the zero address is accepted and stops all minting until a new
	/// protocol is set.
	pub async fn set_protocol(
		&self,
		ctx: &CallContext,
		protocol: Address,
	) -> Result<(), TokenError> {
		self.ownable.only_owner(ctx).await?;

		let previous = self.protocol().await?;
		self.chain
			.storage()
			.store(
				&StorageKey::MintingProtocol.scoped(&self.address),
				PROTOCOL_SLOT,
				&protocol,
			)
			.await
			.map_err(storage_err)?;

		if protocol == Address::ZERO {
			tracing::warn!(token = %self.address, "Protocol cleared, minting disabled");
		} else {
			tracing::info!(token = %self.address, %previous, new = %protocol, "Protocol changed");
		}
		self.chain
			.emit(MintEvent::Token(TokenEvent::ProtocolChanged {
				token: self.address,
				previous,
				new: protocol,
			}))
			.await;
		Ok(())
	}

	/// Committed balance of `holder`. Mints still in flight are not counted.
	pub async fn balance_of(&self, holder: &Address) -> Result<U256, TokenError> {
		self.chain
			.storage()
			.load_committed::<U256>(&self.balances(), &Self::holder_slot(holder))
			.await
			.map(Option::unwrap_or_default)
			.map_err(storage_err)
	}

	/// Committed total supply.
	pub async fn total_supply(&self) -> Result<U256, TokenError> {
		self.chain
			.storage()
			.load_committed::<U256>(&StorageKey::Supply.scoped(&self.address), TOTAL_SUPPLY_SLOT)
			.await
			.map(Option::unwrap_or_default)
			.map_err(storage_err)
	}

	fn balances(&self) -> String {
		StorageKey::Balances.scoped(&self.address)
	}

	fn holder_slot(holder: &Address) -> String {
		format!("0x{:x}", holder)
	}

	/// Reads a counter as the running transaction sees it.
	async fn load_amount(&self, namespace: &str, slot: &str) -> Result<U256, TokenError> {
		self.chain
			.storage()
			.load::<U256>(namespace, slot)
			.await
			.map(Option::unwrap_or_default)
			.map_err(storage_err)
	}

	async fn credit(&self, recipient: &Address, amount: U256) -> Result<(), TokenError> {
		let supply_key = StorageKey::Supply.scoped(&self.address);
		let holder = Self::holder_slot(recipient);

		let supply = self
			.load_amount(&supply_key, TOTAL_SUPPLY_SLOT)
			.await?
			.checked_add(amount)
			.ok_or(TokenError::Overflow)?;
		let balance = self
			.load_amount(&self.balances(), &holder)
			.await?
			.checked_add(amount)
			.ok_or(TokenError::Overflow)?;

		let storage = self.chain.storage();
		storage
			.store(&supply_key, TOTAL_SUPPLY_SLOT, &supply)
			.await
			.map_err(storage_err)?;
		storage
			.store(&self.balances(), &holder, &balance)
			.await
			.map_err(storage_err)
	}
}

impl Contract for SignatureMintToken {
	fn address(&self) -> Address {
		self.address
	}

	fn kind(&self) -> &'static str {
		"SignatureMintToken"
	}

	fn as_mintable(&self) -> Option<&dyn Mintable> {
		Some(self)
	}
}

#[async_trait]
impl Mintable for SignatureMintToken {
	async fn mint(
		&self,
		ctx: &CallContext,
		recipient: Address,
		amount: U256,
	) -> Result<(), TokenError> {
		if ctx.sender != self.protocol().await? {
			return Err(TokenError::OnlyProtocol);
		}
		if recipient == Address::ZERO {
			return Err(TokenError::MintToZeroAddress);
		}

		self.credit(&recipient, amount).await?;
		self.chain
			.emit(MintEvent::Token(TokenEvent::Transfer {
				token: self.address,
				from: Address::ZERO,
				to: recipient,
				amount,
			}))
			.await;

		// Contracts receiving tokens are notified within the mint call
		let recipient_code = self.chain.contract(&recipient).await;
		if let Some(receiver) = recipient_code.as_deref().and_then(|c| c.as_receiver()) {
			let inner = ctx.nested(self.address);
			if inner.depth_exceeded() {
				return Err(TokenError::CallDepthExceeded);
			}
			receiver.on_mint(&inner, amount).await?;
		}

		tracing::debug!(token = %self.address, %recipient, %amount, "Minted");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;
	use mint_chain::{EventBus, MintReceiver};
	use mint_storage::{implementations::memory::MemoryStorage, StorageService};
	use std::sync::Mutex;

	const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
	const PROTOCOL: Address = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");
	const ALICE: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

	fn chain() -> Arc<Chain> {
		Arc::new(Chain::new(
			31337,
			StorageService::new(Box::new(MemoryStorage::new())),
			EventBus::new(64),
		))
	}

	async fn token_with_protocol(chain: &Arc<Chain>) -> Arc<SignatureMintToken> {
		let token = SignatureMintToken::deploy(chain.clone(), OWNER, "Token", "TKN")
			.await
			.unwrap();
		token
			.set_protocol(&CallContext::external(OWNER), PROTOCOL)
			.await
			.unwrap();
		token
	}

	#[tokio::test]
	async fn test_deploy_sets_owner_and_address() {
		let chain = chain();
		let token = SignatureMintToken::deploy(chain.clone(), OWNER, "Token", "TKN")
			.await
			.unwrap();

		assert_eq!(token.address(), address!("5FbDB2315678afecb367f032d93F642f64180aa3"));
		assert_eq!(token.ownable().owner().await.unwrap(), OWNER);
		assert_eq!(token.protocol().await.unwrap(), Address::ZERO);
		assert_eq!(chain.code_kind(&token.address()).await, Some("SignatureMintToken"));
		assert_eq!((token.name(), token.symbol()), ("Token", "TKN"));
	}

	#[tokio::test]
	async fn test_mint_from_protocol() {
		let chain = chain();
		let token = token_with_protocol(&chain).await;
		let mut events = chain.event_bus().subscribe();

		let tx = chain.begin(ALICE).await;
		token
			.mint(&tx.context().nested(PROTOCOL), ALICE, U256::from(100u64))
			.await
			.unwrap();
		let emitted = tx.commit().await.unwrap();

		assert_eq!(token.balance_of(&ALICE).await.unwrap(), U256::from(100u64));
		assert_eq!(token.total_supply().await.unwrap(), U256::from(100u64));
		let transfer = MintEvent::Token(TokenEvent::Transfer {
			token: token.address(),
			from: Address::ZERO,
			to: ALICE,
			amount: U256::from(100u64),
		});
		assert_eq!(emitted, vec![transfer.clone()]);
		assert_eq!(events.recv().await.unwrap(), transfer);
	}

	#[tokio::test]
	async fn test_queries_report_committed_state_during_a_mint() {
		let chain = chain();
		let token = token_with_protocol(&chain).await;

		let tx = chain.begin(ALICE).await;
		let ctx = tx.context().nested(PROTOCOL);
		token.mint(&ctx, ALICE, U256::from(7u64)).await.unwrap();
		token.mint(&ctx, ALICE, U256::from(3u64)).await.unwrap();

		assert_eq!(token.balance_of(&ALICE).await.unwrap(), U256::ZERO);
		assert_eq!(token.total_supply().await.unwrap(), U256::ZERO);
		tx.commit().await.unwrap();

		assert_eq!(token.balance_of(&ALICE).await.unwrap(), U256::from(10u64));
		assert_eq!(token.total_supply().await.unwrap(), U256::from(10u64));
	}

	#[tokio::test]
	async fn test_only_protocol_can_mint() {
		let chain = chain();
		let token = token_with_protocol(&chain).await;

		for caller in [OWNER, ALICE] {
			let result = token
				.mint(&CallContext::external(caller), ALICE, U256::from(1u8))
				.await;
			assert_eq!(result, Err(TokenError::OnlyProtocol));
			assert_eq!(result.unwrap_err().to_string(), "Only protocol");
		}
		assert_eq!(token.total_supply().await.unwrap(), U256::ZERO);
	}

	#[tokio::test]
	async fn test_mint_overflow_is_rejected() {
		let chain = chain();
		let token = token_with_protocol(&chain).await;
		let ctx = CallContext::external(PROTOCOL);

		token.mint(&ctx, ALICE, U256::MAX).await.unwrap();
		assert_eq!(
			token.mint(&ctx, OWNER, U256::from(1u8)).await,
			Err(TokenError::Overflow)
		);
		assert_eq!(token.balance_of(&OWNER).await.unwrap(), U256::ZERO);
	}

	#[tokio::test]
	async fn test_set_protocol_is_owner_only() {
		let chain = chain();
		let token = token_with_protocol(&chain).await;

		let err = token
			.set_protocol(&CallContext::external(ALICE), ALICE)
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Ownable: caller is not the owner");
		assert_eq!(token.protocol().await.unwrap(), PROTOCOL);
	}

	#[tokio::test]
	async fn test_set_protocol_emits_change_and_zero_disables_minting() {
		let chain = chain();
		let token = token_with_protocol(&chain).await;

		let tx = chain.begin(OWNER).await;
		token.set_protocol(tx.context(), Address::ZERO).await.unwrap();
		let emitted = tx.commit().await.unwrap();

		assert_eq!(
			emitted,
			vec![MintEvent::Token(TokenEvent::ProtocolChanged {
				token: token.address(),
				previous: PROTOCOL,
				new: Address::ZERO,
			})]
		);
		assert_eq!(
			token
				.mint(&CallContext::external(PROTOCOL), ALICE, U256::from(1u8))
				.await,
			Err(TokenError::OnlyProtocol)
		);
	}

	#[tokio::test]
	async fn test_ownership_transfer_and_renounce() {
		let chain = chain();
		let token = token_with_protocol(&chain).await;
		let ownable = token.ownable();

		ownable
			.transfer_ownership(&CallContext::external(OWNER), ALICE)
			.await
			.unwrap();
		assert_eq!(ownable.owner().await.unwrap(), ALICE);
		assert!(token
			.set_protocol(&CallContext::external(OWNER), OWNER)
			.await
			.is_err());

		assert_eq!(
			ownable
				.transfer_ownership(&CallContext::external(ALICE), Address::ZERO)
				.await,
			Err(crate::AccessError::ZeroOwner)
		);

		ownable
			.renounce_ownership(&CallContext::external(ALICE))
			.await
			.unwrap();
		assert_eq!(ownable.owner().await.unwrap(), Address::ZERO);
		assert_eq!(
			token.set_protocol(&CallContext::external(ALICE), ALICE).await,
			Err(TokenError::NotOwner)
		);
	}

	struct Recorder {
		address: Address,
		seen: Mutex<Vec<CallContext>>,
	}

	impl Contract for Recorder {
		fn address(&self) -> Address {
			self.address
		}

		fn kind(&self) -> &'static str {
			"Recorder"
		}

		fn as_receiver(&self) -> Option<&dyn MintReceiver> {
			Some(self)
		}
	}

	#[async_trait]
	impl MintReceiver for Recorder {
		async fn on_mint(&self, ctx: &CallContext, _amount: U256) -> Result<(), TokenError> {
			self.seen.lock().unwrap().push(*ctx);
			Ok(())
		}
	}

	#[tokio::test]
	async fn test_receiver_contract_is_notified() {
		let chain = chain();
		let token = token_with_protocol(&chain).await;
		let receiver = Arc::new(Recorder {
			address: chain.create_address(&ALICE).await,
			seen: Mutex::new(Vec::new()),
		});
		chain.install(receiver.clone()).await.unwrap();

		let ctx = CallContext::external(ALICE).nested(PROTOCOL);
		token
			.mint(&ctx, receiver.address, U256::from(3u8))
			.await
			.unwrap();

		let seen = receiver.seen.lock().unwrap();
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].sender, token.address());
		assert_eq!(seen[0].origin, ALICE);
		assert_eq!(seen[0].depth, 2);
	}
}
