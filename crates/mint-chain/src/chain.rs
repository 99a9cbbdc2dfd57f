//! In-process execution environment.
//!
//! [`Chain`] provides what the protocol and token need from a blockchain:
//! a chain id, CREATE-style deployment addresses, a registry of deployed
//! code, contract state with nested rollback, and event logs that are only
//! published when the enclosing transaction commits.
//!
//! Top-level transactions are serialized by [`Chain::begin`]. Calls between
//! contracts inside a transaction never take that lock; they open nested
//! snapshots instead, so a failing inner call can be undone without touching
//! the work of its caller. A transaction that is dropped before it is closed,
//! for instance because the future driving it was cancelled, is rolled back.

use crate::contract::Contract;
use crate::event_bus::EventBus;
use mint_storage::{Checkpoint, StorageError, StorageService};
use mint_types::{truncate_id, Address, CallContext, MintEvent};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, Weak};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Errors raised by the execution environment itself.
#[derive(Debug, Error)]
pub enum ChainError {
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
	#[error("Address {0} already holds code")]
	AddressInUse(Address),
}

/// Restore point covering contract state and pending logs.
#[derive(Debug, Clone, Copy)]
#[must_use = "a snapshot must be committed or reverted"]
pub struct Snapshot {
	storage: Checkpoint,
	logs: usize,
}

impl Snapshot {
	/// True for the snapshot opened by a top-level transaction.
	pub fn is_outermost(&self) -> bool {
		self.storage.depth() == 1
	}
}

struct InstalledCode {
	kind: &'static str,
	/// The registry does not keep contracts alive; their deployer does.
	instance: Weak<dyn Contract>,
}

/// The execution environment shared by all deployed contracts.
pub struct Chain {
	chain_id: u64,
	storage: StorageService,
	code: RwLock<HashMap<Address, InstalledCode>>,
	nonces: Mutex<HashMap<Address, u64>>,
	tx_lock: Mutex<()>,
	/// Events emitted by the running transaction, not yet published.
	logs: std::sync::Mutex<Vec<MintEvent>>,
	event_bus: EventBus,
}

impl Chain {
	pub fn new(chain_id: u64, storage: StorageService, event_bus: EventBus) -> Self {
		Self {
			chain_id,
			storage,
			code: RwLock::new(HashMap::new()),
			nonces: Mutex::new(HashMap::new()),
			tx_lock: Mutex::new(()),
			logs: std::sync::Mutex::new(Vec::new()),
			event_bus,
		}
	}

	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	/// Contract state. Writes are buffered while a snapshot is open.
	pub fn storage(&self) -> &StorageService {
		&self.storage
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Number of contracts `account` has created so far.
	pub async fn nonce(&self, account: &Address) -> u64 {
		self.nonces
			.lock()
			.await
			.get(account)
			.copied()
			.unwrap_or_default()
	}

	/// Reserves the next CREATE address of `deployer` and bumps its nonce.
	///
	/// The address is `keccak256(rlp([deployer, nonce]))[12..]`, so a fixed
	/// deployer produces the same addresses on every start.
	pub async fn create_address(&self, deployer: &Address) -> Address {
		let mut nonces = self.nonces.lock().await;
		let nonce = nonces.entry(*deployer).or_default();
		let address = deployer.create(*nonce);
		*nonce += 1;
		address
	}

	/// Registers deployed code at the contract's address.
	pub async fn install(&self, contract: Arc<dyn Contract>) -> Result<(), ChainError> {
		let address = contract.address();
		let mut code = self.code.write().await;
		if code.contains_key(&address) {
			return Err(ChainError::AddressInUse(address));
		}

		tracing::debug!(
			address = %truncate_id(&address.to_string()),
			kind = contract.kind(),
			"Installed contract code"
		);
		code.insert(
			address,
			InstalledCode {
				kind: contract.kind(),
				instance: Arc::downgrade(&contract),
			},
		);
		Ok(())
	}

	/// Returns true if code was installed at `address`.
	pub async fn has_code(&self, address: &Address) -> bool {
		self.code.read().await.contains_key(address)
	}

	/// Name of the code installed at `address`.
	pub async fn code_kind(&self, address: &Address) -> Option<&'static str> {
		self.code.read().await.get(address).map(|code| code.kind)
	}

	/// Resolves the live contract at `address`.
	pub async fn contract(&self, address: &Address) -> Option<Arc<dyn Contract>> {
		self.code
			.read()
			.await
			.get(address)
			.and_then(|code| code.instance.upgrade())
	}

	fn logs(&self) -> std::sync::MutexGuard<'_, Vec<MintEvent>> {
		self.logs.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Opens a nested restore point.
	pub async fn snapshot(&self) -> Snapshot {
		let logs = self.logs().len();
		Snapshot {
			storage: self.storage.checkpoint().await,
			logs,
		}
	}

	/// Keeps everything done since `snapshot`.
	///
	/// Committing the outermost snapshot writes the state to the backend,
	/// then publishes the pending events on the event bus and returns them.
	/// Nested commits return nothing; their events stay pending and can still
	/// be dropped by an enclosing revert.
	pub async fn commit(&self, snapshot: Snapshot) -> Result<Vec<MintEvent>, ChainError> {
		if !snapshot.is_outermost() {
			self.storage.commit(snapshot.storage).await?;
			return Ok(Vec::new());
		}

		let events: Vec<MintEvent> = self.logs().drain(..).collect();
		let published = events.clone();
		let event_bus = self.event_bus.clone();
		self.storage
			.commit_then(snapshot.storage, move || {
				for event in published {
					event_bus.publish(event);
				}
			})
			.await?;
		Ok(events)
	}

	/// Undoes every state write and drops every event since `snapshot`.
	pub async fn revert(&self, snapshot: Snapshot) -> Result<(), ChainError> {
		self.logs().truncate(snapshot.logs);
		self.storage.revert(snapshot.storage).await?;
		Ok(())
	}

	/// Drops `snapshot` and everything nested in it without ordering checks.
	fn abort(&self, snapshot: Snapshot) {
		self.logs().truncate(snapshot.logs);
		self.storage.discard(snapshot.storage);
	}

	/// Records an event for the running transaction.
	///
	/// Outside a transaction the event is published immediately.
	pub async fn emit(&self, event: MintEvent) {
		if self.storage.depth().await == 0 {
			self.event_bus.publish(event);
			return;
		}
		self.logs().push(event);
	}

	/// Starts a top-level transaction sent by `sender`.
	///
	/// Waits until no other transaction is running. The returned handle must
	/// be closed with [`Transaction::commit`] or [`Transaction::revert`].
	pub async fn begin(&self, sender: Address) -> Transaction<'_> {
		let guard = self.tx_lock.lock().await;
		let snapshot = self.snapshot().await;
		Transaction {
			chain: self,
			context: CallContext::external(sender),
			snapshot,
			closed: false,
			_guard: guard,
		}
	}
}

/// A running top-level transaction. Holds the transaction lock until closed.
///
/// Dropping it without a successful commit or revert rolls it back.
#[must_use = "a transaction must be committed or reverted"]
pub struct Transaction<'a> {
	chain: &'a Chain,
	context: CallContext,
	snapshot: Snapshot,
	closed: bool,
	_guard: MutexGuard<'a, ()>,
}

impl Transaction<'_> {
	/// Call context of the outermost frame.
	pub fn context(&self) -> &CallContext {
		&self.context
	}

	/// Commits the transaction and returns the events it emitted.
	pub async fn commit(mut self) -> Result<Vec<MintEvent>, ChainError> {
		let result = self.chain.commit(self.snapshot).await;
		self.closed = result.is_ok();
		result
	}

	/// Rolls the transaction back. Nothing it emitted is published.
	pub async fn revert(mut self) -> Result<(), ChainError> {
		let result = self.chain.revert(self.snapshot).await;
		self.closed = result.is_ok();
		result
	}
}

impl Drop for Transaction<'_> {
	fn drop(&mut self) {
		if self.closed {
			return;
		}
		tracing::warn!(
			sender = %self.context.sender,
			"Transaction dropped before it was closed, rolling back"
		);
		self.chain.abort(self.snapshot);
	}
}
