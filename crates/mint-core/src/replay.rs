//! One-time-use tracking of authorization digests.

use mint_chain::Chain;
use mint_storage::StorageError;
use mint_types::{Address, StorageKey, B256};
use std::sync::Arc;

/// Set of digests that already authorized a mint.
///
/// The set only grows. Marks are written to contract state, so a mark made
/// inside a snapshot that is reverted disappears with it.
pub struct ReplayGuard {
	chain: Arc<Chain>,
	namespace: String,
}

impl ReplayGuard {
	/// Guard for the protocol deployed at `protocol`.
	pub fn new(chain: Arc<Chain>, protocol: &Address) -> Self {
		Self {
			chain,
			namespace: StorageKey::ConsumedDigests.scoped(protocol),
		}
	}

	/// Whether `digest` is consumed as seen by the running transaction.
	pub async fn is_consumed(&self, digest: &B256) -> Result<bool, StorageError> {
		self.chain
			.storage()
			.exists(&self.namespace, &digest.to_string())
			.await
	}

	/// Whether a committed transaction consumed `digest`.
	pub async fn is_consumed_committed(&self, digest: &B256) -> Result<bool, StorageError> {
		self.chain
			.storage()
			.exists_committed(&self.namespace, &digest.to_string())
			.await
	}

	pub async fn consume(&self, digest: &B256) -> Result<(), StorageError> {
		self.chain
			.storage()
			.store(&self.namespace, &digest.to_string(), &true)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mint_chain::EventBus;
	use mint_storage::{implementations::memory::MemoryStorage, StorageService};

	fn chain() -> Arc<Chain> {
		Arc::new(Chain::new(
			31337,
			StorageService::new(Box::new(MemoryStorage::new())),
			EventBus::new(4),
		))
	}

	#[tokio::test]
	async fn test_consume_marks_digest() {
		let guard = ReplayGuard::new(chain(), &Address::repeat_byte(0x01));
		let digest = B256::repeat_byte(0xaa);

		assert!(!guard.is_consumed(&digest).await.unwrap());
		guard.consume(&digest).await.unwrap();
		assert!(guard.is_consumed(&digest).await.unwrap());
		assert!(!guard.is_consumed(&B256::repeat_byte(0xbb)).await.unwrap());
	}

	#[tokio::test]
	async fn test_guards_are_scoped_per_protocol() {
		let chain = chain();
		let first = ReplayGuard::new(chain.clone(), &Address::repeat_byte(0x01));
		let second = ReplayGuard::new(chain, &Address::repeat_byte(0x02));
		let digest = B256::repeat_byte(0xaa);

		first.consume(&digest).await.unwrap();
		assert!(!second.is_consumed(&digest).await.unwrap());
	}

	#[tokio::test]
	async fn test_reverted_mark_is_forgotten() {
		let chain = chain();
		let guard = ReplayGuard::new(chain.clone(), &Address::repeat_byte(0x01));
		let digest = B256::repeat_byte(0xaa);

		let snapshot = chain.snapshot().await;
		guard.consume(&digest).await.unwrap();
		chain.revert(snapshot).await.unwrap();

		assert!(!guard.is_consumed(&digest).await.unwrap());
	}

	#[tokio::test]
	async fn test_mark_is_committed_with_its_transaction() {
		let chain = chain();
		let guard = ReplayGuard::new(chain.clone(), &Address::repeat_byte(0x01));
		let digest = B256::repeat_byte(0xaa);

		let tx = chain.begin(Address::repeat_byte(0x02)).await;
		guard.consume(&digest).await.unwrap();
		assert!(guard.is_consumed(&digest).await.unwrap());
		assert!(!guard.is_consumed_committed(&digest).await.unwrap());
		tx.commit().await.unwrap();

		assert!(guard.is_consumed_committed(&digest).await.unwrap());
	}
}
