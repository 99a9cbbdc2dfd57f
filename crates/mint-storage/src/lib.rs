//! Storage module for contract state.
//!
//! This module provides abstractions for persistent storage of protocol and
//! token state, supporting different backend implementations (in-memory,
//! file-based). On top of the raw backends, [`StorageService`] offers typed
//! JSON values and a write overlay with nested checkpoints, which is what gives
//! a transaction its all-or-nothing semantics.

use async_trait::async_trait;
use mint_types::{ConfigSchema, ImplementationRegistry};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::RwLock;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// A checkpoint was closed out of order.
	#[error("Checkpoint error: {0}")]
	Checkpoint(String),
}

/// Low-level key-value interface implemented by storage backends.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes under the given key, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key. Missing keys are not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Applies a batch of writes, `None` deleting the key.
	///
	/// The default applies them one by one. Backends that can make the whole
	/// batch atomic should override it.
	async fn apply(&self, writes: Vec<(String, Option<Vec<u8>>)>) -> Result<(), StorageError> {
		for (key, value) in writes {
			match value {
				Some(bytes) => self.set_bytes(&key, bytes).await?,
				None => self.delete(&key).await?,
			}
		}
		Ok(())
	}

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Marker returned by [`StorageService::checkpoint`].
///
/// Checkpoints nest and must be closed in reverse order of creation, either
/// with [`StorageService::commit`] or [`StorageService::revert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a checkpoint must be committed or reverted"]
pub struct Checkpoint {
	/// Nesting level of this checkpoint, starting at 1.
	depth: usize,
}

impl Checkpoint {
	/// Nesting level, 1 for the outermost checkpoint.
	pub fn depth(&self) -> usize {
		self.depth
	}
}

/// Writes buffered by one open checkpoint. `None` marks a deletion.
type Frame = HashMap<String, Option<Vec<u8>>>;

/// One frame per open checkpoint, innermost last.
#[derive(Debug, Default)]
struct Journal {
	frames: Vec<Frame>,
}

impl Journal {
	/// Newest buffered value of `key`, if any open checkpoint wrote it.
	fn pending(&self, key: &str) -> Option<Option<Vec<u8>>> {
		self.frames.iter().rev().find_map(|frame| frame.get(key).cloned())
	}
}

/// High-level storage service that provides typed, journaled operations.
///
/// Keys are formed as `namespace:id`. Values are stored as JSON.
///
/// While a checkpoint is open, writes are buffered in memory and never reach
/// the backend. Nested commits fold their writes into the enclosing
/// checkpoint; the outermost commit hands everything to the backend as one
/// batch. Reverting only drops buffered writes, so it cannot fail on backend
/// errors. The journal is shared by all callers of the service; callers are
/// expected to run at most one checkpointed unit of work at a time, which the
/// execution environment guarantees with its transaction lock.
///
/// `retrieve`, `load` and `exists` see buffered writes. The `*_committed`
/// reads skip them and wait for an in-flight flush, so they observe only
/// state that a finished outermost commit made durable.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Arc<RwLock<Box<dyn StorageInterface>>>,
	journal: Mutex<Journal>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self {
			backend: Arc::new(RwLock::new(backend)),
			journal: Mutex::new(Journal::default()),
		}
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	fn journal(&self) -> MutexGuard<'_, Journal> {
		self.journal.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
		serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Stores a serializable value, replacing any previous value.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.write(Self::key(namespace, id), Some(bytes)).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let key = Self::key(namespace, id);
		let pending = self.journal().pending(&key);
		let bytes = match pending {
			Some(Some(bytes)) => bytes,
			Some(None) => return Err(StorageError::NotFound),
			None => self.backend.read().await.get_bytes(&key).await?,
		};
		Self::decode(&bytes)
	}

	/// Retrieves a value, mapping a missing key to `None`.
	pub async fn load<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.write(Self::key(namespace, id), None).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		let key = Self::key(namespace, id);
		let pending = self.journal().pending(&key);
		match pending {
			Some(value) => Ok(value.is_some()),
			None => self.backend.read().await.exists(&key).await,
		}
	}

	/// Like [`load`](Self::load), ignoring writes of open checkpoints.
	pub async fn load_committed<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		let key = Self::key(namespace, id);
		match self.backend.read().await.get_bytes(&key).await {
			Ok(bytes) => Self::decode(&bytes).map(Some),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Like [`exists`](Self::exists), ignoring writes of open checkpoints.
	pub async fn exists_committed(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend
			.read()
			.await
			.exists(&Self::key(namespace, id))
			.await
	}

	/// Opens a new (possibly nested) checkpoint.
	pub async fn checkpoint(&self) -> Checkpoint {
		let mut journal = self.journal();
		journal.frames.push(Frame::new());
		Checkpoint {
			depth: journal.frames.len(),
		}
	}

	/// Number of checkpoints currently open.
	pub async fn depth(&self) -> usize {
		self.journal().frames.len()
	}

	/// Closes `checkpoint`, keeping every write made since it was taken.
	///
	/// Writes stay revertible by enclosing checkpoints. Once the outermost
	/// checkpoint commits they are written to the backend.
	pub async fn commit(&self, checkpoint: Checkpoint) -> Result<(), StorageError> {
		self.commit_then(checkpoint, || {}).await
	}

	/// Commits like [`commit`](Self::commit) and, for the outermost
	/// checkpoint, runs `then` once the backend accepted the writes.
	///
	/// The flush runs on its own task. Dropping the returned future does not
	/// interrupt it, nor `then`. On a backend error the checkpoint is closed
	/// anyway, its writes are lost and `then` is not run.
	pub async fn commit_then<F>(&self, checkpoint: Checkpoint, then: F) -> Result<(), StorageError>
	where
		F: FnOnce() + Send + 'static,
	{
		let writes = {
			let mut journal = self.journal();
			Self::check_innermost(&journal, &checkpoint)?;
			let frame = journal.frames.pop().unwrap_or_default();
			match journal.frames.last_mut() {
				Some(parent) => {
					parent.extend(frame);
					return Ok(());
				},
				None => frame,
			}
		};

		let keys = writes.len();
		let backend = Arc::clone(&self.backend);
		let flush = tokio::spawn(async move {
			if !writes.is_empty() {
				backend.write().await.apply(writes.into_iter().collect()).await?;
			}
			then();
			Ok::<(), StorageError>(())
		});
		flush
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
			.inspect_err(|e| tracing::error!(keys, error = %e, "Failed to flush checkpoint"))?;

		tracing::debug!(keys, "Flushed outermost checkpoint");
		Ok(())
	}

	/// Closes `checkpoint`, undoing every write made since it was taken.
	pub async fn revert(&self, checkpoint: Checkpoint) -> Result<(), StorageError> {
		let mut journal = self.journal();
		Self::check_innermost(&journal, &checkpoint)?;
		let undone = journal.frames.pop().map(|frame| frame.len()).unwrap_or_default();

		tracing::debug!(depth = checkpoint.depth, undone, "Reverted checkpoint");
		Ok(())
	}

	/// Drops `checkpoint` and every checkpoint nested in it, whatever their
	/// order. Used when the owner of a checkpoint goes away without closing it.
	pub fn discard(&self, checkpoint: Checkpoint) {
		let mut journal = self.journal();
		let open = journal.frames.len();
		journal.frames.truncate(checkpoint.depth.saturating_sub(1));
		if open >= checkpoint.depth {
			tracing::debug!(depth = checkpoint.depth, open, "Discarded checkpoint");
		}
	}

	fn check_innermost(journal: &Journal, checkpoint: &Checkpoint) -> Result<(), StorageError> {
		if checkpoint.depth != journal.frames.len() {
			return Err(StorageError::Checkpoint(format!(
				"checkpoint at depth {} is not the innermost open checkpoint (open: {})",
				checkpoint.depth,
				journal.frames.len()
			)));
		}
		Ok(())
	}

	async fn write(&self, key: String, value: Option<Vec<u8>>) -> Result<(), StorageError> {
		{
			let mut journal = self.journal();
			if let Some(frame) = journal.frames.last_mut() {
				frame.insert(key, value);
				return Ok(());
			}
		}

		let backend = self.backend.write().await;
		match value {
			Some(bytes) => backend.set_bytes(&key, bytes).await,
			None => backend.delete(&key).await,
		}
	}
}
