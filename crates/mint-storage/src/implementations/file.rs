//! File-based storage backend.
//!
//! Each key is stored as one file under a base directory. Writes go to a
//! temporary file that is renamed into place, so a crash never leaves a
//! half-written value behind. A batch is first recorded in a pending log and
//! replayed from it if the process stops halfway, so a committed transaction
//! lands on disk completely or not at all. This is the backend to use when
//! consumed digests must survive restarts of the service.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use mint_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::OnceCell;

/// Default directory used when `storage_path` is not configured.
const DEFAULT_STORAGE_PATH: &str = "./data/storage";

/// Pending batch log. Key files always end in `.json`, so it cannot collide.
const PENDING_BATCH_FILE: &str = "pending.batch";

/// One write of a pending batch.
#[derive(Debug, Serialize, Deserialize)]
struct BatchWrite {
	key: String,
	value: Option<Vec<u8>>,
}

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// Set once an interrupted batch, if any, was replayed.
	recovered: OnceCell<()>,
}

impl FileStorage {
	/// Creates a new FileStorage rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			recovered: OnceCell::new(),
		}
	}

	/// Converts a storage key to a filesystem-safe file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{}.json", safe_key))
	}

	fn batch_path(&self) -> PathBuf {
		self.base_path.join(PENDING_BATCH_FILE)
	}

	/// Finishes a batch left behind by a previous process.
	async fn recover(&self) -> Result<(), StorageError> {
		self.recovered
			.get_or_try_init(|| async {
				let bytes = match fs::read(self.batch_path()).await {
					Ok(bytes) => bytes,
					Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
					Err(e) => return Err(StorageError::Backend(e.to_string())),
				};
				let batch: Vec<BatchWrite> = serde_json::from_slice(&bytes)
					.map_err(|e| StorageError::Serialization(e.to_string()))?;

				tracing::warn!(
					writes = batch.len(),
					path = %self.base_path.display(),
					"Replaying interrupted storage batch"
				);
				self.replay(batch).await
			})
			.await
			.map(|_| ())
	}

	/// Applies a logged batch, then drops the log.
	async fn replay(&self, batch: Vec<BatchWrite>) -> Result<(), StorageError> {
		for write in batch {
			let path = self.get_file_path(&write.key);
			match write.value {
				Some(bytes) => write_atomic(&path, bytes).await?,
				None => remove_if_present(&path).await?,
			}
		}
		remove_if_present(&self.batch_path()).await
	}
}

async fn write_atomic(path: &Path, value: Vec<u8>) -> Result<(), StorageError> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
	}

	let temp_path = path.with_extension("tmp");
	fs::write(&temp_path, value)
		.await
		.map_err(|e| StorageError::Backend(e.to_string()))?;
	fs::rename(&temp_path, path)
		.await
		.map_err(|e| StorageError::Backend(e.to_string()))
}

async fn remove_if_present(path: &Path) -> Result<(), StorageError> {
	match fs::remove_file(path).await {
		Ok(_) => Ok(()),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(StorageError::Backend(e.to_string())),
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.recover().await?;
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.recover().await?;
		write_atomic(&self.get_file_path(key), value).await
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		self.recover().await?;
		remove_if_present(&self.get_file_path(key)).await
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		self.recover().await?;
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn apply(&self, writes: Vec<(String, Option<Vec<u8>>)>) -> Result<(), StorageError> {
		self.recover().await?;
		let batch: Vec<BatchWrite> = writes
			.into_iter()
			.map(|(key, value)| BatchWrite { key, value })
			.collect();
		let log =
			serde_json::to_vec(&batch).map_err(|e| StorageError::Serialization(e.to_string()))?;

		// Once the log is in place the batch counts as written
		write_atomic(&self.batch_path(), log).await?;
		self.replay(batch).await
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|v| {
					match v.as_str() {
						Some("") => Err("storage_path cannot be empty".to_string()),
						_ => Ok(()),
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	tracing::debug!("File storage rooted at {}", storage_path);
	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl mint_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::StorageService;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_values_survive_a_new_instance() {
		let dir = TempDir::new().unwrap();
		let key = "consumed_digests@0xe7f1725e7734ce288f8367e1bb143e90bb3f0512:0x01";

		let first = FileStorage::new(dir.path().to_path_buf());
		first.set_bytes(key, b"true".to_vec()).await.unwrap();

		let second = FileStorage::new(dir.path().to_path_buf());
		assert!(second.exists(key).await.unwrap());
		assert_eq!(second.get_bytes(key).await.unwrap(), b"true".to_vec());
	}

	#[tokio::test]
	async fn test_missing_and_delete() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().join("nested"));

		assert!(matches!(
			storage.get_bytes("balances:alice").await,
			Err(StorageError::NotFound)
		));
		assert!(!storage.exists("balances:alice").await.unwrap());

		storage.set_bytes("balances:alice", b"1".to_vec()).await.unwrap();
		storage.delete("balances:alice").await.unwrap();
		storage.delete("balances:alice").await.unwrap();
		assert!(!storage.exists("balances:alice").await.unwrap());
	}

	#[tokio::test]
	async fn test_revert_through_file_backend() {
		let dir = TempDir::new().unwrap();
		let config: toml::Value = toml::from_str(&format!(
			"storage_path = {:?}",
			dir.path().to_string_lossy()
		))
		.unwrap();
		let service = StorageService::new(create_storage(&config).unwrap());

		let cp = service.checkpoint().await;
		service.store("consumed_digests", "0xaa", &true).await.unwrap();
		service.revert(cp).await.unwrap();

		assert!(!service.exists("consumed_digests", "0xaa").await.unwrap());
	}

	#[tokio::test]
	async fn test_outermost_commit_lands_on_disk_as_one_batch() {
		let dir = TempDir::new().unwrap();
		let service = StorageService::new(Box::new(FileStorage::new(dir.path().to_path_buf())));
		let observer = FileStorage::new(dir.path().to_path_buf());

		let cp = service.checkpoint().await;
		service.store("supply", "total", &5u64).await.unwrap();
		service.store("balances", "alice", &5u64).await.unwrap();
		assert!(!observer.exists("supply:total").await.unwrap());

		service.commit(cp).await.unwrap();
		assert_eq!(observer.get_bytes("supply:total").await.unwrap(), b"5".to_vec());
		assert_eq!(observer.get_bytes("balances:alice").await.unwrap(), b"5".to_vec());
		assert!(!dir.path().join(PENDING_BATCH_FILE).exists());
	}

	#[tokio::test]
	async fn test_interrupted_batch_is_replayed_on_open() {
		let dir = TempDir::new().unwrap();
		let before = FileStorage::new(dir.path().to_path_buf());
		before.set_bytes("balances:bob", b"9".to_vec()).await.unwrap();

		// State left by a process that stopped right after logging its batch
		let batch = vec![
			BatchWrite {
				key: "supply:total".into(),
				value: Some(b"1".to_vec()),
			},
			BatchWrite {
				key: "balances:bob".into(),
				value: None,
			},
		];
		std::fs::write(
			dir.path().join(PENDING_BATCH_FILE),
			serde_json::to_vec(&batch).unwrap(),
		)
		.unwrap();

		let after = FileStorage::new(dir.path().to_path_buf());
		assert_eq!(after.get_bytes("supply:total").await.unwrap(), b"1".to_vec());
		assert!(!after.exists("balances:bob").await.unwrap());
		assert!(!dir.path().join(PENDING_BATCH_FILE).exists());
	}

	#[test]
	fn test_schema_rejects_empty_path() {
		let config: toml::Value = toml::from_str(r#"storage_path = """#).unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));
	}
}
