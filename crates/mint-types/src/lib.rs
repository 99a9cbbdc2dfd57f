//! Common types module for the signature-mint protocol.
//!
//! This module defines the core data types and structures shared by the
//! protocol, the token collaborator, the storage layer and the service binary.
//! It provides a centralized location for shared types to ensure consistency
//! across all components.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Call context passed along contract invocations.
pub mod context;
/// Audit and ledger event types.
pub mod events;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secure string wrapper for private keys.
pub mod secret_string;
/// Storage types for managing persistent data.
pub mod storage;
/// Utility functions: EIP-712 encoding, formatting.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use alloy_primitives::{Address, B256, U256};

pub use api::*;
pub use context::CallContext;
pub use events::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use storage::StorageKey;
pub use utils::{decode_hex, truncate_id, with_0x_prefix, without_0x_prefix};
pub use validation::*;
