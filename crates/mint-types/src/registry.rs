//! Registry trait for self-registering implementations.
//!
//! Pluggable backends (storage, accounts) declare the name under which they
//! are referenced in configuration together with the factory that builds them.

/// Base trait for implementation registries.
///
/// Each implementation module provides a `Registry` struct implementing this
/// trait, for example:
/// - "memory" for `storage.implementations.memory`
/// - "file" for `storage.implementations.file`
/// - "local" for `account.implementations.local`
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
