//! Execution environment for the signature-mint contracts.
//!
//! Contracts are plain Rust values that share one [`Chain`]. The chain hands
//! out deployment addresses, keeps a registry of deployed code, stores
//! contract state with nested rollback and collects emitted events until the
//! enclosing transaction commits.

pub mod chain;
pub mod contract;
pub mod event_bus;

pub use chain::{Chain, ChainError, Snapshot, Transaction};
pub use contract::{Contract, MintReceiver, Mintable, TokenError};
pub use event_bus::EventBus;
