//! Token contracts used with the signature-mint protocol.
//!
//! [`SignatureMintToken`] is the ledger the protocol mints into. It accepts
//! mint calls from a single protocol address that its owner configures.
//! [`PlainToken`] is a contract without a mint entry point.

pub mod ownable;
pub mod plain;
pub mod token;

pub use ownable::{AccessError, Ownable};
pub use plain::PlainToken;
pub use token::SignatureMintToken;
