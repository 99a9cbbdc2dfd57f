//! Core of the signature-mint protocol.
//!
//! An authorized signer signs EIP-712 `MintRequest(address minter,uint256 amount)`
//! messages off-chain. Anyone can submit such a message to the [`Protocol`],
//! which verifies it against the signer, makes sure it was never used before
//! and mints through the token it was deployed with.
//!
//! - [`domain`] computes the domain separator of a protocol instance
//! - [`digest`] builds the digest a signer signs
//! - [`verifier`] recovers and checks signers
//! - [`replay`] tracks consumed digests
//! - [`protocol`] orchestrates a mint
//! - [`issuer`] signs authorizations through a configured account
//! - [`builder`] and [`engine`] assemble a deployment from configuration

pub mod builder;
pub mod digest;
pub mod domain;
pub mod engine;
pub mod issuer;
pub mod protocol;
pub mod replay;
pub mod verifier;

pub use builder::{BuilderError, MintBuilder, MintFactories};
pub use digest::MintRequest;
pub use domain::TypedDataDomain;
pub use engine::MintEngine;
pub use issuer::{AuthorizationIssuer, SignedAuthorization};
pub use protocol::{MintReceipt, Protocol, ProtocolError};
pub use replay::ReplayGuard;
pub use verifier::{recover_signer, RecoveryError, SignatureVerifier};
