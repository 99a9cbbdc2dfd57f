//! Event types emitted by the protocol and the token.
//!
//! Events are collected per transaction by the execution environment and only
//! become visible once the transaction commits. A reverted transaction never
//! publishes the events its frames emitted. Committed events flow through the
//! event bus so that other components can react to them.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all emitted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintEvent {
	/// Events from the signature-mint protocol.
	Protocol(ProtocolEvent),
	/// Events from a token contract.
	Token(TokenEvent),
}

/// Events emitted by the protocol contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolEvent {
	/// A protocol instance finished construction and is active.
	Deployed {
		protocol: Address,
		signer: Address,
		token: Address,
		domain_separator: B256,
	},
	/// Audit record for a successful signature mint.
	SignatureMint {
		protocol: Address,
		caller: Address,
		recipient: Address,
		amount: U256,
	},
}

/// Events emitted by a token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEvent {
	/// Balance movement. Mints are transfers from the zero address.
	Transfer {
		token: Address,
		from: Address,
		to: Address,
		amount: U256,
	},
	/// The address allowed to mint was replaced by the owner.
	ProtocolChanged {
		token: Address,
		previous: Address,
		new: Address,
	},
	/// Ownership of an access-controlled contract changed.
	OwnershipTransferred {
		contract: Address,
		previous: Address,
		new: Address,
	},
}

impl MintEvent {
	/// Address of the contract that emitted this event.
	pub fn emitter(&self) -> Address {
		match self {
			MintEvent::Protocol(ProtocolEvent::Deployed { protocol, .. })
			| MintEvent::Protocol(ProtocolEvent::SignatureMint { protocol, .. }) => *protocol,
			MintEvent::Token(TokenEvent::Transfer { token, .. })
			| MintEvent::Token(TokenEvent::ProtocolChanged { token, .. }) => *token,
			MintEvent::Token(TokenEvent::OwnershipTransferred { contract, .. }) => *contract,
		}
	}
}
