//! Call context for contract invocations.
//!
//! Every entry point of the protocol and of the token receives a
//! [`CallContext`] describing who is calling and how deep the call stack is.
//! Contracts that call other contracts derive a nested context with
//! [`CallContext::nested`], so the callee observes the calling contract as its
//! sender, the same way `msg.sender` behaves on an EVM chain.

use alloy_primitives::Address;

/// Maximum nesting depth accepted before a call is rejected.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Identifies the immediate caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
	/// Immediate caller of the current frame.
	pub sender: Address,
	/// Account that signed the outermost transaction.
	pub origin: Address,
	/// Number of frames above this one. Zero for a top-level transaction.
	pub depth: usize,
}

impl CallContext {
	/// Context for a top-level transaction submitted by `sender`.
	pub fn external(sender: Address) -> Self {
		Self {
			sender,
			origin: sender,
			depth: 0,
		}
	}

	/// Context for a call made by the contract at `caller` from within this frame.
	pub fn nested(&self, caller: Address) -> Self {
		Self {
			sender: caller,
			origin: self.origin,
			depth: self.depth + 1,
		}
	}

	/// Returns true if this frame was entered from another contract.
	pub fn is_nested(&self) -> bool {
		self.depth > 0
	}

	/// Returns true once the call stack has reached [`MAX_CALL_DEPTH`].
	pub fn depth_exceeded(&self) -> bool {
		self.depth >= MAX_CALL_DEPTH
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_nested_context_tracks_sender_and_origin() {
		let user = Address::repeat_byte(0x11);
		let contract = Address::repeat_byte(0x22);

		let outer = CallContext::external(user);
		assert!(!outer.is_nested());

		let inner = outer.nested(contract);
		assert_eq!(inner.sender, contract);
		assert_eq!(inner.origin, user);
		assert_eq!(inner.depth, 1);
		assert!(inner.is_nested());
	}
}
