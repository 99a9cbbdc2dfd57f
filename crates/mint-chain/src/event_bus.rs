//! Broadcast channel for committed events.
//!
//! The chain publishes every event of a committed transaction here, in
//! emission order. Subscribers that fall behind the channel capacity miss
//! events rather than slowing down transactions.

use mint_types::MintEvent;
use tokio::sync::broadcast;

/// Cloneable handle to the event channel.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<MintEvent>,
}

impl EventBus {
	/// Creates a bus buffering up to `capacity` events per subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Registers a new subscriber. Only events published afterwards are received.
	pub fn subscribe(&self) -> broadcast::Receiver<MintEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	pub fn publish(&self, event: MintEvent) {
		// No subscribers is not an error
		let _ = self.sender.send(event);
	}

	/// Number of live subscribers.
	pub fn subscriber_count(&self) -> usize {
		self.sender.receiver_count()
	}
}
