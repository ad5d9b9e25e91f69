//! Test helper utilities for subscription stores
//!
//! - `SubscriptionStoreBuilder`: Builder for creating test SubscriptionStore instances

use crate::models::{Address, Recipient, SubscriptionStore};

/// Builder for creating test SubscriptionStore instances
#[derive(Default)]
pub struct SubscriptionStoreBuilder {
	store: SubscriptionStore,
}

impl SubscriptionStoreBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(mut self, address: &str, recipient: &str) -> Self {
		self.store.subscribe(
			Address::new(address).unwrap(),
			Recipient::new(recipient).unwrap(),
		);
		self
	}

	pub fn build(self) -> SubscriptionStore {
		self.store
	}
}
