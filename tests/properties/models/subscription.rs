use crate::properties::strategies::{subscription_ops_strategy, SubscriptionOp};

use address_watcher::models::{Address, Recipient, SubscriptionStore};
use proptest::{prelude::*, test_runner::Config};
use std::collections::{BTreeMap, BTreeSet};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	// The store behaves like a map of non-empty recipient sets
	#[test]
	fn test_store_matches_set_model(ops in subscription_ops_strategy()) {
		let mut store = SubscriptionStore::new();
		let mut model: BTreeMap<Address, BTreeSet<Recipient>> = BTreeMap::new();

		for op in ops {
			match op {
				SubscriptionOp::Subscribe(address, recipient) => {
					let expected = model
						.entry(address.clone())
						.or_default()
						.insert(recipient.clone());
					prop_assert_eq!(store.subscribe(address, recipient), expected);
				}
				SubscriptionOp::Unsubscribe(address, recipient) => {
					let expected = match model.get_mut(&address) {
						Some(recipients) => {
							let removed = recipients.remove(&recipient);
							if recipients.is_empty() {
								model.remove(&address);
							}
							removed
						}
						None => false,
					};
					prop_assert_eq!(store.unsubscribe(&address, &recipient), expected);
				}
			}

			prop_assert_eq!(store.addresses(), model.keys().cloned().collect::<Vec<_>>());
			for (address, recipients) in &model {
				prop_assert_eq!(
					store.recipients(address),
					recipients.iter().cloned().collect::<Vec<_>>()
				);
			}
		}
	}

	// No address is ever kept with an empty recipient set
	#[test]
	fn test_no_empty_recipient_sets(ops in subscription_ops_strategy()) {
		let mut store = SubscriptionStore::new();
		for op in ops {
			match op {
				SubscriptionOp::Subscribe(address, recipient) => {
					store.subscribe(address, recipient);
				}
				SubscriptionOp::Unsubscribe(address, recipient) => {
					store.unsubscribe(&address, &recipient);
				}
			}
			prop_assert!(store.iter().all(|(_, recipients)| !recipients.is_empty()));
			prop_assert_eq!(store.address_count(), store.addresses().len());
		}
	}

	// Subscribing twice changes nothing the second time
	#[test]
	fn test_subscribe_is_idempotent(ops in subscription_ops_strategy()) {
		let mut store = SubscriptionStore::new();
		for op in ops {
			if let SubscriptionOp::Subscribe(address, recipient) = op {
				store.subscribe(address.clone(), recipient.clone());
				let snapshot = store.clone();
				prop_assert!(!store.subscribe(address, recipient));
				prop_assert_eq!(&store, &snapshot);
			}
		}
	}
}
