//! Shared watch state and the registry that owns it.
//!
//! [`WatchRegistry`] holds the subscription store and the change detector behind one
//! async mutex together with the handles used to persist them. Every operation takes
//! the lock for its own duration only; the detector comparison runs without any await
//! point while the lock is held.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
	models::{Address, PollResult, Recipient, SubscriptionStore, TransactionId},
	repositories::SubscriptionRepositoryTrait,
	services::watcher::{
		detector::{ChangeDetector, Outcome},
		error::WatcherError,
		storage::{LastSeenEntries, LastSeenStorage},
	},
	utils::metrics::update_subscription_metrics,
};

/// Subscriptions and LastSeen memory, always mutated together under one lock
#[derive(Debug, Default)]
pub struct WatchState {
	pub subscriptions: SubscriptionStore,
	pub detector: ChangeDetector,
}

/// Result of applying one poll to the watch state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
	pub outcome: Outcome,
	/// Recipients to notify; only populated for a change
	pub recipients: Vec<Recipient>,
}

/// Inbound subscription interface
///
/// Changes are visible to the scheduler from its next tick.
#[async_trait]
pub trait SubscriptionManager: Send + Sync + 'static {
	/// Adds `recipient` to `address`, returning whether anything changed
	async fn subscribe(&self, address: Address, recipient: Recipient) -> Result<bool, WatcherError>;

	/// Removes `recipient` from `address`, returning whether anything changed
	///
	/// Removing the last recipient removes the address together with its LastSeen entry.
	async fn unsubscribe(
		&self,
		address: &Address,
		recipient: &Recipient,
	) -> Result<bool, WatcherError>;

	/// Point-in-time copy of the subscription store
	async fn snapshot(&self) -> SubscriptionStore;
}

/// Owner of the watch state and its persistence handles
pub struct WatchRegistry<R: SubscriptionRepositoryTrait, S: LastSeenStorage> {
	state: Mutex<WatchState>,
	repository: Arc<R>,
	last_seen_storage: Arc<S>,
}

impl<R: SubscriptionRepositoryTrait, S: LastSeenStorage> WatchRegistry<R, S> {
	pub fn new(
		subscriptions: SubscriptionStore,
		repository: Arc<R>,
		last_seen_storage: Arc<S>,
	) -> Self {
		update_subscription_metrics(&subscriptions);
		Self {
			state: Mutex::new(WatchState {
				subscriptions,
				detector: ChangeDetector::new(),
			}),
			repository,
			last_seen_storage,
		}
	}

	/// Snapshot of every address with at least one recipient
	pub async fn subscribed_addresses(&self) -> Vec<Address> {
		self.state.lock().await.subscriptions.addresses()
	}

	pub async fn recipients(&self, address: &Address) -> Vec<Recipient> {
		self.state.lock().await.subscriptions.recipients(address)
	}

	/// Current LastSeen entry of `address`, `None` when unset
	pub async fn last_seen(&self, address: &Address) -> Option<Option<TransactionId>> {
		self.state.lock().await.detector.last_seen(address).cloned()
	}

	/// Restores persisted LastSeen entries.
	///
	/// Entries of addresses that are no longer subscribed are dropped from the storage
	/// instead of being restored. Returns the number of restored entries.
	pub async fn seed_last_seen(&self, entries: LastSeenEntries) -> usize {
		let (restored, stale) = {
			let mut state = self.state.lock().await;
			let (restored, stale): (HashMap<_, _>, HashMap<_, _>) = entries
				.into_iter()
				.partition(|(address, _)| state.subscriptions.contains(address));
			let count = restored.len();
			state.detector.seed(restored);
			(count, stale)
		};

		for address in stale.keys() {
			debug!(address = %address, "Dropping LastSeen entry of unsubscribed address");
			if let Err(e) = self.last_seen_storage.remove(address).await {
				warn!(address = %address, error = %e, "Failed to drop stale LastSeen entry");
			}
		}

		info!(restored, "Restored LastSeen entries");
		restored
	}

	/// Evaluates `poll` for `address` and applies the LastSeen update in one step.
	///
	/// Returns `None` when the address was unsubscribed while the poll was in flight; the
	/// result is then discarded without creating a LastSeen entry.
	pub async fn apply_poll(&self, address: &Address, poll: &PollResult) -> Option<Evaluation> {
		let mut state = self.state.lock().await;
		if !state.subscriptions.contains(address) {
			return None;
		}

		let outcome = state.detector.observe(address, poll);
		let recipients = if outcome.is_changed() {
			state.subscriptions.recipients(address)
		} else {
			Vec::new()
		};

		Some(Evaluation {
			outcome,
			recipients,
		})
	}

	/// Persists the LastSeen value of `address`.
	///
	/// The write happens under the state lock and only while the address is still
	/// subscribed, so it is ordered with the removal done by [`SubscriptionManager::unsubscribe`].
	/// Returns `false` when the address was unsubscribed and nothing was written.
	pub async fn record_last_seen(
		&self,
		address: &Address,
		last_seen: Option<&TransactionId>,
	) -> Result<bool, WatcherError> {
		let state = self.state.lock().await;
		if !state.subscriptions.contains(address) {
			debug!(address = %address, "Address unsubscribed, LastSeen not persisted");
			return Ok(false);
		}
		self.last_seen_storage.save(address, last_seen).await?;
		Ok(true)
	}

	fn subscription_metadata(
		address: &Address,
		recipient: &Recipient,
	) -> Option<HashMap<String, String>> {
		Some(HashMap::from([
			("address".to_string(), address.to_string()),
			("recipient".to_string(), recipient.to_string()),
		]))
	}
}

#[async_trait]
impl<R, S> SubscriptionManager for WatchRegistry<R, S>
where
	R: SubscriptionRepositoryTrait,
	S: LastSeenStorage,
{
	async fn subscribe(
		&self,
		address: Address,
		recipient: Recipient,
	) -> Result<bool, WatcherError> {
		let mut state = self.state.lock().await;
		if state.subscriptions.is_subscribed(&address, &recipient) {
			return Ok(false);
		}

		let mut updated = state.subscriptions.clone();
		updated.subscribe(address.clone(), recipient.clone());
		self.repository.save(&updated).await.map_err(|e| {
			WatcherError::subscription_error(
				"Failed to persist subscription",
				Some(Box::new(e)),
				Self::subscription_metadata(&address, &recipient),
			)
		})?;

		state.subscriptions = updated;
		update_subscription_metrics(&state.subscriptions);
		info!(address = %address, recipient = %recipient, "Subscribed");
		Ok(true)
	}

	async fn unsubscribe(
		&self,
		address: &Address,
		recipient: &Recipient,
	) -> Result<bool, WatcherError> {
		let mut state = self.state.lock().await;
		if !state.subscriptions.is_subscribed(address, recipient) {
			return Ok(false);
		}

		let mut updated = state.subscriptions.clone();
		updated.unsubscribe(address, recipient);
		self.repository.save(&updated).await.map_err(|e| {
			WatcherError::subscription_error(
				"Failed to persist unsubscription",
				Some(Box::new(e)),
				Self::subscription_metadata(address, recipient),
			)
		})?;

		let address_removed = !updated.contains(address);
		state.subscriptions = updated;
		update_subscription_metrics(&state.subscriptions);
		info!(address = %address, recipient = %recipient, "Unsubscribed");

		if address_removed {
			state.detector.forget(address);
			// Still under the lock so a concurrent record_last_seen cannot write it back
			if let Err(e) = self.last_seen_storage.remove(address).await {
				warn!(address = %address, error = %e, "Failed to remove LastSeen entry");
			}
		}
		Ok(true)
	}

	async fn snapshot(&self) -> SubscriptionStore {
		self.state.lock().await.subscriptions.clone()
	}
}
