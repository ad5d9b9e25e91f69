//! Address watcher service.
//!
//! Drives the periodic polling of every subscribed address. Each tick snapshots the
//! subscribed addresses and spawns one independent evaluation task per address that is
//! not already being polled. A task polls the gateway, applies the result to the watch
//! state and, on a change, notifies every recipient of the address.

use futures::future::join_all;
use std::{
	collections::HashSet,
	sync::{Arc, Mutex as StdMutex},
	time::Duration,
};
use tokio::{
	sync::{watch, Semaphore},
	task::{JoinError, JoinSet},
	time::{interval, timeout, MissedTickBehavior},
};
use tracing::{debug, info, instrument, warn};

use crate::{
	models::{Address, NotificationMessage, PollResult, Recipient, TransactionId, WatchConfig},
	repositories::SubscriptionRepositoryTrait,
	services::{
		gateway::LedgerGateway,
		notification::{
			template_formatter::{change_variables, render_message},
			Notifier,
		},
		watcher::{
			detector::Outcome, error::WatcherError, state::WatchRegistry, storage::LastSeenStorage,
		},
	},
	utils::{
		constants::{
			DEFAULT_MAX_CONCURRENT_POLLS, DEFAULT_NOTIFICATION_BODY, DEFAULT_NOTIFICATION_TITLE,
			DEFAULT_POLL_INTERVAL_SECONDS, DEFAULT_POLL_TIMEOUT_SECONDS,
			DEFAULT_SHUTDOWN_GRACE_SECONDS,
		},
		metrics::{
			BASELINES_ESTABLISHED, CHANGES_DETECTED, NOTIFICATIONS_TOTAL, POLLS_SKIPPED,
			POLLS_TOTAL,
		},
	},
};

/// Scheduling parameters of the watcher
#[derive(Debug, Clone)]
pub struct WatchSettings {
	pub poll_interval: Duration,
	pub poll_timeout: Duration,
	pub max_concurrent_polls: usize,
	pub shutdown_grace: Duration,
	pub message_template: NotificationMessage,
}

impl Default for WatchSettings {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
			poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECONDS),
			max_concurrent_polls: DEFAULT_MAX_CONCURRENT_POLLS,
			shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECONDS),
			message_template: NotificationMessage {
				title: DEFAULT_NOTIFICATION_TITLE.to_string(),
				body: DEFAULT_NOTIFICATION_BODY.to_string(),
			},
		}
	}
}

impl From<&WatchConfig> for WatchSettings {
	fn from(config: &WatchConfig) -> Self {
		Self {
			poll_interval: config.poll_interval,
			poll_timeout: config.poll_timeout,
			max_concurrent_polls: config.max_concurrent_polls,
			shutdown_grace: config.shutdown_grace,
			message_template: config.message_template.clone(),
		}
	}
}

/// What happened to one address during one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
	pub address: Address,
	/// Poll result label (`found`, `not_found`, `failed`)
	pub result: &'static str,
	/// `None` when the result was discarded because the address was unsubscribed
	pub outcome: Option<Outcome>,
	pub delivered: usize,
	pub failed: usize,
}

/// Counts of one tick's scheduling decisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
	pub spawned: usize,
	pub skipped: usize,
}

type InFlight = Arc<StdMutex<HashSet<Address>>>;

/// Marks an address as being polled until dropped
///
/// Dropped with its task, so an aborted or panicked poll still frees the address.
struct InFlightGuard {
	address: Address,
	in_flight: InFlight,
}

impl InFlightGuard {
	fn acquire(in_flight: &InFlight, address: &Address) -> Option<Self> {
		let mut set = in_flight.lock().unwrap_or_else(|e| e.into_inner());
		if !set.insert(address.clone()) {
			return None;
		}
		Some(Self {
			address: address.clone(),
			in_flight: in_flight.clone(),
		})
	}
}

impl Drop for InFlightGuard {
	fn drop(&mut self) {
		let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
		set.remove(&self.address);
	}
}

/// Service for polling subscribed addresses and notifying on new activity
pub struct AddressWatcherService<G, N, R, S>
where
	G: LedgerGateway,
	N: Notifier,
	R: SubscriptionRepositoryTrait,
	S: LastSeenStorage,
{
	gateway: Arc<G>,
	notifier: Arc<N>,
	registry: Arc<WatchRegistry<R, S>>,
	settings: Arc<WatchSettings>,
	permits: Arc<Semaphore>,
	in_flight: InFlight,
}

impl<G, N, R, S> Clone for AddressWatcherService<G, N, R, S>
where
	G: LedgerGateway,
	N: Notifier,
	R: SubscriptionRepositoryTrait,
	S: LastSeenStorage,
{
	fn clone(&self) -> Self {
		Self {
			gateway: self.gateway.clone(),
			notifier: self.notifier.clone(),
			registry: self.registry.clone(),
			settings: self.settings.clone(),
			permits: self.permits.clone(),
			in_flight: self.in_flight.clone(),
		}
	}
}

impl<G, N, R, S> AddressWatcherService<G, N, R, S>
where
	G: LedgerGateway,
	N: Notifier,
	R: SubscriptionRepositoryTrait,
	S: LastSeenStorage,
{
	/// Creates a new watcher service
	///
	/// # Arguments
	/// * `gateway` - Ledger query gateway shared by every poll
	/// * `notifier` - Delivery channel for change notifications
	/// * `registry` - Owner of the subscriptions and LastSeen state
	/// * `settings` - Scheduling parameters
	pub fn new(
		gateway: Arc<G>,
		notifier: Arc<N>,
		registry: Arc<WatchRegistry<R, S>>,
		settings: WatchSettings,
	) -> Self {
		let permits = Arc::new(Semaphore::new(
			settings.max_concurrent_polls.clamp(1, Semaphore::MAX_PERMITS),
		));
		Self {
			gateway,
			notifier,
			registry,
			settings: Arc::new(settings),
			permits,
			in_flight: Arc::new(StdMutex::new(HashSet::new())),
		}
	}

	pub fn registry(&self) -> &Arc<WatchRegistry<R, S>> {
		&self.registry
	}

	pub fn settings(&self) -> &WatchSettings {
		&self.settings
	}

	/// Number of addresses with a poll currently running
	pub fn in_flight(&self) -> usize {
		self.in_flight
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.len()
	}

	/// Runs ticks until `shutdown` turns true or its sender is dropped.
	///
	/// The first tick fires immediately. On shutdown, in-flight polls get the configured
	/// grace period to finish and are aborted afterwards.
	pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), WatcherError> {
		let mut ticker = interval(self.settings.poll_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
		let mut tasks = JoinSet::new();

		info!(
			interval = ?self.settings.poll_interval,
			max_concurrent_polls = self.settings.max_concurrent_polls,
			"Address watcher started"
		);

		if !*shutdown.borrow() {
			loop {
				tokio::select! {
					_ = ticker.tick() => {
						self.spawn_tick(&mut tasks).await;
					}
					Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
						Self::handle_joined(joined);
					}
					changed = shutdown.changed() => {
						if changed.is_err() || *shutdown.borrow() {
							break;
						}
					}
				}
			}
		}

		info!(in_flight = tasks.len(), "Address watcher stopping");
		let drained = timeout(self.settings.shutdown_grace, async {
			while let Some(joined) = tasks.join_next().await {
				Self::handle_joined(joined);
			}
		})
		.await;

		if drained.is_err() {
			warn!(
				aborted = tasks.len(),
				"Shutdown grace period elapsed, aborting in-flight polls"
			);
			tasks.abort_all();
			while tasks.join_next().await.is_some() {}
		}

		info!("Address watcher stopped");
		Ok(())
	}

	/// Runs a single tick and waits for all of its polls
	pub async fn run_once(&self) -> Vec<PollReport> {
		let mut tasks = JoinSet::new();
		self.spawn_tick(&mut tasks).await;

		let mut reports = Vec::with_capacity(tasks.len());
		while let Some(joined) = tasks.join_next().await {
			if let Some(report) = Self::handle_joined(joined) {
				reports.push(report);
			}
		}
		reports.sort_by(|a, b| a.address.cmp(&b.address));
		reports
	}

	/// Spawns one poll per subscribed address that is not already in flight
	#[instrument(skip_all)]
	pub async fn spawn_tick(&self, tasks: &mut JoinSet<PollReport>) -> TickSummary {
		let addresses = self.registry.subscribed_addresses().await;
		let mut summary = TickSummary::default();

		for address in addresses {
			let Some(guard) = InFlightGuard::acquire(&self.in_flight, &address) else {
				debug!(address = %address, "Previous poll still in flight, skipping");
				POLLS_SKIPPED.inc();
				summary.skipped += 1;
				continue;
			};

			let service = self.clone();
			tasks.spawn(async move {
				let _guard = guard;
				service.poll_address(address).await
			});
			summary.spawned += 1;
		}

		debug!(
			spawned = summary.spawned,
			skipped = summary.skipped,
			"Tick scheduled"
		);
		summary
	}

	fn handle_joined(joined: Result<PollReport, JoinError>) -> Option<PollReport> {
		match joined {
			Ok(report) => Some(report),
			Err(e) if e.is_cancelled() => None,
			Err(e) => {
				// Logged on creation; a panicked poll never stops the scheduler
				let _ =
					WatcherError::scheduler_error("Poll task panicked", Some(Box::new(e)), None);
				None
			}
		}
	}

	/// Polls `address` once and acts on the result
	#[instrument(skip_all, fields(address = %address))]
	pub async fn poll_address(&self, address: Address) -> PollReport {
		let poll = self.poll_gateway(&address).await;
		POLLS_TOTAL.with_label_values(&[poll.label()]).inc();

		match &poll {
			PollResult::Found(_) => {}
			PollResult::NotFound => debug!("Address not known to the gateway"),
			PollResult::Failed(reason) => warn!(reason = %reason, "Address poll failed"),
		}

		let mut report = PollReport {
			address: address.clone(),
			result: poll.label(),
			outcome: None,
			delivered: 0,
			failed: 0,
		};

		let Some(evaluation) = self.registry.apply_poll(&address, &poll).await else {
			debug!("Address unsubscribed while polling, discarding result");
			return report;
		};

		match &evaluation.outcome {
			Outcome::NoChange => {}
			Outcome::Baseline(observed) => {
				BASELINES_ESTABLISHED.inc();
				info!(
					transaction_id = observed.as_ref().map(|id| id.as_str()).unwrap_or(""),
					"Baseline established"
				);
				self.persist_last_seen(&address, observed.as_ref()).await;
			}
			Outcome::Changed { previous, current } => {
				CHANGES_DETECTED.inc();
				info!(
					transaction_id = %current,
					recipients = evaluation.recipients.len(),
					"New transaction detected"
				);
				self.persist_last_seen(&address, Some(current)).await;
				let (delivered, failed) = self
					.dispatch(&address, previous.as_ref(), current, &evaluation.recipients)
					.await;
				report.delivered = delivered;
				report.failed = failed;
			}
		}

		report.outcome = Some(evaluation.outcome);
		report
	}

	async fn poll_gateway(&self, address: &Address) -> PollResult {
		// Held only around the gateway call
		let _permit = match self.permits.acquire().await {
			Ok(permit) => permit,
			Err(e) => return PollResult::Failed(e.to_string()),
		};

		match timeout(self.settings.poll_timeout, self.gateway.poll(address)).await {
			Ok(poll) => poll,
			Err(_) => PollResult::Failed(format!(
				"Gateway call timed out after {:?}",
				self.settings.poll_timeout
			)),
		}
	}

	async fn persist_last_seen(&self, address: &Address, last_seen: Option<&TransactionId>) {
		if let Err(e) = self.registry.record_last_seen(address, last_seen).await {
			warn!(error = %e, "LastSeen kept in memory only");
		}
	}

	/// Notifies every recipient concurrently, returning (delivered, failed)
	async fn dispatch(
		&self,
		address: &Address,
		previous: Option<&TransactionId>,
		current: &TransactionId,
		recipients: &[Recipient],
	) -> (usize, usize) {
		let deliveries = recipients.iter().map(|recipient| async move {
			let variables = change_variables(address, previous, current, recipient);
			let message = render_message(&self.settings.message_template, &variables);
			(recipient, self.notifier.notify(recipient, &message).await)
		});

		let mut delivered = 0;
		let mut failed = 0;
		for (recipient, result) in join_all(deliveries).await {
			match result {
				Ok(()) => {
					NOTIFICATIONS_TOTAL.with_label_values(&["delivered"]).inc();
					delivered += 1;
				}
				Err(e) => {
					NOTIFICATIONS_TOTAL.with_label_values(&["failed"]).inc();
					warn!(recipient = %recipient, error = %e, "Failed to deliver notification");
					failed += 1;
				}
			}
		}
		(delivered, failed)
	}
}
