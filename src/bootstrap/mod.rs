//! Bootstrap module for initializing services and creating the watcher.
//!
//! Startup order matters: the subscription store is loaded first and a store that cannot
//! be loaded aborts startup. Persisted LastSeen entries are restored only for addresses
//! that are still subscribed.
//!
//! # Services
//! - `HttpGatewayClient`: Ledger query gateway access
//! - `NotificationService`: Delivery over the configured channel
//! - `WatchRegistry`: Subscriptions and LastSeen state

use std::{error::Error, sync::Arc};
use tracing::info;

use crate::{
	models::WatchConfig,
	repositories::{FileSubscriptionRepository, SubscriptionRepositoryTrait},
	services::{
		gateway::{HttpGatewayClient, LedgerGateway},
		notification::{NotificationService, Notifier},
		watcher::{AddressWatcherService, LastSeenStorage, WatchRegistry, WatchSettings},
	},
	utils::RetryConfig,
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Everything the watcher needs, built from one configuration
pub struct WatcherServices<G, N, R, S>
where
	G: LedgerGateway,
	N: Notifier,
	R: SubscriptionRepositoryTrait,
	S: LastSeenStorage,
{
	pub config: WatchConfig,
	pub gateway: Arc<G>,
	pub notifier: Arc<N>,
	pub registry: Arc<WatchRegistry<R, S>>,
}

/// Services wired to the HTTP gateway and the configured notification channel
pub type DefaultWatcherServices<R, S> =
	WatcherServices<HttpGatewayClient, NotificationService, R, S>;

/// Creates the file repository for the configured subscription path
pub fn subscription_repository(config: &WatchConfig) -> FileSubscriptionRepository {
	FileSubscriptionRepository::new(&config.subscriptions_path)
}

/// Loads the subscriptions and restores LastSeen into a new registry.
///
/// # Errors
/// Returns an error if the subscription store or the LastSeen file cannot be loaded
pub async fn initialize_registry<R, S>(
	repository: R,
	last_seen_storage: S,
) -> Result<Arc<WatchRegistry<R, S>>>
where
	R: SubscriptionRepositoryTrait,
	S: LastSeenStorage,
{
	let subscriptions = repository.load().await?;
	info!(
		addresses = subscriptions.address_count(),
		subscriptions = subscriptions.subscription_count(),
		"Loaded subscriptions"
	);

	let entries = last_seen_storage.load().await?;
	let registry = Arc::new(WatchRegistry::new(
		subscriptions,
		Arc::new(repository),
		Arc::new(last_seen_storage),
	));
	registry.seed_last_seen(entries).await;

	Ok(registry)
}

/// Initializes all required services for the address watcher.
///
/// # Errors
/// Returns an error if the stores cannot be loaded or an outbound client cannot be built
pub async fn initialize_services<R, S>(
	config: WatchConfig,
	repository: R,
	last_seen_storage: S,
) -> Result<DefaultWatcherServices<R, S>>
where
	R: SubscriptionRepositoryTrait,
	S: LastSeenStorage,
{
	let registry = initialize_registry(repository, last_seen_storage).await?;

	let retry_policy = RetryConfig::default();
	let gateway = HttpGatewayClient::new(
		config.gateway_base_url.clone(),
		&retry_policy,
		config.poll_timeout,
	)?;
	let notifier = NotificationService::from_config(
		&config.notifier,
		&retry_policy,
		config.poll_timeout,
	)?;
	info!(notifier = notifier.kind(), "Notification channel configured");

	Ok(WatcherServices {
		config,
		gateway: Arc::new(gateway),
		notifier: Arc::new(notifier),
		registry,
	})
}

/// Creates the watcher service from initialized services
pub fn create_watcher_service<G, N, R, S>(
	services: &WatcherServices<G, N, R, S>,
) -> AddressWatcherService<G, N, R, S>
where
	G: LedgerGateway,
	N: Notifier,
	R: SubscriptionRepositoryTrait,
	S: LastSeenStorage,
{
	AddressWatcherService::new(
		services.gateway.clone(),
		services.notifier.clone(),
		services.registry.clone(),
		WatchSettings::from(&services.config),
	)
}
