use address_watcher::{
	bootstrap::{create_watcher_service, initialize_registry, initialize_services},
	models::{Address, TransactionId},
	repositories::{FileSubscriptionRepository, RepositoryError},
	services::watcher::{FileLastSeenStorage, LastSeenStorage, VolatileLastSeenStorage},
	utils::tests::builders::{
		subscriptions::SubscriptionStoreBuilder, watch_config::WatchConfigBuilder,
	},
};
use mockito::Server;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;

use crate::integration::mocks::MockSubscriptionRepository;

fn addr(s: &str) -> Address {
	Address::new(s).unwrap()
}

#[tokio::test]
async fn test_unreadable_store_aborts_startup() {
	let mut repository = MockSubscriptionRepository::new();
	repository.expect_load().times(1).returning(|| {
		Err(RepositoryError::load_error(
			"Subscription file is malformed",
			None,
			None,
		))
	});
	repository.expect_save().never();

	let result = initialize_services(
		WatchConfigBuilder::new().build(),
		repository,
		VolatileLastSeenStorage,
	)
	.await;

	assert!(result.is_err());
}

#[tokio::test]
async fn test_corrupt_store_file_aborts_startup() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("subscriptions.json");
	std::fs::write(&path, "{ not json").unwrap();

	let result =
		initialize_registry(FileSubscriptionRepository::new(&path), VolatileLastSeenStorage).await;

	assert!(result.is_err());
	// The corrupt file is left for the operator to inspect
	assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[tokio::test]
async fn test_missing_store_file_starts_empty() {
	let dir = TempDir::new().unwrap();
	let registry = initialize_registry(
		FileSubscriptionRepository::new(dir.path().join("subscriptions.json")),
		VolatileLastSeenStorage,
	)
	.await
	.unwrap();

	assert!(registry.subscribed_addresses().await.is_empty());
}

#[tokio::test]
async fn test_stale_last_seen_entries_are_dropped_at_startup() {
	let dir = TempDir::new().unwrap();
	let subscriptions_path = dir.path().join("subscriptions.json");
	let last_seen_path = dir.path().join("last_seen.json");

	let store = SubscriptionStoreBuilder::new().subscribe("GABC", "42").build();
	std::fs::write(&subscriptions_path, serde_json::to_string(&store).unwrap()).unwrap();
	std::fs::write(&last_seen_path, r#"{"GABC": "tx1", "GGONE": "tx5"}"#).unwrap();

	let registry = initialize_registry(
		FileSubscriptionRepository::new(&subscriptions_path),
		FileLastSeenStorage::new(&last_seen_path),
	)
	.await
	.unwrap();

	assert_eq!(
		registry.last_seen(&addr("GABC")).await,
		Some(Some(TransactionId::new("tx1")))
	);
	assert!(registry.last_seen(&addr("GGONE")).await.is_none());

	let entries = FileLastSeenStorage::new(&last_seen_path).load().await.unwrap();
	assert!(!entries.contains_key(&addr("GGONE")));
}

#[tokio::test]
async fn test_wired_watcher_polls_the_configured_gateway() {
	let mut server = Server::new_async().await;
	let summary = server
		.mock("GET", "/address/GABC")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(json!({ "last_transaction_id": "tx1" }).to_string())
		.expect(1)
		.create_async()
		.await;

	let dir = TempDir::new().unwrap();
	let subscriptions_path = dir.path().join("subscriptions.json");
	let store = SubscriptionStoreBuilder::new().subscribe("GABC", "42").build();
	std::fs::write(&subscriptions_path, serde_json::to_string(&store).unwrap()).unwrap();

	let config = WatchConfigBuilder::new()
		.gateway_base_url(&server.url())
		.poll_timeout(Duration::from_secs(2))
		.subscriptions_path(&subscriptions_path)
		.build();
	let repository = FileSubscriptionRepository::new(&subscriptions_path);
	let services = initialize_services(config, repository, VolatileLastSeenStorage)
		.await
		.unwrap();
	let watcher = create_watcher_service(&services);

	let reports = watcher.run_once().await;

	assert_eq!(reports.len(), 1);
	assert_eq!(reports[0].result, "found");
	assert_eq!(
		services.registry.last_seen(&addr("GABC")).await,
		Some(Some(TransactionId::new("tx1")))
	);
	summary.assert_async().await;
}
