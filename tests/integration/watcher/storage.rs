use address_watcher::{
	models::{Address, TransactionId},
	services::watcher::{FileLastSeenStorage, LastSeenStorage, WatcherError},
};
use tempfile::TempDir;

fn addr(s: &str) -> Address {
	Address::new(s).unwrap()
}

#[tokio::test]
async fn test_entries_survive_a_new_storage_instance() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("last_seen.json");

	let storage = FileLastSeenStorage::new(&path);
	storage
		.save(&addr("GABC"), Some(&TransactionId::new("tx1")))
		.await
		.unwrap();
	storage.save(&addr("GNEW"), None).await.unwrap();
	storage
		.save(&addr("GABC"), Some(&TransactionId::new("tx2")))
		.await
		.unwrap();

	let restarted = FileLastSeenStorage::new(&path);
	let entries = restarted.load().await.unwrap();

	assert_eq!(entries.len(), 2);
	assert_eq!(
		entries.get(&addr("GABC")),
		Some(&Some(TransactionId::new("tx2")))
	);
	// An address with no transactions yet keeps its empty baseline
	assert_eq!(entries.get(&addr("GNEW")), Some(&None));
}

#[tokio::test]
async fn test_remove_after_load_keeps_other_entries() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("last_seen.json");
	std::fs::write(&path, r#"{"GABC": "tx1", "GDEF": "tx9"}"#).unwrap();

	let storage = FileLastSeenStorage::new(&path);
	assert_eq!(storage.load().await.unwrap().len(), 2);

	storage.remove(&addr("GABC")).await.unwrap();

	let entries = FileLastSeenStorage::new(&path).load().await.unwrap();
	assert_eq!(entries.len(), 1);
	assert!(entries.contains_key(&addr("GDEF")));
}

#[tokio::test]
async fn test_file_is_valid_json_after_every_write() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("last_seen.json");
	let storage = FileLastSeenStorage::new(&path);

	for i in 0..5 {
		storage
			.save(&addr("GABC"), Some(&TransactionId::new(format!("tx{}", i))))
			.await
			.unwrap();
		let content = std::fs::read_to_string(&path).unwrap();
		let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
		assert_eq!(parsed["GABC"], format!("tx{}", i));
	}
}

#[tokio::test]
async fn test_blank_address_key_is_rejected() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("last_seen.json");
	std::fs::write(&path, r#"{"  ": "tx1"}"#).unwrap();

	let result = FileLastSeenStorage::new(&path).load().await;
	assert!(matches!(result, Err(WatcherError::StorageError(_))));
}
