//! LastSeen storage implementations for the watcher.
//!
//! LastSeen state is memory-only by default, in which case a restart re-baselines every
//! address without alerting. With a file store the entries survive restarts and a
//! resumed watcher alerts only on ids it has not seen before.

use async_trait::async_trait;
use std::{
	collections::{BTreeMap, HashMap},
	io::ErrorKind,
	path::PathBuf,
};
use tokio::sync::Mutex;

use crate::{
	models::{Address, TransactionId},
	repositories::write_atomically,
	services::watcher::error::WatcherError,
};

/// Persisted LastSeen entries; `None` means observed without any transaction
pub type LastSeenEntries = HashMap<Address, Option<TransactionId>>;

/// Interface for LastSeen storage implementations
#[async_trait]
pub trait LastSeenStorage: Send + Sync + 'static {
	/// Loads every persisted entry
	async fn load(&self) -> Result<LastSeenEntries, WatcherError>;

	/// Stores the LastSeen value of `address`
	async fn save(
		&self,
		address: &Address,
		last_seen: Option<&TransactionId>,
	) -> Result<(), WatcherError>;

	/// Removes the entry of `address`
	async fn remove(&self, address: &Address) -> Result<(), WatcherError>;
}

/// Storage that keeps nothing, LastSeen lives only in the watcher's memory
#[derive(Clone, Debug, Default)]
pub struct VolatileLastSeenStorage;

#[async_trait]
impl LastSeenStorage for VolatileLastSeenStorage {
	async fn load(&self) -> Result<LastSeenEntries, WatcherError> {
		Ok(HashMap::new())
	}

	async fn save(
		&self,
		_address: &Address,
		_last_seen: Option<&TransactionId>,
	) -> Result<(), WatcherError> {
		Ok(())
	}

	async fn remove(&self, _address: &Address) -> Result<(), WatcherError> {
		Ok(())
	}
}

/// File-based LastSeen storage
///
/// The whole map is kept in memory and rewritten on every change as a JSON object of
/// address to transaction id (or `null`). Writes are serialized so the file always
/// reflects the latest update.
#[derive(Debug)]
pub struct FileLastSeenStorage {
	path: PathBuf,
	entries: Mutex<BTreeMap<Address, Option<TransactionId>>>,
}

impl FileLastSeenStorage {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			entries: Mutex::new(BTreeMap::new()),
		}
	}

	fn path_metadata(&self) -> Option<HashMap<String, String>> {
		Some(HashMap::from([(
			"path".to_string(),
			self.path.display().to_string(),
		)]))
	}

	async fn write(
		&self,
		entries: &BTreeMap<Address, Option<TransactionId>>,
	) -> Result<(), WatcherError> {
		let json = serde_json::to_vec_pretty(entries).map_err(|e| {
			WatcherError::storage_error(
				"Failed to serialize LastSeen entries",
				Some(Box::new(e)),
				self.path_metadata(),
			)
		})?;
		write_atomically(&self.path, &json).await.map_err(|e| {
			WatcherError::storage_error(
				"Failed to write LastSeen file",
				Some(Box::new(e)),
				self.path_metadata(),
			)
		})
	}
}

#[async_trait]
impl LastSeenStorage for FileLastSeenStorage {
	async fn load(&self) -> Result<LastSeenEntries, WatcherError> {
		let content = match tokio::fs::read_to_string(&self.path).await {
			Ok(content) => content,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
			Err(e) => {
				return Err(WatcherError::storage_error(
					"Failed to read LastSeen file",
					Some(Box::new(e)),
					self.path_metadata(),
				))
			}
		};

		let loaded: BTreeMap<Address, Option<TransactionId>> = if content.trim().is_empty() {
			BTreeMap::new()
		} else {
			serde_json::from_str(&content).map_err(|e| {
				WatcherError::storage_error(
					"LastSeen file is malformed",
					Some(Box::new(e)),
					self.path_metadata(),
				)
			})?
		};

		let mut entries = self.entries.lock().await;
		*entries = loaded;
		Ok(entries
			.iter()
			.map(|(address, id)| (address.clone(), id.clone()))
			.collect())
	}

	async fn save(
		&self,
		address: &Address,
		last_seen: Option<&TransactionId>,
	) -> Result<(), WatcherError> {
		let mut entries = self.entries.lock().await;
		entries.insert(address.clone(), last_seen.cloned());
		self.write(&entries).await
	}

	async fn remove(&self, address: &Address) -> Result<(), WatcherError> {
		let mut entries = self.entries.lock().await;
		if entries.remove(address).is_none() {
			return Ok(());
		}
		self.write(&entries).await
	}
}
