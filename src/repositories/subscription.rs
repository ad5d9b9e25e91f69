//! Subscription repository implementation.
//!
//! The durable form of the subscription store is a single JSON object mapping each
//! address to its recipients. A missing file is an empty store. A file that exists but
//! is blank or cannot be parsed is a load error, which the watcher treats as fatal at
//! startup rather than running with a partial subscription set.

#![allow(clippy::result_large_err)]

use async_trait::async_trait;
use std::{
	collections::HashMap,
	io::ErrorKind,
	path::{Path, PathBuf},
};
use tokio::{fs::File, io::AsyncWriteExt};

use crate::{models::SubscriptionStore, repositories::error::RepositoryError};

/// Interface for subscription repository implementations
///
/// Allows different storage backends while keeping a consistent interface. The store
/// is always loaded and saved as a whole.
#[async_trait]
pub trait SubscriptionRepositoryTrait: Send + Sync + 'static {
	/// Loads the persisted store, returning an empty one when nothing was persisted yet
	async fn load(&self) -> Result<SubscriptionStore, RepositoryError>;

	/// Replaces the persisted store with `store`
	async fn save(&self, store: &SubscriptionStore) -> Result<(), RepositoryError>;
}

/// File-backed subscription repository
#[derive(Clone, Debug)]
pub struct FileSubscriptionRepository {
	path: PathBuf,
}

impl FileSubscriptionRepository {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn path_metadata(&self) -> Option<HashMap<String, String>> {
		Some(HashMap::from([(
			"path".to_string(),
			self.path.display().to_string(),
		)]))
	}
}

#[async_trait]
impl SubscriptionRepositoryTrait for FileSubscriptionRepository {
	async fn load(&self) -> Result<SubscriptionStore, RepositoryError> {
		let content = match tokio::fs::read_to_string(&self.path).await {
			Ok(content) => content,
			Err(e) if e.kind() == ErrorKind::NotFound => {
				tracing::info!(
					path = %self.path.display(),
					"No subscription file found, starting with an empty store"
				);
				return Ok(SubscriptionStore::new());
			}
			Err(e) => {
				return Err(RepositoryError::load_error(
					"Failed to read subscription file",
					Some(Box::new(e)),
					self.path_metadata(),
				))
			}
		};

		// Saves always write a JSON object, so a blank file is a truncated write
		if content.trim().is_empty() {
			return Err(RepositoryError::load_error(
				"Subscription file is blank",
				None,
				self.path_metadata(),
			));
		}

		serde_json::from_str::<SubscriptionStore>(&content).map_err(|e| {
			RepositoryError::load_error(
				"Subscription file is malformed",
				Some(Box::new(e)),
				self.path_metadata(),
			)
		})
	}

	async fn save(&self, store: &SubscriptionStore) -> Result<(), RepositoryError> {
		let json = serde_json::to_vec_pretty(store).map_err(|e| {
			RepositoryError::persist_error(
				"Failed to serialize subscriptions",
				Some(Box::new(e)),
				self.path_metadata(),
			)
		})?;

		write_atomically(&self.path, &json).await.map_err(|e| {
			RepositoryError::persist_error(
				"Failed to write subscription file",
				Some(Box::new(e)),
				self.path_metadata(),
			)
		})
	}
}

/// Writes `contents` to a sibling temp file and renames it over `path`.
///
/// The temp file is synced before the rename, so readers and restarts after a crash see
/// either the previous file or the complete new one.
pub(crate) async fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
	let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
	if let Some(parent) = parent {
		tokio::fs::create_dir_all(parent).await?;
	}

	let mut tmp_name = path
		.file_name()
		.map(|name| name.to_os_string())
		.unwrap_or_default();
	tmp_name.push(".tmp");
	let tmp_path = path.with_file_name(tmp_name);

	let mut file = File::create(&tmp_path).await?;
	file.write_all(contents).await?;
	file.sync_all().await?;
	drop(file);

	tokio::fs::rename(&tmp_path, path).await?;

	// Persist the rename itself; directories cannot be opened for syncing everywhere
	let dir = parent.unwrap_or_else(|| Path::new("."));
	if let Ok(dir) = File::open(dir).await {
		if let Err(e) = dir.sync_all().await {
			tracing::debug!(path = %path.display(), error = %e, "Could not sync parent directory");
		}
	}
	Ok(())
}
