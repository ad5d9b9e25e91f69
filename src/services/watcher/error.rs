//! Watcher error types and handling.
//!
//! Covers scheduler-level failures, LastSeen persistence and subscription changes.
//! Poll and delivery failures never surface as a `WatcherError`; they are contained to
//! the address or recipient that produced them.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents possible errors that can occur while watching addresses
#[derive(ThisError, Debug)]
pub enum WatcherError {
	/// Errors related to the tick loop and its tasks
	#[error("Scheduler error: {0}")]
	SchedulerError(ErrorContext),

	/// Errors related to LastSeen persistence
	#[error("Storage error: {0}")]
	StorageError(ErrorContext),

	/// A subscription change could not be applied
	#[error("Subscription error: {0}")]
	SubscriptionError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl WatcherError {
	// Scheduler error
	pub fn scheduler_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SchedulerError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Storage error
	pub fn storage_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::StorageError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Subscription error
	pub fn subscription_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SubscriptionError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for WatcherError {
	fn trace_id(&self) -> String {
		match self {
			Self::SchedulerError(ctx) => ctx.trace_id.clone(),
			Self::StorageError(ctx) => ctx.trace_id.clone(),
			Self::SubscriptionError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
