//! Delivery errors of the notification channels.
//!
//! A [`NotificationError`] always concerns a single recipient. The watcher logs and
//! counts it, and the other recipients of the same change are still notified.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Why a message did not reach its recipient
#[derive(ThisError, Debug)]
pub enum NotificationError {
	/// The channel endpoint could not be reached or did not answer in time
	#[error("Network error: {0}")]
	NetworkError(Box<ErrorContext>),

	/// The channel is misconfigured (bad URL, blank bot token or webhook secret)
	#[error("Config error: {0}")]
	ConfigError(Box<ErrorContext>),

	/// The payload or its signature could not be built
	#[error("Internal error: {0}")]
	InternalError(Box<ErrorContext>),

	/// The channel answered but refused the message (non-2xx status, `ok: false`)
	#[error("Notification failed: {0}")]
	NotifyFailed(Box<ErrorContext>),
}

impl NotificationError {
	pub fn network_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NetworkError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	/// Raised while building a channel, which makes it fatal at startup
	pub fn config_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConfigError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	pub fn internal_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InternalError(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	pub fn notify_failed(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NotifyFailed(Box::new(ErrorContext::new_with_log(msg, source, metadata)))
	}

	fn context(&self) -> &ErrorContext {
		match self {
			Self::NetworkError(ctx)
			| Self::ConfigError(ctx)
			| Self::InternalError(ctx)
			| Self::NotifyFailed(ctx) => ctx,
		}
	}
}

impl TraceableError for NotificationError {
	fn trace_id(&self) -> String {
		self.context().trace_id.clone()
	}
}
