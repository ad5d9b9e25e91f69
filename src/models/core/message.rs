use serde::{Deserialize, Serialize};

/// Notification message fields
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NotificationMessage {
	/// Notification title or subject
	pub title: String,
	/// Message body
	pub body: String,
}
