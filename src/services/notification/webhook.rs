//! Webhook notification implementation.
//!
//! Posts `{ recipient, title, body }` as JSON to a single endpoint. When a secret is
//! configured, the request carries an `X-Signature` header holding the hex HMAC-SHA256
//! of the serialized payload followed by the `X-Timestamp` value.

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;
use sha2::Sha256;
use std::{collections::HashMap, sync::Arc};
use url::Url;

use crate::{
	models::{NotificationMessage, Recipient, SecretString},
	services::notification::NotificationError,
};

/// HMAC SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Implementation of notifications via a generic JSON webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
	/// Webhook URL for message delivery
	pub url: Url,
	/// Secret used to sign requests
	secret: Option<SecretString>,
	/// Configured HTTP client for webhook requests with retry capabilities
	client: Arc<ClientWithMiddleware>,
}

impl WebhookNotifier {
	/// Creates a new Webhook notifier instance
	///
	/// # Arguments
	/// * `url` - Endpoint receiving the notifications
	/// * `secret` - Optional signing secret, must not be blank when given
	/// * `client` - HTTP client with middleware for retries
	pub fn new(
		url: Url,
		secret: Option<SecretString>,
		client: Arc<ClientWithMiddleware>,
	) -> Result<Self, NotificationError> {
		if secret.as_ref().is_some_and(SecretString::is_empty) {
			return Err(NotificationError::config_error(
				"Webhook secret must not be empty when set",
				None,
				None,
			));
		}
		Ok(Self {
			url,
			secret,
			client,
		})
	}

	/// Builds the JSON payload for `recipient`
	pub fn build_payload(
		&self,
		recipient: &Recipient,
		message: &NotificationMessage,
	) -> serde_json::Value {
		json!({
			"recipient": recipient.as_str(),
			"title": message.title,
			"body": message.body,
		})
	}

	/// Signs `payload` with `secret` at the current time
	///
	/// # Returns
	/// * `(signature, timestamp)` - Hex HMAC and the millisecond timestamp it covers
	pub fn sign_payload(
		&self,
		secret: &str,
		payload: &serde_json::Value,
	) -> Result<(String, String), NotificationError> {
		// `HmacSha256::new_from_slice` accepts empty keys
		if secret.is_empty() {
			return Err(NotificationError::notify_failed(
				"Invalid secret: cannot be empty.",
				None,
				None,
			));
		}

		let timestamp = Utc::now().timestamp_millis().to_string();
		let signature = compute_signature(secret, payload, &timestamp)?;
		Ok((signature, timestamp))
	}

	/// Sends `message` for `recipient` to the webhook
	pub async fn notify(
		&self,
		recipient: &Recipient,
		message: &NotificationMessage,
	) -> Result<(), NotificationError> {
		let payload = self.build_payload(recipient, message);
		let metadata = || {
			Some(HashMap::from([
				("recipient".to_string(), recipient.to_string()),
				("url".to_string(), self.url.to_string()),
			]))
		};

		let mut headers = HeaderMap::new();
		headers.insert(
			HeaderName::from_static("content-type"),
			HeaderValue::from_static("application/json"),
		);

		if let Some(secret) = &self.secret {
			let (signature, timestamp) = self.sign_payload(secret.as_str(), &payload)?;

			headers.insert(
				HeaderName::from_static("x-signature"),
				HeaderValue::from_str(&signature).map_err(|e| {
					NotificationError::internal_error(
						"Invalid signature value",
						Some(Box::new(e)),
						metadata(),
					)
				})?,
			);
			headers.insert(
				HeaderName::from_static("x-timestamp"),
				HeaderValue::from_str(&timestamp).map_err(|e| {
					NotificationError::internal_error(
						"Invalid timestamp value",
						Some(Box::new(e)),
						metadata(),
					)
				})?,
			);
		}

		let response = self
			.client
			.post(self.url.clone())
			.headers(headers)
			.json(&payload)
			.send()
			.await
			.map_err(|e| {
				NotificationError::network_error(
					format!("Failed to send webhook request: {}", e),
					Some(Box::new(e)),
					metadata(),
				)
			})?;

		let status = response.status();
		if !status.is_success() {
			return Err(NotificationError::notify_failed(
				format!("Webhook request failed with status: {}", status),
				None,
				metadata(),
			));
		}

		Ok(())
	}
}

/// Hex HMAC-SHA256 of the serialized `payload` followed by `timestamp`
pub fn compute_signature(
	secret: &str,
	payload: &serde_json::Value,
	timestamp: &str,
) -> Result<String, NotificationError> {
	let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
		NotificationError::config_error(format!("Invalid secret: {}", e), None, None)
	})?;

	let serialized_payload = serde_json::to_string(payload).map_err(|e| {
		NotificationError::internal_error(
			format!("Failed to serialize payload: {}", e),
			Some(Box::new(e)),
			None,
		)
	})?;
	mac.update(format!("{}{}", serialized_payload, timestamp).as_bytes());

	Ok(hex::encode(mac.finalize().into_bytes()))
}
