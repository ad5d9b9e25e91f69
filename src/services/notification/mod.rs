//! Notification service implementation.
//!
//! This module provides functionality to send notifications through various channels:
//! Telegram, a generic signed webhook, or the log. Message templates support variable
//! substitution through [`template_formatter`].

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

mod error;
mod telegram;
pub mod template_formatter;
mod webhook;

use crate::{
	models::{NotificationMessage, NotifierConfig, Recipient},
	utils::{
		create_base_http_client, create_retryable_http_client, RetryConfig,
		TransientErrorRetryStrategy,
	},
};

pub use error::NotificationError;
pub use telegram::{escape_markdown_v2, TelegramNotifier};
pub use webhook::{compute_signature, WebhookNotifier};

/// Delivery of a rendered message to one recipient
///
/// A failed delivery is reported to the caller and never retried by the watcher.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
	async fn notify(
		&self,
		recipient: &Recipient,
		message: &NotificationMessage,
	) -> Result<(), NotificationError>;
}

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
	async fn notify(
		&self,
		recipient: &Recipient,
		message: &NotificationMessage,
	) -> Result<(), NotificationError> {
		tracing::info!(
			recipient = %recipient,
			title = %message.title,
			"{}",
			message.body
		);
		Ok(())
	}
}

/// The concrete channel selected by configuration
#[derive(Debug, Clone)]
pub enum NotificationChannel {
	Telegram(TelegramNotifier),
	Webhook(WebhookNotifier),
	Log(LogNotifier),
}

/// Service for dispatching notifications over the configured channel
#[derive(Debug, Clone)]
pub struct NotificationService {
	channel: NotificationChannel,
}

impl NotificationService {
	pub fn new(channel: NotificationChannel) -> Self {
		Self { channel }
	}

	/// Builds the service described by `config`
	///
	/// HTTP channels share one retrying client; the retry middleware only handles
	/// transient transport failures.
	pub fn from_config(
		config: &NotifierConfig,
		retry_policy: &RetryConfig,
		request_timeout: Duration,
	) -> Result<Self, NotificationError> {
		let http_client = || {
			create_base_http_client(request_timeout)
				.map(|base| {
					Arc::new(create_retryable_http_client(
						retry_policy,
						base,
						Some(TransientErrorRetryStrategy),
					))
				})
				.map_err(|e| {
					NotificationError::config_error(
						"Failed to create HTTP client",
						Some(Box::new(e)),
						None,
					)
				})
		};

		let channel = match config {
			NotifierConfig::Telegram {
				token,
				api_url,
				disable_web_preview,
			} => NotificationChannel::Telegram(TelegramNotifier::new(
				token.clone(),
				api_url.clone(),
				*disable_web_preview,
				http_client()?,
			)?),
			NotifierConfig::Webhook { url, secret } => NotificationChannel::Webhook(
				WebhookNotifier::new(url.clone(), secret.clone(), http_client()?)?,
			),
			NotifierConfig::Log => NotificationChannel::Log(LogNotifier),
		};

		Ok(Self::new(channel))
	}

	pub fn channel(&self) -> &NotificationChannel {
		&self.channel
	}

	pub fn kind(&self) -> &'static str {
		match self.channel {
			NotificationChannel::Telegram(_) => "telegram",
			NotificationChannel::Webhook(_) => "webhook",
			NotificationChannel::Log(_) => "log",
		}
	}
}

#[async_trait]
impl Notifier for NotificationService {
	async fn notify(
		&self,
		recipient: &Recipient,
		message: &NotificationMessage,
	) -> Result<(), NotificationError> {
		match &self.channel {
			NotificationChannel::Telegram(notifier) => notifier.notify(recipient, message).await,
			NotificationChannel::Webhook(notifier) => notifier.notify(recipient, message).await,
			NotificationChannel::Log(notifier) => notifier.notify(recipient, message).await,
		}
	}
}
