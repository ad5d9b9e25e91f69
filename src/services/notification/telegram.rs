//! Telegram notification implementation.
//!
//! Sends messages through the Bot API `sendMessage` method with MarkdownV2 formatting.
//! The recipient is the target `chat_id`.

use lazy_static::lazy_static;
use regex::Regex;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use url::Url;

use crate::{
	models::{NotificationMessage, Recipient, SecretString},
	services::notification::NotificationError,
};

lazy_static! {
	// Spans that already carry MarkdownV2 meaning and are kept as-is
	static ref MARKDOWN_ENTITY: Regex =
		Regex::new(r"(?s)```.*?```|`[^`]*`|\*[^*]*\*|_[^_]*_|~[^~]*~|\[([^\]]+)\]\(([^)]+)\)")
			.unwrap();
}

const SPECIAL: &[char] = &[
	'_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
	'\\',
];

fn push_escaped(out: &mut String, text: &str) {
	for c in text.chars() {
		if SPECIAL.contains(&c) {
			out.push('\\');
		}
		out.push(c);
	}
}

/// Escapes a full MarkdownV2 message, preserving entities and escaping every special
/// character inside link labels and URLs.
pub fn escape_markdown_v2(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut last = 0;

	for caps in MARKDOWN_ENTITY.captures_iter(text) {
		let Some(mat) = caps.get(0) else {
			continue;
		};
		push_escaped(&mut out, &text[last..mat.start()]);

		if let (Some(label), Some(url)) = (caps.get(1), caps.get(2)) {
			out.push('[');
			push_escaped(&mut out, label.as_str());
			out.push_str("](");
			push_escaped(&mut out, url.as_str());
			out.push(')');
		} else {
			out.push_str(mat.as_str());
		}

		last = mat.end();
	}

	push_escaped(&mut out, &text[last..]);
	out
}

/// Implementation of Telegram notifications via the Bot API
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
	client: Arc<ClientWithMiddleware>,
	token: SecretString,
	api_url: Url,
	disable_web_preview: bool,
}

impl TelegramNotifier {
	/// Creates a new Telegram notifier
	///
	/// # Arguments
	/// * `token` - Bot token
	/// * `api_url` - Bot API base URL
	/// * `disable_web_preview` - Disables link previews in sent messages
	/// * `client` - HTTP client with middleware for retries
	pub fn new(
		token: SecretString,
		api_url: Url,
		disable_web_preview: bool,
		client: Arc<ClientWithMiddleware>,
	) -> Result<Self, NotificationError> {
		if token.is_empty() {
			return Err(NotificationError::config_error(
				"Telegram bot token must not be empty",
				None,
				None,
			));
		}
		Ok(Self {
			client,
			token,
			api_url,
			disable_web_preview,
		})
	}

	fn send_message_url(&self) -> String {
		format!(
			"{}/bot{}/sendMessage",
			self.api_url.as_str().trim_end_matches('/'),
			self.token.as_str()
		)
	}

	/// Builds the `sendMessage` payload for `chat_id`
	pub fn build_payload(&self, chat_id: &str, message: &NotificationMessage) -> serde_json::Value {
		let text = format!(
			"*{}* \n\n{}",
			escape_markdown_v2(&message.title),
			escape_markdown_v2(&message.body)
		);
		json!({
			"chat_id": chat_id,
			"text": text,
			"parse_mode": "MarkdownV2",
			"disable_web_page_preview": self.disable_web_preview
		})
	}

	/// Sends `message` to the chat identified by `recipient`
	pub async fn notify(
		&self,
		recipient: &Recipient,
		message: &NotificationMessage,
	) -> Result<(), NotificationError> {
		let payload = self.build_payload(recipient.as_str(), message);
		let metadata = || {
			Some(HashMap::from([(
				"recipient".to_string(),
				recipient.to_string(),
			)]))
		};

		let response = self
			.client
			.post(self.send_message_url())
			.json(&payload)
			.send()
			.await
			.map_err(|e| {
				// The request URL contains the bot token
				let source: Box<dyn std::error::Error + Send + Sync> = match e {
					reqwest_middleware::Error::Reqwest(err) => Box::new(err.without_url()),
					other => Box::new(other),
				};
				NotificationError::network_error(
					"Failed to send Telegram message",
					Some(source),
					metadata(),
				)
			})?;

		let status = response.status();
		let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);

		if !status.is_success() {
			let description = body
				.get("description")
				.and_then(|d| d.as_str())
				.unwrap_or("no description");
			return Err(NotificationError::notify_failed(
				format!(
					"Telegram request failed with status {}: {}",
					status, description
				),
				None,
				metadata(),
			));
		}

		if body.get("ok").and_then(|ok| ok.as_bool()) == Some(false) {
			return Err(NotificationError::notify_failed(
				"Telegram API answered ok=false",
				None,
				metadata(),
			));
		}

		Ok(())
	}
}
