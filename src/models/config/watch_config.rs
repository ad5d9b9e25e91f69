//! Environment-sourced watcher configuration.
//!
//! Values are read through a lookup function so that tests can supply a map instead of
//! mutating the process environment. `.env` loading and CLI overrides happen in the
//! binary before [`WatchConfig::from_env`] is called.

use std::{collections::HashMap, path::PathBuf, time::Duration};
use url::Url;

use crate::{
	models::{ConfigError, NotificationMessage, SecretString},
	utils::{
		constants::{
			DEFAULT_MAX_CONCURRENT_POLLS, DEFAULT_NOTIFICATION_BODY, DEFAULT_NOTIFICATION_TITLE,
			DEFAULT_POLL_INTERVAL_SECONDS, DEFAULT_POLL_TIMEOUT_SECONDS,
			DEFAULT_SHUTDOWN_GRACE_SECONDS, DEFAULT_SUBSCRIPTIONS_PATH, DEFAULT_TELEGRAM_API_URL,
			MAX_CONCURRENT_POLLS_LIMIT,
		},
		normalize_string, parse_bool_flag,
	},
};

/// Delivery channel for notifications
#[derive(Debug, Clone, PartialEq)]
pub enum NotifierConfig {
	/// Telegram Bot API `sendMessage`
	Telegram {
		token: SecretString,
		api_url: Url,
		disable_web_preview: bool,
	},
	/// Generic JSON webhook, optionally HMAC signed
	Webhook {
		url: Url,
		secret: Option<SecretString>,
	},
	/// Writes notifications to the log only
	Log,
}

impl NotifierConfig {
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Telegram { .. } => "telegram",
			Self::Webhook { .. } => "webhook",
			Self::Log => "log",
		}
	}
}

/// Complete runtime configuration of the watcher
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
	/// Time between two ticks
	pub poll_interval: Duration,
	/// Upper bound on gateway calls running at the same time
	pub max_concurrent_polls: usize,
	/// Base URL of the ledger query gateway
	pub gateway_base_url: Url,
	/// Upper bound for one gateway call
	pub poll_timeout: Duration,
	/// Time granted to in-flight polls on shutdown
	pub shutdown_grace: Duration,
	/// Durable subscription file
	pub subscriptions_path: PathBuf,
	/// When set, LastSeen state survives restarts through this file
	pub last_seen_path: Option<PathBuf>,
	pub notifier: NotifierConfig,
	/// Title and body templates rendered per notification
	pub message_template: NotificationMessage,
}

impl WatchConfig {
	/// Reads the configuration from the process environment
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`, treating blank values as unset
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| {
			lookup(key)
				.map(|value| value.trim().to_string())
				.filter(|value| !value.is_empty())
		};

		let poll_interval = Duration::from_secs(positive(
			"POLL_INTERVAL_SECONDS",
			get("POLL_INTERVAL_SECONDS"),
			DEFAULT_POLL_INTERVAL_SECONDS,
		)?);
		let max_concurrent_polls = bounded(
			"MAX_CONCURRENT_POLLS",
			get("MAX_CONCURRENT_POLLS"),
			DEFAULT_MAX_CONCURRENT_POLLS as u64,
			MAX_CONCURRENT_POLLS_LIMIT as u64,
		)? as usize;
		let poll_timeout = Duration::from_secs(positive(
			"POLL_TIMEOUT_SECONDS",
			get("POLL_TIMEOUT_SECONDS"),
			DEFAULT_POLL_TIMEOUT_SECONDS,
		)?);
		let shutdown_grace = Duration::from_secs(number(
			"SHUTDOWN_GRACE_SECONDS",
			get("SHUTDOWN_GRACE_SECONDS"),
			DEFAULT_SHUTDOWN_GRACE_SECONDS,
		)?);

		let gateway_base_url = match get("GATEWAY_BASE_URL") {
			Some(raw) => http_url("GATEWAY_BASE_URL", &raw)?,
			None => return Err(missing("GATEWAY_BASE_URL")),
		};

		let subscriptions_path = get("SUBSCRIPTIONS_PATH")
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from(DEFAULT_SUBSCRIPTIONS_PATH));
		let last_seen_path = get("LAST_SEEN_PATH").map(PathBuf::from);

		let notifier = match get("NOTIFIER").map(|v| normalize_string(&v)).as_deref() {
			None | Some("log") => NotifierConfig::Log,
			Some("telegram") => {
				let token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| missing("TELEGRAM_BOT_TOKEN"))?;
				let api_url = get("TELEGRAM_API_URL")
					.unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());
				NotifierConfig::Telegram {
					token: SecretString::new(token),
					api_url: http_url("TELEGRAM_API_URL", &api_url)?,
					disable_web_preview: flag(
						"TELEGRAM_DISABLE_WEB_PREVIEW",
						get("TELEGRAM_DISABLE_WEB_PREVIEW"),
					)?,
				}
			}
			Some("webhook") => {
				let url = get("WEBHOOK_URL").ok_or_else(|| missing("WEBHOOK_URL"))?;
				NotifierConfig::Webhook {
					url: http_url("WEBHOOK_URL", &url)?,
					secret: get("WEBHOOK_SECRET").map(SecretString::new),
				}
			}
			Some(other) => {
				return Err(ConfigError::validation_error(
					format!(
						"Unknown notifier '{}', expected one of: telegram, webhook, log",
						other
					),
					None,
					Some(variable("NOTIFIER")),
				))
			}
		};

		let message_template = NotificationMessage {
			title: lookup("NOTIFICATION_TITLE")
				.filter(|v| !v.trim().is_empty())
				.unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
			body: lookup("NOTIFICATION_BODY")
				.filter(|v| !v.trim().is_empty())
				.unwrap_or_else(|| DEFAULT_NOTIFICATION_BODY.to_string()),
		};

		Ok(Self {
			poll_interval,
			max_concurrent_polls,
			gateway_base_url,
			poll_timeout,
			shutdown_grace,
			subscriptions_path,
			last_seen_path,
			notifier,
			message_template,
		})
	}
}

fn variable(key: &str) -> HashMap<String, String> {
	HashMap::from([("variable".to_string(), key.to_string())])
}

fn missing(key: &str) -> ConfigError {
	ConfigError::missing_error(format!("{} is required", key), None, Some(variable(key)))
}

fn number(key: &str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
	match raw {
		None => Ok(default),
		Some(raw) => raw.parse::<u64>().map_err(|e| {
			ConfigError::parse_error(
				format!("{} must be a non-negative integer, got '{}'", key, raw),
				Some(Box::new(e)),
				Some(variable(key)),
			)
		}),
	}
}

fn positive(key: &str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
	let value = number(key, raw, default)?;
	if value == 0 {
		return Err(ConfigError::validation_error(
			format!("{} must be greater than zero", key),
			None,
			Some(variable(key)),
		));
	}
	Ok(value)
}

fn bounded(key: &str, raw: Option<String>, default: u64, max: u64) -> Result<u64, ConfigError> {
	let value = positive(key, raw, default)?;
	if value > max {
		return Err(ConfigError::validation_error(
			format!("{} must be at most {}, got {}", key, max, value),
			None,
			Some(variable(key)),
		));
	}
	Ok(value)
}

fn flag(key: &str, raw: Option<String>) -> Result<bool, ConfigError> {
	match raw {
		None => Ok(false),
		Some(raw) => parse_bool_flag(&raw).ok_or_else(|| {
			ConfigError::parse_error(
				format!("{} must be a boolean, got '{}'", key, raw),
				None,
				Some(variable(key)),
			)
		}),
	}
}

fn http_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw).map_err(|e| {
		ConfigError::parse_error(
			format!("{} is not a valid URL: '{}'", key, raw),
			Some(Box::new(e)),
			Some(variable(key)),
		)
	})?;
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::validation_error(
			format!("{} must use http or https", key),
			None,
			Some(variable(key)),
		));
	}
	Ok(url)
}
