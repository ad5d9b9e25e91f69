use address_watcher::{
	models::{NotificationMessage, NotifierConfig, Recipient, SecretString},
	services::notification::{NotificationError, NotificationService, Notifier},
	utils::{JitterSetting, RetryConfig},
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;
use url::Url;

fn create_service(
	url: &str,
	secret: Option<&str>,
	retry_policy: RetryConfig,
) -> NotificationService {
	NotificationService::from_config(
		&NotifierConfig::Webhook {
			url: Url::parse(url).unwrap(),
			secret: secret.map(|s| SecretString::new(s.to_string())),
		},
		&retry_policy,
		Duration::from_secs(2),
	)
	.unwrap()
}

fn create_message() -> NotificationMessage {
	NotificationMessage {
		title: "New activity on GABC".to_string(),
		body: "Address GABC has a new transaction: tx1".to_string(),
	}
}

#[tokio::test]
async fn test_webhook_notification_success() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/notify")
		.match_header("content-type", "application/json")
		.match_header("x-signature", Matcher::Regex("^[0-9a-f]{64}$".to_string()))
		.match_header("x-timestamp", Matcher::Regex("^[0-9]+$".to_string()))
		.match_body(Matcher::Json(json!({
			"recipient": "42",
			"title": "New activity on GABC",
			"body": "Address GABC has a new transaction: tx1"
		})))
		.with_status(200)
		.create_async()
		.await;

	let service = create_service(
		&format!("{}/notify", server.url()),
		Some("top-secret"),
		RetryConfig::no_retries(),
	);
	let result = service
		.notify(&Recipient::new("42").unwrap(), &create_message())
		.await;

	assert!(result.is_ok());
	mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_server_errors_are_retried_then_fail() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/notify")
		.with_status(500)
		.expect(3)
		.create_async()
		.await;

	let retry_policy = RetryConfig {
		max_retries: 2,
		initial_backoff: Duration::from_millis(1),
		max_backoff: Duration::from_millis(2),
		jitter: JitterSetting::None,
		..RetryConfig::default()
	};
	let service = create_service(&format!("{}/notify", server.url()), None, retry_policy);
	let result = service
		.notify(&Recipient::new("42").unwrap(), &create_message())
		.await;

	assert!(matches!(result, Err(NotificationError::NotifyFailed(_))));
	mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_client_error_is_not_retried() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/notify")
		.with_status(400)
		.expect(1)
		.create_async()
		.await;

	let service = create_service(
		&format!("{}/notify", server.url()),
		None,
		RetryConfig::default(),
	);
	let result = service
		.notify(&Recipient::new("42").unwrap(), &create_message())
		.await;

	assert!(matches!(result, Err(NotificationError::NotifyFailed(_))));
	mock.assert_async().await;
}
