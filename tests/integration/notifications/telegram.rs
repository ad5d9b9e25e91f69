use address_watcher::{
	models::{NotificationMessage, NotifierConfig, Recipient, SecretString},
	services::notification::{NotificationError, NotificationService, Notifier},
	utils::RetryConfig,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;
use url::Url;

fn create_service(api_url: &str) -> NotificationService {
	NotificationService::from_config(
		&NotifierConfig::Telegram {
			token: SecretString::new("123:ABC".to_string()),
			api_url: Url::parse(api_url).unwrap(),
			disable_web_preview: true,
		},
		&RetryConfig::no_retries(),
		Duration::from_secs(2),
	)
	.unwrap()
}

fn create_message() -> NotificationMessage {
	NotificationMessage {
		title: "New activity on GABC".to_string(),
		body: "Address GABC has a new transaction: tx-1".to_string(),
	}
}

#[tokio::test]
async fn test_telegram_notification_success() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/bot123:ABC/sendMessage")
		.match_body(Matcher::Json(json!({
			"chat_id": "42",
			"text": "*New activity on GABC* \n\nAddress GABC has a new transaction: tx\\-1",
			"parse_mode": "MarkdownV2",
			"disable_web_page_preview": true
		})))
		.with_status(200)
		.with_body(r#"{"ok": true, "result": {}}"#)
		.create_async()
		.await;

	let service = create_service(&server.url());
	let result = service
		.notify(&Recipient::new("42").unwrap(), &create_message())
		.await;

	assert!(result.is_ok());
	mock.assert_async().await;
}

#[tokio::test]
async fn test_telegram_error_status_is_delivery_failure() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("POST", "/bot123:ABC/sendMessage")
		.with_status(400)
		.with_body(r#"{"ok": false, "description": "Bad Request: chat not found"}"#)
		.create_async()
		.await;

	let service = create_service(&server.url());
	let result = service
		.notify(&Recipient::new("42").unwrap(), &create_message())
		.await;

	match result {
		Err(NotificationError::NotifyFailed(ctx)) => {
			assert!(ctx.message.contains("chat not found"));
		}
		other => panic!("expected a delivery failure, got {:?}", other),
	}
	mock.assert_async().await;
}

#[tokio::test]
async fn test_telegram_ok_false_is_delivery_failure() {
	let mut server = Server::new_async().await;
	let _mock = server
		.mock("POST", "/bot123:ABC/sendMessage")
		.with_status(200)
		.with_body(r#"{"ok": false}"#)
		.create_async()
		.await;

	let service = create_service(&server.url());
	let result = service
		.notify(&Recipient::new("42").unwrap(), &create_message())
		.await;

	assert!(matches!(result, Err(NotificationError::NotifyFailed(_))));
}

#[tokio::test]
async fn test_telegram_network_error_hides_token() {
	let service = create_service("http://127.0.0.1:9");
	let result = service
		.notify(&Recipient::new("42").unwrap(), &create_message())
		.await;

	match result {
		Err(e @ NotificationError::NetworkError(_)) => {
			let mut chain = e.to_string();
			let mut source = std::error::Error::source(&e);
			while let Some(err) = source {
				chain.push_str(&err.to_string());
				source = err.source();
			}
			assert!(!chain.contains("123:ABC"));
		}
		other => panic!("expected a network error, got {:?}", other),
	}
}
