use address_watcher::{
	models::{Address, PollResult, TransactionId},
	services::gateway::{GatewayError, HttpGatewayClient, LedgerGateway},
	utils::RetryConfig,
};
use mockito::Server;
use std::time::Duration;
use url::Url;

fn create_client(base_url: &str) -> HttpGatewayClient {
	HttpGatewayClient::new(
		Url::parse(base_url).unwrap(),
		&RetryConfig::no_retries(),
		Duration::from_secs(2),
	)
	.unwrap()
}

#[tokio::test]
async fn test_summary_is_parsed() {
	let mut server = Server::new_async().await;
	let mock = server
		.mock("GET", "/address/GABC")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(
			r#"{"address": "GABC", "lastTransactionId": "tx42", "balance": "10.5", "transactionCount": 3}"#,
		)
		.create_async()
		.await;

	let client = create_client(&server.url());
	let summary = client
		.get_address_summary(&Address::new("GABC").unwrap())
		.await
		.unwrap();

	assert_eq!(summary.last_transaction_id, Some(TransactionId::new("tx42")));
	assert_eq!(summary.balance.as_deref(), Some("10.5"));
	assert_eq!(summary.transaction_count, Some(3));
	mock.assert_async().await;
}

#[tokio::test]
async fn test_address_without_transactions() {
	let mut server = Server::new_async().await;
	let _mock = server
		.mock("GET", "/address/GNEW")
		.with_status(200)
		.with_body(r#"{"address": "GNEW", "last_transaction_id": null}"#)
		.create_async()
		.await;

	let client = create_client(&server.url());
	let poll = client.poll(&Address::new("GNEW").unwrap()).await;

	match poll {
		PollResult::Found(summary) => assert!(summary.last_transaction_id.is_none()),
		other => panic!("expected a summary, got {:?}", other),
	}
}

#[tokio::test]
async fn test_not_found_status() {
	let mut server = Server::new_async().await;
	let _mock = server
		.mock("GET", "/address/GMISSING")
		.with_status(404)
		.create_async()
		.await;

	let client = create_client(&server.url());
	let address = Address::new("GMISSING").unwrap();

	let result = client.get_address_summary(&address).await;
	assert!(matches!(result, Err(GatewayError::NotFound(_))));
	assert_eq!(client.poll(&address).await, PollResult::NotFound);
}

#[tokio::test]
async fn test_server_error_is_transient() {
	let mut server = Server::new_async().await;
	let _mock = server
		.mock("GET", "/address/GABC")
		.with_status(503)
		.create_async()
		.await;

	let client = create_client(&server.url());
	let result = client
		.get_address_summary(&Address::new("GABC").unwrap())
		.await;

	match result {
		Err(GatewayError::Transient(ctx)) => {
			assert_eq!(
				ctx.metadata.as_ref().and_then(|m| m.get("status")).map(String::as_str),
				Some("503")
			);
		}
		other => panic!("expected a transient error, got {:?}", other),
	}
}

#[tokio::test]
async fn test_malformed_body_is_a_failed_poll() {
	let mut server = Server::new_async().await;
	let _mock = server
		.mock("GET", "/address/GABC")
		.with_status(200)
		.with_body("<html>maintenance</html>")
		.create_async()
		.await;

	let client = create_client(&server.url());
	let address = Address::new("GABC").unwrap();

	assert!(matches!(
		client.get_address_summary(&address).await,
		Err(GatewayError::ResponseParse(_))
	));
	assert!(matches!(client.poll(&address).await, PollResult::Failed(_)));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
	let mut server = Server::new_async().await;
	let failing = server
		.mock("GET", "/address/GABC")
		.with_status(502)
		.expect(2)
		.create_async()
		.await;

	let retry_policy = RetryConfig {
		max_retries: 1,
		initial_backoff: Duration::from_millis(1),
		max_backoff: Duration::from_millis(2),
		..RetryConfig::default()
	};
	let client = HttpGatewayClient::new(
		Url::parse(&server.url()).unwrap(),
		&retry_policy,
		Duration::from_secs(2),
	)
	.unwrap();

	let poll = client.poll(&Address::new("GABC").unwrap()).await;
	assert!(matches!(poll, PollResult::Failed(_)));
	failing.assert_async().await;
}

#[tokio::test]
async fn test_connection_failure_is_a_failed_poll() {
	// Nothing listens on the discard port
	let client = create_client("http://127.0.0.1:9");
	let poll = client.poll(&Address::new("GABC").unwrap()).await;

	assert!(matches!(poll, PollResult::Failed(_)));
}
