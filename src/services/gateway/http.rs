//! HTTP/JSON adapter for the ledger query gateway.
//!
//! `GET {base}/address/{address}` returns the address summary. A 404 means the
//! address is unknown; every other non-success status is transient. Transient HTTP
//! failures are retried by the middleware before they surface here.

use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use std::{collections::HashMap, time::Duration};
use url::Url;

use crate::{
	models::{Address, AddressSummary},
	services::gateway::{GatewayError, LedgerGateway},
	utils::http::{
		create_base_http_client, create_retryable_http_client, RetryConfig,
		TransientErrorRetryStrategy,
	},
};

/// Gateway client backed by a retrying `reqwest` client
#[derive(Clone, Debug)]
pub struct HttpGatewayClient {
	client: ClientWithMiddleware,
	base_url: Url,
}

impl HttpGatewayClient {
	/// Creates a client for the gateway at `base_url`
	///
	/// # Arguments
	/// * `base_url` - Gateway root, a path prefix is kept
	/// * `retry_policy` - Retry policy for transient HTTP failures
	/// * `request_timeout` - Timeout of a single HTTP attempt
	pub fn new(
		base_url: Url,
		retry_policy: &RetryConfig,
		request_timeout: Duration,
	) -> Result<Self, anyhow::Error> {
		let base_client = create_base_http_client(request_timeout)
			.context("Failed to create base HTTP client")?;
		let client = create_retryable_http_client(
			retry_policy,
			base_client,
			Some(TransientErrorRetryStrategy),
		);
		Ok(Self { client, base_url })
	}

	/// URL of the summary endpoint for `address`
	pub fn summary_url(&self, address: &Address) -> String {
		format!(
			"{}/address/{}",
			self.base_url.as_str().trim_end_matches('/'),
			urlencoding::encode(address.as_str())
		)
	}
}

#[async_trait]
impl LedgerGateway for HttpGatewayClient {
	async fn get_address_summary(
		&self,
		address: &Address,
	) -> Result<AddressSummary, GatewayError> {
		let url = self.summary_url(address);
		let metadata = || {
			HashMap::from([
				("address".to_string(), address.to_string()),
				("url".to_string(), url.clone()),
			])
		};

		let response = self.client.get(&url).send().await.map_err(|e| {
			GatewayError::transient("Gateway request failed", Some(Box::new(e)), Some(metadata()))
		})?;

		let status = response.status();
		if status == reqwest::StatusCode::NOT_FOUND {
			return Err(GatewayError::not_found(
				"Gateway has no record of the address",
				None,
				Some(metadata()),
			));
		}
		if !status.is_success() {
			let mut context = metadata();
			context.insert("status".to_string(), status.as_u16().to_string());
			return Err(GatewayError::transient(
				format!("Gateway responded with status {}", status),
				None,
				Some(context),
			));
		}

		let body = response.bytes().await.map_err(|e| {
			GatewayError::transient(
				"Failed to read gateway response",
				Some(Box::new(e)),
				Some(metadata()),
			)
		})?;

		serde_json::from_slice::<AddressSummary>(&body).map_err(|e| {
			GatewayError::response_parse(
				"Gateway response is not a valid address summary",
				Some(Box::new(e)),
				Some(metadata()),
			)
		})
	}
}
