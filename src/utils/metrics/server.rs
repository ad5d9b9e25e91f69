//! Metrics server module
//!
//! This module provides an HTTP server to expose Prometheus metrics for scraping,
//! together with the subscription control routes:
//!
//! - `GET /metrics`
//! - `GET /subscriptions`
//! - `POST /subscriptions` with `{ "address": .., "recipient": .. }`
//! - `DELETE /subscriptions` with the same body

use actix_web::middleware::{Compress, DefaultHeaders, NormalizePath};
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
	models::{Address, ConfigError, Recipient},
	services::watcher::SubscriptionManager,
	utils::metrics::{gather_metrics, update_subscription_metrics, update_system_metrics},
};

// Shared handle to the subscription registry
pub type SubscriptionManagerArc = Arc<dyn SubscriptionManager>;

// Actix data wrapper for the registry handle
pub type SubscriptionManagerData = web::Data<SubscriptionManagerArc>;

/// Body of the subscribe and unsubscribe routes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionRequest {
	pub address: String,
	pub recipient: String,
}

impl SubscriptionRequest {
	fn parse(&self) -> Result<(Address, Recipient), ConfigError> {
		Ok((Address::new(&self.address)?, Recipient::new(&self.recipient)?))
	}
}

/// Response of the subscribe and unsubscribe routes
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubscriptionResponse {
	/// Whether the store changed
	pub changed: bool,
}

fn error_body(message: impl std::fmt::Display) -> serde_json::Value {
	serde_json::json!({ "error": message.to_string() })
}

/// Metrics endpoint handler
async fn metrics_handler(manager: SubscriptionManagerData) -> impl Responder {
	update_system_metrics();
	update_subscription_metrics(&manager.snapshot().await);

	match gather_metrics() {
		Ok(buffer) => HttpResponse::Ok()
			.content_type("text/plain; version=0.0.4; charset=utf-8")
			.body(buffer),
		Err(e) => {
			error!("Error gathering metrics: {}", e);
			HttpResponse::InternalServerError().finish()
		}
	}
}

async fn list_subscriptions_handler(manager: SubscriptionManagerData) -> impl Responder {
	HttpResponse::Ok().json(manager.snapshot().await)
}

async fn subscribe_handler(
	manager: SubscriptionManagerData,
	request: web::Json<SubscriptionRequest>,
) -> impl Responder {
	let (address, recipient) = match request.parse() {
		Ok(parsed) => parsed,
		Err(e) => return HttpResponse::BadRequest().json(error_body(e)),
	};

	match manager.subscribe(address, recipient).await {
		Ok(changed) => HttpResponse::Ok().json(SubscriptionResponse { changed }),
		Err(e) => HttpResponse::InternalServerError().json(error_body(e)),
	}
}

async fn unsubscribe_handler(
	manager: SubscriptionManagerData,
	request: web::Json<SubscriptionRequest>,
) -> impl Responder {
	let (address, recipient) = match request.parse() {
		Ok(parsed) => parsed,
		Err(e) => return HttpResponse::BadRequest().json(error_body(e)),
	};

	match manager.unsubscribe(&address, &recipient).await {
		Ok(changed) => HttpResponse::Ok().json(SubscriptionResponse { changed }),
		Err(e) => HttpResponse::InternalServerError().json(error_body(e)),
	}
}

/// Registers every route on an actix service config
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.route("/metrics", web::get().to(metrics_handler)).service(
		web::resource("/subscriptions")
			.route(web::get().to(list_subscriptions_handler))
			.route(web::post().to(subscribe_handler))
			.route(web::delete().to(unsubscribe_handler)),
	);
}

/// Inside Docker the server listens on every interface, keeping the requested port
pub fn resolve_bind_address(bind_address: &str, in_docker: bool) -> String {
	if !in_docker {
		return bind_address.to_string();
	}
	match bind_address.split(':').nth(1) {
		Some(port) => format!("0.0.0.0:{}", port),
		None => "0.0.0.0:8081".to_string(),
	}
}

// Create metrics server
pub fn create_metrics_server(
	bind_address: String,
	manager: SubscriptionManagerArc,
) -> std::io::Result<actix_web::dev::Server> {
	let in_docker = std::env::var("IN_DOCKER").unwrap_or_default() == "true";
	let actual_bind_address = resolve_bind_address(&bind_address, in_docker);

	info!(
		"Starting metrics server on {} (actual bind: {})",
		bind_address, actual_bind_address
	);

	Ok(HttpServer::new(move || {
		App::new()
			.wrap(Compress::default())
			.wrap(NormalizePath::trim())
			.wrap(DefaultHeaders::new())
			.app_data(web::Data::new(manager.clone()))
			.configure(configure_routes)
	})
	.workers(2)
	.bind(actual_bind_address)?
	.shutdown_timeout(5)
	.run())
}
