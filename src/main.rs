//! Address watcher entry point.
//!
//! This binary provides the main entry point for the address watch service. It loads
//! the configuration, restores the subscription store, and polls every subscribed
//! address until interrupted.
//!
//! # Flow
//! 1. Loads the configuration from the environment (and `.env`)
//! 2. Loads the subscription store, refusing to start on a corrupt file
//! 3. Restores LastSeen state when it is persisted
//! 4. Starts the optional metrics and subscription control server
//! 5. Polls addresses on every tick and notifies subscribers of new transactions
//! 6. Handles graceful shutdown on Ctrl+C

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

use crate::{
	bootstrap::{create_watcher_service, initialize_services, subscription_repository, Result},
	models::WatchConfig,
	repositories::SubscriptionRepositoryTrait,
	services::watcher::{FileLastSeenStorage, LastSeenStorage, VolatileLastSeenStorage},
	utils::{
		constants::DEFAULT_METRICS_ADDRESS,
		logging::setup_logging,
		metrics::server::{create_metrics_server, SubscriptionManagerArc},
		parse_string_to_bytes_size,
	},
};

use clap::Parser;
use dotenvy::dotenv_override;
use std::env::{set_var, var};
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(
	name = "address-watcher",
	about = "A polling worker that watches subscribed addresses and notifies subscribers of new transactions.",
	version
)]
struct Cli {
	/// Write logs to file instead of stdout
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Address to start the metrics server on (default: 127.0.0.1:8081)
	#[arg(long, value_name = "HOST:PORT")]
	metrics_address: Option<String>,

	/// Enable metrics server
	#[arg(long)]
	metrics: bool,

	/// Validate the configuration and the subscription file without starting the service
	#[arg(long)]
	check: bool,

	/// Run a single tick and exit
	#[arg(long)]
	once: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		// Reload environment variables from .env file
		// Override any existing environment variables
		dotenv_override().ok();

		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		// Set log level from RUST_LOG if it exists
		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}

		if self.metrics {
			set_var("METRICS_ENABLED", "true");
		}

		if let Some(address) = &self.metrics_address {
			// Extract port from address if it's in HOST:PORT format
			if let Some(port) = address.split(':').nth(1) {
				set_var("METRICS_PORT", port);
			}
		}
	}

	/// Requested metrics address; the Docker bind is resolved by the metrics server
	fn metrics_address(&self) -> String {
		self.metrics_address
			.clone()
			.or_else(|| {
				var("METRICS_PORT")
					.ok()
					.map(|port| format!("127.0.0.1:{}", port))
			})
			.unwrap_or_else(|| DEFAULT_METRICS_ADDRESS.to_string())
	}
}

/// Main entry point for the address watch service.
///
/// # Errors
/// Returns an error if the configuration is invalid, the stores cannot be loaded or
/// service initialization fails.
#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	let config =
		WatchConfig::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

	if cli.check {
		return validate_configuration(&config).await;
	}

	// LastSeen is memory-only unless a file is configured
	match config.last_seen_path.clone() {
		Some(path) => {
			info!(path = %path.display(), "LastSeen persisted to file");
			run(&cli, config, FileLastSeenStorage::new(path)).await
		}
		None => {
			info!("LastSeen kept in memory, a restart re-establishes baselines");
			run(&cli, config, VolatileLastSeenStorage).await
		}
	}
}

async fn run<S: LastSeenStorage>(
	cli: &Cli,
	config: WatchConfig,
	last_seen_storage: S,
) -> Result<()> {
	let repository = subscription_repository(&config);
	let services = initialize_services(config, repository, last_seen_storage)
		.await
		.map_err(|e| anyhow::anyhow!("Failed to initialize services: {}", e))?;
	let watcher = create_watcher_service(&services);

	if cli.once {
		for report in watcher.run_once().await {
			info!(
				address = %report.address,
				result = report.result,
				outcome = report.outcome.as_ref().map(|o| o.label()).unwrap_or("discarded"),
				delivered = report.delivered,
				failed = report.failed,
				"Poll completed"
			);
		}
		return Ok(());
	}

	let metrics_enabled =
		cli.metrics || var("METRICS_ENABLED").map(|v| v == "true").unwrap_or(false);

	let metrics_server = if metrics_enabled {
		let metrics_address = cli.metrics_address();
		info!("Metrics server enabled, starting on {}", metrics_address);

		let manager: SubscriptionManagerArc = services.registry.clone();
		match create_metrics_server(metrics_address, manager) {
			Ok(server) => Some(server),
			Err(e) => {
				error!("Failed to create metrics server: {}", e);
				None
			}
		}
	} else {
		info!("Metrics server disabled. Use --metrics flag or METRICS_ENABLED=true to enable");
		None
	};

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let watcher_task = {
		let watcher = watcher.clone();
		tokio::spawn(async move { watcher.run(shutdown_rx).await })
	};

	info!("Service started. Press Ctrl+C to shutdown");

	let ctrl_c = tokio::signal::ctrl_c();

	if let Some(metrics_future) = metrics_server {
		tokio::select! {
			result = ctrl_c => {
				if let Err(e) = result {
					error!("Error waiting for Ctrl+C: {}", e);
				}
				info!("Shutdown signal received, stopping services...");
			}
			result = metrics_future => {
				if let Err(e) = result {
					error!("Metrics server error: {}", e);
				}
				info!("Metrics server stopped, shutting down services...");
			}
		}
	} else {
		let _ = ctrl_c.await;
		info!("Shutdown signal received, stopping services...");
	}

	let _ = shutdown_tx.send(true);

	match watcher_task.await {
		Ok(Ok(())) => {}
		Ok(Err(e)) => error!("Watcher stopped with an error: {}", e),
		Err(e) => error!("Watcher task failed: {}", e),
	}

	info!("Shutdown complete");
	Ok(())
}

/// Validates the configuration and the persisted stores
async fn validate_configuration(config: &WatchConfig) -> Result<()> {
	info!("Validating configuration...");
	info!(
		"✓ Configuration is valid (gateway: {}, notifier: {})",
		config.gateway_base_url,
		config.notifier.kind()
	);

	let subscriptions = subscription_repository(config)
		.load()
		.await
		.map_err(|e| anyhow::anyhow!("Subscription file is invalid: {}", e))?;
	info!(
		"✓ Found {} subscribed address(es) with {} subscription(s)",
		subscriptions.address_count(),
		subscriptions.subscription_count()
	);

	if let Some(path) = &config.last_seen_path {
		let entries = FileLastSeenStorage::new(path)
			.load()
			.await
			.map_err(|e| anyhow::anyhow!("LastSeen file is invalid: {}", e))?;
		info!("✓ Found {} LastSeen entries", entries.len());
	}

	info!("Configuration validation completed successfully!");
	Ok(())
}
