//! Metrics module for the application.
//!
//! - This module contains the global Prometheus registry.
//! - Defines specific metrics for the application.

pub mod server;
use lazy_static::lazy_static;
use prometheus::{
	Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use sysinfo::{Disks, System};

use crate::models::SubscriptionStore;

lazy_static! {
	/// Global Prometheus registry.
	///
	/// This registry holds all metrics defined in this module and is used
	/// to gather metrics for exposure via the metrics endpoint.
	pub static ref REGISTRY: Registry = Registry::new();

	/// Gauge for CPU usage percentage.
	///
	/// Tracks the current CPU usage as a percentage (0-100) across all cores.
	pub static ref CPU_USAGE: Gauge = {
	  let gauge = Gauge::new("cpu_usage_percentage", "Current CPU usage percentage").unwrap();
	  REGISTRY.register(Box::new(gauge.clone())).unwrap();
	  gauge
	};

	/// Gauge for memory usage percentage.
	pub static ref MEMORY_USAGE_PERCENT: Gauge = {
	  let gauge = Gauge::new("memory_usage_percentage", "Memory usage percentage").unwrap();
	  REGISTRY.register(Box::new(gauge.clone())).unwrap();
	  gauge
	};

	/// Gauge for memory usage in bytes.
	pub static ref MEMORY_USAGE: Gauge = {
		let gauge = Gauge::new("memory_usage_bytes", "Memory usage in bytes").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Gauge for total memory in bytes.
	pub static ref TOTAL_MEMORY: Gauge = {
	  let gauge = Gauge::new("total_memory_bytes", "Total memory in bytes").unwrap();
	  REGISTRY.register(Box::new(gauge.clone())).unwrap();
	  gauge
	};

	/// Gauge for used disk space in bytes, summed across mounted filesystems.
	pub static ref DISK_USAGE: Gauge = {
	  let gauge = Gauge::new("disk_usage_bytes", "Used disk space in bytes").unwrap();
	  REGISTRY.register(Box::new(gauge.clone())).unwrap();
	  gauge
	};

	/// Counter of completed polls, labelled by result (`found`, `not_found`, `failed`).
	pub static ref POLLS_TOTAL: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("address_polls_total", "Number of completed address polls"),
			&["result"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter of polls skipped because the previous poll of the address was still running.
	pub static ref POLLS_SKIPPED: IntCounter = {
		let counter = IntCounter::new(
			"address_polls_skipped_total",
			"Number of polls skipped because one was already in flight"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter of detected transaction changes.
	pub static ref CHANGES_DETECTED: IntCounter = {
		let counter = IntCounter::new(
			"address_changes_detected_total",
			"Number of detected address changes"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter of established baselines.
	pub static ref BASELINES_ESTABLISHED: IntCounter = {
		let counter = IntCounter::new(
			"address_baselines_total",
			"Number of established address baselines"
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter of notification deliveries, labelled by status (`delivered`, `failed`).
	pub static ref NOTIFICATIONS_TOTAL: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("notifications_total", "Number of notification deliveries"),
			&["status"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Gauge for the number of addresses with at least one subscriber.
	pub static ref SUBSCRIBED_ADDRESSES: IntGauge = {
		let gauge = IntGauge::new(
			"subscribed_addresses",
			"Number of subscribed addresses"
		).unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Gauge for the number of (address, recipient) pairs.
	pub static ref SUBSCRIPTION_PAIRS: IntGauge = {
		let gauge = IntGauge::new(
			"subscription_pairs",
			"Number of address and recipient pairs"
		).unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};
}

/// Gather all metrics and encode into the provided format.
pub fn gather_metrics() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
	let encoder = TextEncoder::new();
	let metric_families = REGISTRY.gather();
	let mut buffer = Vec::new();
	encoder.encode(&metric_families, &mut buffer)?;
	Ok(buffer)
}

/// Updates the system metrics for CPU, memory and disk usage.
pub fn update_system_metrics() {
	let mut sys = System::new_all();
	sys.refresh_all();

	CPU_USAGE.set(sys.global_cpu_usage() as f64);

	let total_memory = sys.total_memory();
	TOTAL_MEMORY.set(total_memory as f64);

	let memory_usage = sys.used_memory();
	MEMORY_USAGE.set(memory_usage as f64);

	let memory_percentage = if total_memory > 0 {
		(memory_usage as f64 / total_memory as f64) * 100.0
	} else {
		0.0
	};
	MEMORY_USAGE_PERCENT.set(memory_percentage);

	let disks = Disks::new_with_refreshed_list();
	let used_disk_space: u64 = disks
		.list()
		.iter()
		.map(|disk| disk.total_space().saturating_sub(disk.available_space()))
		.sum();
	DISK_USAGE.set(used_disk_space as f64);
}

/// Updates the subscription gauges from a store snapshot.
pub fn update_subscription_metrics(store: &SubscriptionStore) {
	SUBSCRIBED_ADDRESSES.set(store.address_count() as i64);
	SUBSCRIPTION_PAIRS.set(store.subscription_count() as i64);
}
