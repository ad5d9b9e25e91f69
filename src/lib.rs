//! Address watch and notification service.
//!
//! This library provides a polling worker that tracks a set of subscribed addresses,
//! detects new transaction activity through a ledger query gateway, and notifies the
//! subscribers of each address at most once per new transaction. It includes:
//!
//! - Environment based configuration
//! - A durable JSON subscription store
//! - Telegram, webhook and log notification channels
//! - Prometheus metrics and a subscription control API
//!
//! # Module Structure
//!
//! - `bootstrap`: Bootstraps the application
//! - `models`: Data structures for configuration, subscriptions and gateway data
//! - `repositories`: Subscription storage
//! - `services`: Core business logic and outbound integrations
//! - `utils`: Common utilities and helper functions

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
