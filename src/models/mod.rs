//! Domain models and data structures for address watching.
//!
//! This module contains all the core data structures used throughout the application:
//!
//! - `config`: Configuration loading and validation
//! - `core`: Core domain models (Address, SubscriptionStore, PollResult)
//! - `security`: Security models (Secret)

mod config;
mod core;
mod security;

// Re-export core types
pub use core::{
	Address, AddressSummary, NotificationMessage, PollResult, Recipient, SubscriptionStore,
	TransactionId,
};

// Re-export config types
pub use config::{ConfigError, NotifierConfig, WatchConfig};

// Re-export security types
pub use security::SecretString;
