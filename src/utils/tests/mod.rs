//! Test helper utilities
//!
//! This module contains test helper utilities for the application.
//!
//! - `builders`: Test helper utilities for creating test instances of models
//! - `doubles`: In-memory gateway, notifier and storage implementations
//! - `http`: Test helper utilities for creating HTTP clients

pub mod builders {
	pub mod subscriptions;
	pub mod watch_config;
}


pub use builders::*;
pub use http::*;
