//! Configuration loading and validation.
//!
//! The watcher is configured from environment variables; see [`WatchConfig`].

#![allow(clippy::result_large_err)]

mod error;
mod watch_config;

pub use error::ConfigError;
pub use watch_config::{NotifierConfig, WatchConfig};
