//! Core services implementing the business logic.
//!
//! This module contains the main service implementations:
//! - `gateway`: Ledger query gateway interface and HTTP client
//! - `notification`: Notification delivery
//! - `watcher`: Scheduling, change detection and subscription state

pub mod gateway;
pub mod notification;
pub mod watcher;
