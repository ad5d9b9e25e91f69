//! Core domain models for the address watcher.
//!
//! This module contains the fundamental data structures that represent:
//! - Identifiers: addresses, recipients and transaction ids
//! - Subscriptions: which recipients watch which addresses
//! - Poll results: what the gateway reported for an address
//! - Messages: the rendered notification sent to a recipient

mod address;
mod message;
mod subscription;
mod summary;

pub use address::{Address, Recipient, TransactionId};
pub use message::NotificationMessage;
pub use subscription::SubscriptionStore;
pub use summary::{AddressSummary, PollResult};
