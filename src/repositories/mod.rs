//! Repository implementations for durable watcher data.
//!
//! Currently supported repositories:
//! - Subscription: loads and saves the address to recipients mapping as a JSON file

mod error;
mod subscription;

pub use error::RepositoryError;
pub(crate) use subscription::write_atomically;
pub use subscription::{FileSubscriptionRepository, SubscriptionRepositoryTrait};
