//! Address watching service.
//!
//! - `detector`: LastSeen memory and change classification
//! - `state`: shared watch state and the subscription registry
//! - `storage`: optional LastSeen persistence
//! - `service`: the tick loop and per-address evaluation

mod detector;
mod error;
mod service;
mod state;
mod storage;

pub use detector::{evaluate, ChangeDetector, Outcome};
pub use error::WatcherError;
pub use service::{AddressWatcherService, PollReport, TickSummary, WatchSettings};
pub use state::{Evaluation, SubscriptionManager, WatchRegistry, WatchState};
pub use storage::{
	FileLastSeenStorage, LastSeenEntries, LastSeenStorage, VolatileLastSeenStorage,
};
