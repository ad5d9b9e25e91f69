//! Change detection for watched addresses.
//!
//! The [`ChangeDetector`] remembers, per address, the last transaction id it observed
//! (its LastSeen entry) and classifies each poll result against it:
//!
//! - a failed or not-found lookup is never activity and never moves LastSeen
//! - the first successful poll establishes a baseline without notifying
//! - an unchanged id is no change
//! - a different id is a change, and LastSeen moves before anything is dispatched
//!
//! Only the latest id is compared, so several transactions between two polls surface as
//! a single change.

use std::collections::HashMap;

use crate::models::{Address, PollResult, TransactionId};

/// What a single poll means for an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	/// Nothing to report; LastSeen untouched
	NoChange,
	/// First successful observation; LastSeen set, nobody is notified
	Baseline(Option<TransactionId>),
	/// A new latest transaction; LastSeen moved to `current`
	Changed {
		previous: Option<TransactionId>,
		current: TransactionId,
	},
}

impl Outcome {
	pub fn label(&self) -> &'static str {
		match self {
			Self::NoChange => "no_change",
			Self::Baseline(_) => "baseline",
			Self::Changed { .. } => "changed",
		}
	}

	pub fn is_changed(&self) -> bool {
		matches!(self, Self::Changed { .. })
	}
}

/// Classifies `poll` against the stored LastSeen entry.
///
/// `last_seen` is `None` when the address has no entry yet, and `Some(None)` when it
/// was observed without any transaction.
pub fn evaluate(poll: &PollResult, last_seen: Option<&Option<TransactionId>>) -> Outcome {
	let observed = match poll {
		PollResult::Found(summary) => summary.last_transaction_id.as_ref(),
		PollResult::NotFound | PollResult::Failed(_) => return Outcome::NoChange,
	};

	let Some(previous) = last_seen else {
		return Outcome::Baseline(observed.cloned());
	};

	match observed {
		// The gateway lost sight of the transaction history; keep what we know
		None => Outcome::NoChange,
		Some(current) if previous.as_ref() == Some(current) => Outcome::NoChange,
		Some(current) => Outcome::Changed {
			previous: previous.clone(),
			current: current.clone(),
		},
	}
}

/// Per-address LastSeen memory
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
	last_seen: HashMap<Address, Option<TransactionId>>,
}

impl ChangeDetector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Evaluates `poll` for `address` and applies the resulting LastSeen update.
	///
	/// Synchronous so that the comparison and the update cannot be separated.
	pub fn observe(&mut self, address: &Address, poll: &PollResult) -> Outcome {
		let outcome = evaluate(poll, self.last_seen.get(address));
		match &outcome {
			Outcome::NoChange => {}
			Outcome::Baseline(observed) => {
				self.last_seen.insert(address.clone(), observed.clone());
			}
			Outcome::Changed { current, .. } => {
				self.last_seen
					.insert(address.clone(), Some(current.clone()));
			}
		}
		outcome
	}

	pub fn last_seen(&self, address: &Address) -> Option<&Option<TransactionId>> {
		self.last_seen.get(address)
	}

	/// Drops the LastSeen entry of `address`, returning whether one existed
	pub fn forget(&mut self, address: &Address) -> bool {
		self.last_seen.remove(address).is_some()
	}

	/// Restores previously persisted entries, replacing any existing ones
	pub fn seed(&mut self, entries: impl IntoIterator<Item = (Address, Option<TransactionId>)>) {
		self.last_seen.extend(entries);
	}
}
