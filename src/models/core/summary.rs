//! Gateway response data and the transient result of one poll.

use serde::{Deserialize, Serialize};

use crate::models::TransactionId;

/// Current state of an address as reported by the ledger query gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSummary {
	/// Address echoed back by the gateway, when it does so
	#[serde(default)]
	pub address: Option<String>,

	/// Id of the most recent transaction, `None` when the address has none yet
	#[serde(default, alias = "lastTransactionId")]
	pub last_transaction_id: Option<TransactionId>,

	#[serde(default)]
	pub balance: Option<String>,

	#[serde(default, alias = "transactionCount")]
	pub transaction_count: Option<u64>,
}

impl AddressSummary {
	/// Summary carrying only a last transaction id
	pub fn with_last_transaction(id: impl Into<String>) -> Self {
		Self {
			address: None,
			last_transaction_id: Some(TransactionId::new(id)),
			balance: None,
			transaction_count: None,
		}
	}
}

/// Outcome of one gateway lookup. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
	Found(AddressSummary),
	/// The gateway has no record of the address
	NotFound,
	/// The lookup failed or timed out
	Failed(String),
}

impl PollResult {
	/// Label used for logging and metrics
	pub fn label(&self) -> &'static str {
		match self {
			Self::Found(_) => "found",
			Self::NotFound => "not_found",
			Self::Failed(_) => "failed",
		}
	}
}
