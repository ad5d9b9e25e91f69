//! Gateway error types and handling.
//!
//! Every gateway failure is contained to the poll that produced it. `NotFound` is an
//! expected answer for fresh addresses and is not logged on creation.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents possible errors returned by the ledger query gateway
#[derive(ThisError, Debug)]
pub enum GatewayError {
	/// The gateway has no record of the address
	#[error("Address not found: {0}")]
	NotFound(ErrorContext),

	/// Network failure, timeout or unexpected status
	#[error("Transient gateway error: {0}")]
	Transient(ErrorContext),

	/// The gateway answered with a body that is not a valid summary
	#[error("Response parse error: {0}")]
	ResponseParse(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl GatewayError {
	// Not found
	pub fn not_found(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::NotFound(ErrorContext::new(msg, source, metadata))
	}

	// Transient error
	pub fn transient(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Transient(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Response parse error
	pub fn response_parse(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ResponseParse(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_))
	}
}

impl TraceableError for GatewayError {
	fn trace_id(&self) -> String {
		match self {
			Self::NotFound(ctx) => ctx.trace_id.clone(),
			Self::Transient(ctx) => ctx.trace_id.clone(),
			Self::ResponseParse(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
