//! Identifier newtypes used throughout the watcher.
//!
//! Addresses, recipients and transaction ids are opaque strings. Addresses and recipients
//! are trimmed and must be non-empty; transaction ids are compared verbatim.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

use crate::models::ConfigError;

fn validated(kind: &str, raw: &str) -> Result<String, ConfigError> {
	let trimmed = raw.trim();
	if trimmed.is_empty() {
		return Err(ConfigError::validation_error(
			format!("{} must not be empty", kind),
			None,
			Some(HashMap::from([("value".to_string(), raw.to_string())])),
		));
	}
	Ok(trimmed.to_string())
}

/// A watched account address, the key of a subscription
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
	/// Creates an address from user input, trimming surrounding whitespace
	pub fn new(raw: impl AsRef<str>) -> Result<Self, ConfigError> {
		validated("Address", raw.as_ref()).map(Self)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// A notification target such as a chat id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Recipient(String);

impl Recipient {
	/// Creates a recipient from user input, trimming surrounding whitespace
	pub fn new(raw: impl AsRef<str>) -> Result<Self, ConfigError> {
		validated("Recipient", raw.as_ref()).map(Self)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Opaque id of a ledger transaction as reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

macro_rules! impl_string_conversions {
	($($ty:ident),*) => {
		$(
			impl TryFrom<String> for $ty {
				type Error = ConfigError;

				fn try_from(value: String) -> Result<Self, Self::Error> {
					Self::new(value)
				}
			}

			impl From<$ty> for String {
				fn from(value: $ty) -> Self {
					value.0
				}
			}
		)*
	};
}

impl_string_conversions!(Address, Recipient);

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Display for Recipient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Display for TransactionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TransactionId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
