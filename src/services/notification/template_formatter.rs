//! Template formatter implementation.
//!
//! Renders the configured title and body templates for one detected change. Variables
//! use the `${name}` syntax; unknown variables are left untouched.

use std::collections::HashMap;

use crate::models::{Address, NotificationMessage, Recipient, TransactionId};

/// Formats a message template by substituting variables
///
/// # Arguments
/// * `template` - The message template with variables like ${...}
/// * `variables` - The map of variables to substitute into the template
pub fn format_template(template: &str, variables: &HashMap<String, String>) -> String {
	let mut message = template.to_string();
	for (key, value) in variables {
		message = message.replace(&format!("${{{}}}", key), value);
	}
	message
}

/// Variables available to notification templates for a change on `address`
///
/// `previous_transaction_id` is empty when the address had no transaction before.
pub fn change_variables(
	address: &Address,
	previous: Option<&TransactionId>,
	current: &TransactionId,
	recipient: &Recipient,
) -> HashMap<String, String> {
	HashMap::from([
		("address".to_string(), address.to_string()),
		("transaction_id".to_string(), current.to_string()),
		(
			"previous_transaction_id".to_string(),
			previous.map(ToString::to_string).unwrap_or_default(),
		),
		("recipient".to_string(), recipient.to_string()),
	])
}

/// Renders both parts of `template` with `variables`
pub fn render_message(
	template: &NotificationMessage,
	variables: &HashMap<String, String>,
) -> NotificationMessage {
	NotificationMessage {
		title: format_template(&template.title, variables),
		body: format_template(&template.body, variables),
	}
}
