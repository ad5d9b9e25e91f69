//! Ledger query gateway interface.

use async_trait::async_trait;

use crate::{
	models::{Address, AddressSummary, PollResult},
	services::gateway::GatewayError,
};

/// Read access to the current state of an address
///
/// Implementations are shared across concurrently running polls.
#[async_trait]
pub trait LedgerGateway: Send + Sync + 'static {
	/// Fetches the current summary of `address`
	///
	/// # Returns
	/// * `Ok(AddressSummary)` - The gateway knows the address
	/// * `Err(GatewayError::NotFound)` - The address has no on-chain record
	/// * `Err(_)` - Any other failure, treated as transient
	async fn get_address_summary(&self, address: &Address)
		-> Result<AddressSummary, GatewayError>;

	/// Runs one lookup and folds the outcome into a [`PollResult`]
	async fn poll(&self, address: &Address) -> PollResult {
		match self.get_address_summary(address).await {
			Ok(summary) => PollResult::Found(summary),
			Err(e) if e.is_not_found() => PollResult::NotFound,
			Err(e) => PollResult::Failed(e.to_string()),
		}
	}
}
