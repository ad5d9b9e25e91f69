use async_trait::async_trait;
use mockall::mock;

use address_watcher::{
	models::{Address, AddressSummary, NotificationMessage, Recipient},
	services::{
		gateway::{GatewayError, LedgerGateway},
		notification::{NotificationError, Notifier},
	},
};

mock! {
	/// Mock implementation of the ledger query gateway.
	pub LedgerGateway {}

	#[async_trait]
	impl LedgerGateway for LedgerGateway {
		async fn get_address_summary(&self, address: &Address) -> Result<AddressSummary, GatewayError>;
	}
}

mock! {
	/// Mock implementation of a notification channel.
	pub Notifier {}

	#[async_trait]
	impl Notifier for Notifier {
		async fn notify(&self, recipient: &Recipient, message: &NotificationMessage) -> Result<(), NotificationError>;
	}
}
