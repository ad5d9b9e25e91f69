//! Mock implementations of repository traits.
//!
//! - [`MockSubscriptionRepository`] - Mock implementation of the subscription repository
//!
//! These mocks allow testing persistence-dependent functionality without actual file
//! system operations.

use async_trait::async_trait;
use mockall::mock;

use address_watcher::{
	models::SubscriptionStore,
	repositories::{RepositoryError, SubscriptionRepositoryTrait},
};

mock! {
	/// Mock implementation of the subscription repository.
	pub SubscriptionRepository {}

	#[async_trait]
	impl SubscriptionRepositoryTrait for SubscriptionRepository {
		async fn load(&self) -> Result<SubscriptionStore, RepositoryError>;
		async fn save(&self, store: &SubscriptionStore) -> Result<(), RepositoryError>;
	}
}
