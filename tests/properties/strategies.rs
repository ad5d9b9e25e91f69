use address_watcher::models::{Address, AddressSummary, PollResult, Recipient, TransactionId};
use proptest::{option, prelude::*};

pub const MAX_SEQUENCE_LENGTH: usize = 40;

/// Transaction ids are drawn from a small pool so that repeats are common
pub fn transaction_id_strategy() -> impl Strategy<Value = TransactionId> {
	"tx[0-3]".prop_map(TransactionId::new)
}

pub fn poll_result_strategy() -> impl Strategy<Value = PollResult> {
	prop_oneof![
		6 => option::weighted(0.9, transaction_id_strategy()).prop_map(|id| {
			PollResult::Found(AddressSummary {
				address: None,
				last_transaction_id: id,
				balance: None,
				transaction_count: None,
			})
		}),
		1 => Just(PollResult::NotFound),
		2 => "[a-z ]{1,20}".prop_map(PollResult::Failed),
	]
}

pub fn poll_sequence_strategy() -> impl Strategy<Value = Vec<PollResult>> {
	prop::collection::vec(poll_result_strategy(), 1..MAX_SEQUENCE_LENGTH)
}

pub fn address_strategy() -> impl Strategy<Value = Address> {
	"G[A-D]{1,2}".prop_map(|s| Address::new(s).unwrap())
}

pub fn recipient_strategy() -> impl Strategy<Value = Recipient> {
	"[1-4]".prop_map(|s| Recipient::new(s).unwrap())
}

/// One mutation of a subscription store
#[derive(Debug, Clone)]
pub enum SubscriptionOp {
	Subscribe(Address, Recipient),
	Unsubscribe(Address, Recipient),
}

pub fn subscription_ops_strategy() -> impl Strategy<Value = Vec<SubscriptionOp>> {
	prop::collection::vec(
		prop_oneof![
			(address_strategy(), recipient_strategy())
				.prop_map(|(a, r)| SubscriptionOp::Subscribe(a, r)),
			(address_strategy(), recipient_strategy())
				.prop_map(|(a, r)| SubscriptionOp::Unsubscribe(a, r)),
		],
		0..MAX_SEQUENCE_LENGTH,
	)
}
