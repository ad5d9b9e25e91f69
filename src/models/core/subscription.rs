//! The subscription store: which recipients watch which addresses.

use serde::{
	de::{self, MapAccess, Visitor},
	Deserialize, Deserializer, Serialize,
};
use std::{
	collections::{BTreeMap, BTreeSet},
	fmt,
};

use crate::models::{Address, Recipient};

type Entries = BTreeMap<Address, BTreeSet<Recipient>>;

/// Mapping of address to the set of recipients subscribed to it.
///
/// An address is present only while at least one recipient watches it. The serialized
/// form is a JSON object of address to recipient array. Entries with an empty recipient
/// array are dropped on load; an address that appears twice, also after trimming, is
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Entries")]
pub struct SubscriptionStore {
	entries: Entries,
}

impl SubscriptionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `recipient` to the watchers of `address`.
	///
	/// Returns `false` when the pair was already subscribed.
	pub fn subscribe(&mut self, address: Address, recipient: Recipient) -> bool {
		self.entries.entry(address).or_default().insert(recipient)
	}

	/// Removes `recipient` from the watchers of `address`.
	///
	/// When the last recipient goes, the address entry goes with it. Returns `false` when
	/// the pair was not subscribed.
	pub fn unsubscribe(&mut self, address: &Address, recipient: &Recipient) -> bool {
		let Some(recipients) = self.entries.get_mut(address) else {
			return false;
		};
		let removed = recipients.remove(recipient);
		if recipients.is_empty() {
			self.entries.remove(address);
		}
		removed
	}

	/// Snapshot of every address with at least one recipient
	pub fn addresses(&self) -> Vec<Address> {
		self.entries.keys().cloned().collect()
	}

	/// Snapshot of the recipients of `address`, empty when it is not watched
	pub fn recipients(&self, address: &Address) -> Vec<Recipient> {
		self.entries
			.get(address)
			.map(|recipients| recipients.iter().cloned().collect())
			.unwrap_or_default()
	}

	pub fn contains(&self, address: &Address) -> bool {
		self.entries.contains_key(address)
	}

	pub fn is_subscribed(&self, address: &Address, recipient: &Recipient) -> bool {
		self.entries
			.get(address)
			.is_some_and(|recipients| recipients.contains(recipient))
	}

	/// Number of watched addresses
	pub fn address_count(&self) -> usize {
		self.entries.len()
	}

	/// Number of (address, recipient) pairs
	pub fn subscription_count(&self) -> usize {
		self.entries.values().map(BTreeSet::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Address, &BTreeSet<Recipient>)> {
		self.entries.iter()
	}
}

struct SubscriptionStoreVisitor;

impl<'de> Visitor<'de> for SubscriptionStoreVisitor {
	type Value = SubscriptionStore;

	fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
		formatter.write_str("a map of address to a list of recipients")
	}

	fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
	where
		A: MapAccess<'de>,
	{
		let mut seen = BTreeSet::new();
		let mut entries = Entries::new();

		while let Some((address, recipients)) =
			map.next_entry::<Address, BTreeSet<Recipient>>()?
		{
			if !seen.insert(address.clone()) {
				return Err(de::Error::custom(format!(
					"duplicate address '{}'",
					address
				)));
			}
			if !recipients.is_empty() {
				entries.insert(address, recipients);
			}
		}

		Ok(SubscriptionStore { entries })
	}
}

impl<'de> Deserialize<'de> for SubscriptionStore {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_map(SubscriptionStoreVisitor)
	}
}

impl From<SubscriptionStore> for Entries {
	fn from(store: SubscriptionStore) -> Self {
		store.entries
	}
}
