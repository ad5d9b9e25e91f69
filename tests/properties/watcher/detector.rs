use crate::properties::strategies::{address_strategy, poll_sequence_strategy};

use address_watcher::{
	models::{PollResult, TransactionId},
	services::watcher::{ChangeDetector, Outcome},
};
use proptest::{prelude::*, test_runner::Config};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	// Outcomes match a straightforward model of "last id seen on a successful poll"
	#[test]
	fn test_outcomes_follow_last_seen_model(
		address in address_strategy(),
		polls in poll_sequence_strategy(),
	) {
		let mut detector = ChangeDetector::new();
		let mut model: Option<Option<TransactionId>> = None;

		for poll in &polls {
			let outcome = detector.observe(&address, poll);

			let expected = match (poll, model.clone()) {
				(PollResult::NotFound | PollResult::Failed(_), _) => Outcome::NoChange,
				(PollResult::Found(summary), None) => {
					model = Some(summary.last_transaction_id.clone());
					Outcome::Baseline(summary.last_transaction_id.clone())
				}
				(PollResult::Found(summary), Some(previous)) => match &summary.last_transaction_id {
					Some(current) if previous.as_ref() != Some(current) => {
						let outcome = Outcome::Changed {
							previous: previous.clone(),
							current: current.clone(),
						};
						model = Some(Some(current.clone()));
						outcome
					}
					_ => Outcome::NoChange,
				},
			};

			prop_assert_eq!(&outcome, &expected);
			prop_assert_eq!(detector.last_seen(&address), model.as_ref());
		}
	}

	// A change is reported at most once per distinct transition
	#[test]
	fn test_changes_never_repeat_the_same_id(
		address in address_strategy(),
		polls in poll_sequence_strategy(),
	) {
		let mut detector = ChangeDetector::new();
		let mut last_reported: Option<TransactionId> = None;

		for poll in &polls {
			if let Outcome::Changed { previous, current } = detector.observe(&address, poll) {
				prop_assert_ne!(previous.as_ref(), Some(&current));
				prop_assert_ne!(last_reported.as_ref(), Some(&current));
				last_reported = Some(current);
			}
		}
	}

	// Failed and not-found polls leave LastSeen untouched
	#[test]
	fn test_unsuccessful_polls_never_advance(
		address in address_strategy(),
		polls in poll_sequence_strategy(),
	) {
		let mut detector = ChangeDetector::new();

		for poll in &polls {
			let before = detector.last_seen(&address).cloned();
			detector.observe(&address, poll);
			if !matches!(poll, PollResult::Found(_)) {
				prop_assert_eq!(detector.last_seen(&address).cloned(), before);
			}
		}
	}

	// Nothing before the first successful poll counts as a change
	#[test]
	fn test_first_success_is_a_silent_baseline(
		address in address_strategy(),
		polls in poll_sequence_strategy(),
	) {
		let mut detector = ChangeDetector::new();
		let outcomes: Vec<Outcome> = polls
			.iter()
			.map(|poll| detector.observe(&address, poll))
			.collect();

		match polls.iter().position(|poll| matches!(poll, PollResult::Found(_))) {
			Some(first) => {
				prop_assert!(outcomes[..first].iter().all(|o| *o == Outcome::NoChange));
				prop_assert!(matches!(outcomes[first], Outcome::Baseline(_)));
				prop_assert_eq!(
					outcomes.iter().filter(|o| matches!(o, Outcome::Baseline(_))).count(),
					1
				);
			}
			None => {
				prop_assert!(outcomes.iter().all(|o| *o == Outcome::NoChange));
				prop_assert!(detector.last_seen(&address).is_none());
			}
		}
	}
}
