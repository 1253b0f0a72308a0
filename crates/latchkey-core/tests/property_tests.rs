//! Property-based tests for latchkey-core using proptest
//!
//! These tests verify counter and generation invariants for arbitrary
//! sequences of attempts.

use proptest::prelude::*;
use latchkey_core::{AttemptCounter, FailureVerdict, Generation};

#[derive(Debug, Clone, Copy)]
enum Attempt {
    Correct,
    Wrong,
}

fn arb_attempt() -> impl Strategy<Value = Attempt> {
    prop_oneof![Just(Attempt::Correct), Just(Attempt::Wrong)]
}

proptest! {
    /// The stored count never reaches the threshold
    #[test]
    fn counter_stays_below_threshold(
        threshold in 1u32..10,
        attempts in prop::collection::vec(arb_attempt(), 0..200),
    ) {
        let mut counter = AttemptCounter::new(threshold);
        for attempt in attempts {
            match attempt {
                Attempt::Correct => counter.reset(),
                Attempt::Wrong => {
                    counter.record_failure();
                }
            }
            prop_assert!(counter.count() < threshold);
        }
    }

    /// An alarm fires exactly on every `threshold`-th consecutive failure
    #[test]
    fn alarm_every_threshold_failures(threshold in 1u32..10, failures in 0u32..100) {
        let mut counter = AttemptCounter::new(threshold);
        let mut alarms = 0;
        for i in 1..=failures {
            match counter.record_failure() {
                FailureVerdict::Alarm { count } => {
                    prop_assert_eq!(count, threshold);
                    prop_assert_eq!(i % threshold, 0);
                    alarms += 1;
                }
                FailureVerdict::Warn { count } => {
                    prop_assert_eq!(count, i % threshold);
                }
            }
        }
        prop_assert_eq!(alarms, failures / threshold);
    }

    /// Reset after any prefix always restarts numbering at one
    #[test]
    fn reset_restarts_numbering(threshold in 2u32..10, prefix in 0u32..20) {
        let mut counter = AttemptCounter::new(threshold);
        for _ in 0..prefix {
            counter.record_failure();
        }
        counter.reset();
        prop_assert_eq!(counter.record_failure(), FailureVerdict::Warn { count: 1 });
    }

    /// Generations are strictly increasing
    #[test]
    fn generations_strictly_increase(steps in 1usize..500) {
        let mut g = Generation::ZERO;
        for _ in 0..steps {
            let next = g.next();
            prop_assert!(next > g);
            g = next;
        }
        prop_assert_eq!(g.value(), steps as u64);
    }
}
