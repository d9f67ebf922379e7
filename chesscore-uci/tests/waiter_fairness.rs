//! Given N always-signalled events and N successive
//! `wait` calls, each event index appears exactly once.

use proptest::prelude::*;

use chesscore_uci::event::{Event, WaitOutcome, Waiter};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn round_robin_visits_every_always_ready_event_once(n in 1usize..16) {
        let events: Vec<Event> = (0..n).map(|_| Event::user_signalled()).collect();
        for e in &events {
            e.set();
        }
        let refs: Vec<&Event> = events.iter().collect();
        let waiter = Waiter::new();

        let mut seen = Vec::with_capacity(n);
        for _ in 0..n {
            match waiter.wait(&refs, 0) {
                WaitOutcome::Ready(idx) => seen.push(idx),
                other => prop_assert!(false, "expected Ready, got {:?}", other),
            }
        }
        seen.sort();
        prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }
}
