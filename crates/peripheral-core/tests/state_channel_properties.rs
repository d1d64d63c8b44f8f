//! Property-based tests for the state channel
//!
//! These tests check the replay, ordering and unsubscribe laws of
//! `StateChannel` over arbitrary publish sequences.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use peripheral_core::{AdvertisingState, StateChannel};
use proptest::prelude::*;

/// Generate an arbitrary advertising state
fn arb_state() -> impl Strategy<Value = AdvertisingState> {
    (0u8..4).prop_map(|index| AdvertisingState::from_index(index).unwrap())
}

fn arb_states() -> impl Strategy<Value = Vec<AdvertisingState>> {
    prop::collection::vec(arb_state(), 0..32)
}

fn recording(channel: &StateChannel) -> Arc<Mutex<Vec<AdvertisingState>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    channel.subscribe(move |state| sink.lock().unwrap().push(state));
    seen
}

proptest! {
    /// Property: current() equals the last published value
    #[test]
    fn current_is_last_published(states in arb_states()) {
        let channel = StateChannel::new();
        for state in &states {
            channel.publish(*state);
        }
        let expected = states.last().copied().unwrap_or(AdvertisingState::Idle);
        prop_assert_eq!(channel.current(), expected);
    }

    /// Property: subscribing delivers current() immediately, then every publish in order
    #[test]
    fn subscriber_sees_replay_then_all_publishes(
        before in arb_states(),
        after in arb_states(),
    ) {
        let channel = StateChannel::new();
        for state in &before {
            channel.publish(*state);
        }
        let at_subscribe = channel.current();
        let seen = recording(&channel);
        for state in &after {
            channel.publish(*state);
        }

        let mut expected = vec![at_subscribe];
        expected.extend(after.iter().copied());
        prop_assert_eq!(seen.lock().unwrap().clone(), expected);
    }

    /// Property: nothing is delivered after unsubscribe
    #[test]
    fn no_delivery_after_unsubscribe(after in arb_states()) {
        let channel = StateChannel::new();
        let seen = recording(&channel);
        channel.unsubscribe();
        for state in &after {
            channel.publish(*state);
        }
        prop_assert_eq!(seen.lock().unwrap().len(), 1);
    }

    /// Property: a replaced subscriber receives nothing further
    #[test]
    fn replaced_subscriber_is_silent(after in arb_states()) {
        let channel = StateChannel::new();
        let first = recording(&channel);
        let second = recording(&channel);
        for state in &after {
            channel.publish(*state);
        }
        prop_assert_eq!(first.lock().unwrap().len(), 1);
        prop_assert_eq!(second.lock().unwrap().len(), after.len() + 1);
    }
}

#[test]
fn test_concurrent_publishers_never_tear_state() {
    let channel = StateChannel::new();
    let seen = recording(&channel);

    let workers: Vec<_> = AdvertisingState::ALL
        .into_iter()
        .map(|state| {
            let channel = channel.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    channel.publish(state);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1 + 4 * 250);
    assert_eq!(*seen.last().unwrap(), channel.current());
}

#[test]
fn test_no_delivery_after_unsubscribe_under_concurrent_publishers() {
    let channel = StateChannel::new();
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();
    channel.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let running = Arc::new(AtomicBool::new(true));
    let workers: Vec<_> = AdvertisingState::ALL
        .into_iter()
        .map(|state| {
            let channel = channel.clone();
            let running = running.clone();
            std::thread::spawn(move || {
                while running.load(Ordering::SeqCst) {
                    channel.publish(state);
                }
            })
        })
        .collect();

    // Let the publishers get going
    while delivered.load(Ordering::SeqCst) < 100 {
        std::thread::yield_now();
    }

    channel.unsubscribe();
    let at_unsubscribe = delivered.load(Ordering::SeqCst);

    std::thread::sleep(Duration::from_millis(20));
    running.store(false, Ordering::SeqCst);
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(!channel.has_subscriber());
    assert_eq!(delivered.load(Ordering::SeqCst), at_unsubscribe);
}

