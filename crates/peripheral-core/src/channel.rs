//! Single-subscriber state channel
//!
//! [`StateChannel`] is the single source of truth for the current
//! [`AdvertisingState`]. It relays every published state to at most one
//! subscriber and replays the current state to a subscriber when it attaches,
//! so an observer that attaches late never sees a stale default.
//!
//! The state and the subscriber slot live behind one mutex. Delivery happens
//! while the lock is held, which gives two guarantees:
//!
//! - subscribers observe publishes in the order they were made
//! - once [`StateChannel::unsubscribe`] returns, the old subscriber is never
//!   invoked again
//!
//! A subscriber callback must therefore not call back into the channel.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::state::AdvertisingState;

/// Callback invoked with every state delivered to the subscriber
pub type Subscriber = Box<dyn Fn(AdvertisingState) + Send + 'static>;

/// Receiving half of a stream subscription
pub type StateReceiver = mpsc::UnboundedReceiver<AdvertisingState>;

struct Inner {
    state: AdvertisingState,
    subscriber: Option<Subscriber>,
}

/// Shared handle to the current advertising state and its observer
#[derive(Clone)]
pub struct StateChannel {
    inner: Arc<Mutex<Inner>>,
}

impl StateChannel {
    /// Create a channel whose current state is [`AdvertisingState::Idle`]
    pub fn new() -> Self {
        Self::with_state(AdvertisingState::Idle)
    }

    pub fn with_state(state: AdvertisingState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                subscriber: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking subscriber must not wedge the state forever.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the current state and deliver it to the subscriber, if any
    ///
    /// No transition is validated: the radio is the ground truth.
    pub fn publish(&self, state: AdvertisingState) {
        let mut inner = self.lock();
        let previous = inner.state;
        inner.state = state;
        debug!("Advertising state {} -> {}", previous, state);
        if let Some(subscriber) = inner.subscriber.as_ref() {
            subscriber(state);
        }
    }

    /// Register `callback` as the sole subscriber, replacing any previous one
    ///
    /// The current state is delivered to `callback` before this returns.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(AdvertisingState) + Send + 'static,
    {
        let mut inner = self.lock();
        if inner.subscriber.is_some() {
            trace!("Replacing existing state subscriber");
        }
        callback(inner.state);
        inner.subscriber = Some(Box::new(callback));
    }

    /// Subscribe with a stream instead of a callback
    ///
    /// Every delivered state is queued without coalescing. The stream ends
    /// when the subscription is replaced or cleared.
    pub fn subscribe_stream(&self) -> StateReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe(move |state| {
            // A dropped receiver just means nobody is listening any more.
            let _ = tx.send(state);
        });
        rx
    }

    /// Clear the subscriber; calling this with no subscriber is a no-op
    pub fn unsubscribe(&self) {
        if self.lock().subscriber.take().is_some() {
            trace!("State subscriber removed");
        }
    }

    pub fn has_subscriber(&self) -> bool {
        self.lock().subscriber.is_some()
    }

    /// Current state, without side effects
    pub fn current(&self) -> AdvertisingState {
        self.lock().state
    }
}

impl Default for StateChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("StateChannel")
            .field("state", &inner.state)
            .field("subscribed", &inner.subscriber.is_some())
            .finish()
    }
}
