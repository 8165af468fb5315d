//! Notification fan-out from the engines to presentation layers
//!
//! Engines never touch presentation state. Every state change is pushed
//! to each subscriber's channel; renderers drain their receiver once per
//! frame with `try_iter()`.

use crossbeam::channel::{unbounded, Receiver, Sender};

/// Multi-subscriber event channel
///
/// Subscribers whose receiver has been dropped are pruned on the next emit.
pub struct EventBus<T: Clone> {
    subscribers: Vec<Sender<T>>,
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a new subscriber and return its receiving end
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber
    pub fn emit(&mut self, event: T) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
