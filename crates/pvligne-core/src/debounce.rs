//! Cancellable delayed tasks.
//!
//! A [`Debouncer`] delivers one event on a channel after a fixed delay.
//! Scheduling again cancels the pending delivery and restarts the delay, so
//! only the last of a burst of calls fires. Every scheduling gets a new
//! generation number; a delivery that raced a cancellation carries a stale
//! generation and is rejected by [`Debouncer::accept`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Delayed, restartable event delivery.
#[derive(Debug)]
pub struct Debouncer<E> {
    delay: Duration,
    tx: mpsc::Sender<E>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl<E: Send + 'static> Debouncer<E> {
    pub const fn new(delay: Duration, tx: mpsc::Sender<E>) -> Self {
        Self {
            delay,
            tx,
            generation: 0,
            pending: None,
        }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a delivery is scheduled and not yet accepted or cancelled.
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// (Re)start the delay. `make` builds the event from the generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, make: F) -> u64
    where
        F: FnOnce(u64) -> E + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        let delay = self.delay;
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(make(generation)).await;
        }));
        generation
    }

    /// Drop the pending delivery, if any. Deliveries already queued become stale.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Accept a delivered event. Returns `false` for stale generations.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.pending.is_none() || generation != self.generation {
            return false;
        }
        self.pending = None;
        true
    }
}

impl<E> Drop for Debouncer<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
