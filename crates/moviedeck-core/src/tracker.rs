//! Counts in-flight requests and derives the global busy signal.
//!
//! The counter and the busy flag change under one lock, so an observer can
//! never see `busy == false` while a request is still outstanding (or the
//! reverse), even with overlapping requests finishing out of order.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::trace;

#[derive(Debug)]
pub struct WorkTracker {
    in_flight: Mutex<usize>,
    busy: watch::Sender<bool>,
}

impl Default for WorkTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkTracker {
    pub fn new() -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            in_flight: Mutex::new(0),
            busy,
        }
    }

    fn counter(&self) -> MutexGuard<'_, usize> {
        // A poisoned counter still holds a valid count
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start tracking one call. The returned guard stops tracking when it is
    /// dropped, whichever way the call ends.
    pub fn begin(self: &Arc<Self>) -> WorkGuard {
        let mut count = self.counter();
        *count += 1;
        if *count == 1 {
            trace!("Work tracker busy");
            self.busy.send_replace(true);
        }
        WorkGuard {
            tracker: Arc::clone(self),
        }
    }

    fn end(&self) {
        let mut count = self.counter();
        // begin/end are paired through WorkGuard, so the count is never zero here
        *count = count.saturating_sub(1);
        if *count == 0 {
            trace!("Work tracker idle");
            self.busy.send_replace(false);
        }
    }

    pub fn in_flight(&self) -> usize {
        *self.counter()
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Observe the busy signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }
}

/// One tracked call. Dropping it performs the single matching decrement.
#[derive(Debug)]
#[must_use = "dropping the guard immediately ends tracking"]
pub struct WorkGuard {
    tracker: Arc<WorkTracker>,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.tracker.end();
    }
}
