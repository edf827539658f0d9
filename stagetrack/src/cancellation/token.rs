//! Cancellation token shared between a driver and its run task.

use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tracing::warn;

/// A callback run once when a token is cancelled.
pub type CancelCallback = Box<dyn FnOnce(&str) + Send>;

/// One-shot cooperative cancellation.
///
/// The first reason passed to [`CancellationToken::cancel`] sticks; later
/// calls are no-ops. Registered callbacks run exactly once, on the cancelling
/// thread, and are dropped afterwards.
#[derive(Default)]
pub struct CancellationToken {
    flag: AtomicBool,
    inner: Mutex<Inner>,
    wake: Notify,
}

#[derive(Default)]
struct Inner {
    reason: Option<String>,
    callbacks: Vec<CancelCallback>,
}

fn run_callback(callback: CancelCallback, reason: &str) {
    if catch_unwind(AssertUnwindSafe(|| callback(reason))).is_err() {
        warn!(reason, "Cancellation callback panicked");
    }
}

impl CancellationToken {
    /// Creates a live token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token. Returns false if it was already cancelled.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let callbacks = {
            let mut inner = self.inner.lock();
            if inner.reason.is_some() {
                return false;
            }
            inner.reason = Some(reason.clone());
            self.flag.store(true, Ordering::Release);
            std::mem::take(&mut inner.callbacks)
        };

        self.wake.notify_waiters();
        for callback in callbacks {
            run_callback(callback, &reason);
        }
        true
    }

    /// Registers a callback for cancellation, or runs it at once if the token
    /// is already cancelled.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce(&str) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        match inner.reason.clone() {
            Some(reason) => {
                drop(inner);
                run_callback(Box::new(callback), &reason);
            }
            None => inner.callbacks.push(Box::new(callback)),
        }
    }

    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns the winning reason, if cancelled.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.inner.lock().reason.clone()
    }

    /// Completes once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.wake.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a cancel in between is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("CancellationToken")
            .field("reason", &inner.reason)
            .field("pending_callbacks", &inner.callbacks.len())
            .finish()
    }
}
