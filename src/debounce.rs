// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cancel-and-restart debouncing.
//!
//! A [`Debouncer`] publishes the latest pushed value on a `watch` channel only
//! after `delay` has elapsed with no newer push. Every push aborts the
//! previous timer task, so there is at most one pending emission and an
//! intermediate value can never reach a subscriber.
//!
//! Pushing spawns a Tokio task and must therefore happen inside a runtime.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use search_session::debounce::Debouncer;
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let debouncer = Debouncer::new(String::new(), Duration::from_millis(300));
//! let mut rx = debouncer.subscribe();
//!
//! debouncer.push("r".to_string());
//! debouncer.push("ru".to_string());
//! debouncer.push("rust".to_string());
//!
//! rx.changed().await.unwrap();
//! assert_eq!(*rx.borrow(), "rust");
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct Debouncer<T> {
    delay: Mutex<Duration>,
    output: Arc<watch::Sender<T>>,
    /// The single in-flight timer, if any
    pending: Mutex<Option<JoinHandle<()>>>,
    /// Bumped on every push/cancel; a timer only emits if it still owns the latest generation
    generation: Arc<AtomicU64>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            delay: Mutex::new(delay),
            output: Arc::new(tx),
            pending: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue `value` for emission, superseding whatever was pending.
    pub fn push(&self, value: T) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let delay = *self.delay.lock();
        let output = Arc::clone(&self.output);
        let current = Arc::clone(&self.generation);

        let mut pending = self.pending.lock();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::Acquire) == generation {
                emit(&output, value);
            }
        }));
    }

    /// Drop the pending emission, if any, without emitting anything.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }

    /// Start a fresh stream: cancel the pending emission and publish `value` now.
    pub fn reset(&self, value: T) {
        self.cancel();
        emit(&self.output, value);
    }

    /// Change the quiet period. Applies to subsequent pushes only.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        *self.delay.lock()
    }

    /// Last emitted (stable) value.
    #[must_use]
    pub fn latest(&self) -> T {
        self.output.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.subscribe()
    }

    /// Whether a push is still waiting out its quiet period.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

/// Publish only real changes so subscribers never see a spurious wake-up.
fn emit<T: PartialEq>(output: &watch::Sender<T>, value: T) {
    output.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_emits_after_quiet_period() {
        let debouncer = Debouncer::new(0u32, Duration::from_millis(100));
        debouncer.push(7);

        sleep(Duration::from_millis(99)).await;
        assert_eq!(debouncer.latest(), 0);
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(debouncer.latest(), 7);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_intermediate_values_never_observed() {
        let debouncer = Debouncer::new(String::new(), Duration::from_millis(100));
        let mut rx = debouncer.subscribe();

        for term in ["r", "ru", "rus", "rust"] {
            debouncer.push(term.to_string());
            sleep(Duration::from_millis(50)).await;
        }

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "rust");

        // No second emission follows
        sleep(Duration::from_millis(500)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending() {
        let debouncer = Debouncer::new(0u32, Duration::from_millis(100));
        debouncer.push(1);
        debouncer.cancel();

        sleep(Duration::from_millis(200)).await;
        assert_eq!(debouncer.latest(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_emits_immediately() {
        let debouncer = Debouncer::new(5u32, Duration::from_millis(100));
        debouncer.push(9);
        debouncer.reset(0);
        assert_eq!(debouncer.latest(), 0);

        // The superseded push must not land afterwards
        sleep(Duration::from_millis(200)).await;
        assert_eq!(debouncer.latest(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_value_does_not_notify() {
        let debouncer = Debouncer::new(3u32, Duration::from_millis(10));
        let mut rx = debouncer.subscribe();

        debouncer.push(3);
        sleep(Duration::from_millis(50)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_delay() {
        let debouncer = Debouncer::new(0u32, Duration::from_millis(100));
        debouncer.set_delay(Duration::from_millis(10));
        assert_eq!(debouncer.delay(), Duration::from_millis(10));

        debouncer.push(1);
        sleep(Duration::from_millis(11)).await;
        assert_eq!(debouncer.latest(), 1);
    }
}
