//! One-slot "latest value" channel
//!
//! The writer never blocks: putting a value replaces whatever has not been
//! taken yet. The reader always sees the freshest value. Used for outbound
//! frames, where a new capture tick makes any unsent frame worthless.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

pub struct LatestSlot<T> {
    value: Mutex<Option<T>>,
    notify: Notify,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value`, returning the unsent value it displaced, if any.
    pub fn put(&self, value: T) -> Option<T> {
        let displaced = self.lock().replace(value);
        self.notify.notify_one();
        displaced
    }

    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Waits for the next value. Cancel safe: a value is only removed from
    /// the slot in the same poll that returns it.
    pub async fn next(&self) -> T {
        loop {
            if let Some(value) = self.take() {
                return value;
            }
            self.notify.notified().await;
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
