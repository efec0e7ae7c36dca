//! Bounded, thread-safe error log.
//!
//! Handlers record malformed payload details here so operators can fetch
//! them later over `GET /errors`. The store keeps at most
//! [`MAX_ERROR_BUFFER_SIZE`] messages and evicts the oldest one first.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Maximum number of messages kept by the store.
pub const MAX_ERROR_BUFFER_SIZE: usize = 512;

/// Capability to record, read and reset error messages.
///
/// Implementations must be safe to share across request tasks without
/// any external synchronization.
pub trait ErrorStore: Send + Sync {
    /// Appends a message, evicting the oldest one if the store is full.
    fn add(&self, message: String);

    /// Returns a snapshot of the stored messages, oldest first.
    fn list(&self) -> Vec<String>;

    /// Removes every stored message.
    fn clear(&self);
}

/// Ring buffer of error messages guarded by a single lock.
///
/// Every operation holds the lock for its whole duration and never calls
/// another operation while holding it.
///
/// # Example
///
/// ```
/// use tempwatch_core::{BoundedErrorStore, ErrorStore};
///
/// let store = BoundedErrorStore::with_capacity(2);
/// store.add("a".to_string());
/// store.add("b".to_string());
/// store.add("c".to_string());
///
/// assert_eq!(store.list(), vec!["b".to_string(), "c".to_string()]);
/// ```
#[derive(Debug)]
pub struct BoundedErrorStore {
    capacity: usize,
    buffer: Mutex<VecDeque<String>>,
}

impl BoundedErrorStore {
    /// Creates a store holding up to [`MAX_ERROR_BUFFER_SIZE`] messages.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_ERROR_BUFFER_SIZE)
    }

    /// Creates a store with a custom capacity (at least one message).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Returns the maximum number of messages kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Returns `true` if no messages are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }
}

impl Default for BoundedErrorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorStore for BoundedErrorStore {
    fn add(&self, message: String) {
        let mut buffer = self.buffer.lock();

        if buffer.len() >= self.capacity {
            tracing::warn!(capacity = self.capacity, "error buffer overflow; reset array");
            buffer.pop_front();
        }

        tracing::info!("appending [{}] to errorBuffer", message);
        buffer.push_back(message);
    }

    fn list(&self) -> Vec<String> {
        self.buffer.lock().iter().cloned().collect()
    }

    fn clear(&self) {
        self.buffer.lock().clear();
        tracing::info!("Successfully cleared the errors buffer");
    }
}
