//! Per-message processing slots.
//!
//! At most one pass may work on a given source message at a time. A slot is
//! held through an RAII [`SlotGuard`], so it is released on every exit path,
//! early returns and panics included.
//!
//! Two acquisition policies are offered:
//! - [`ProcessingSlots::try_acquire`] debounces: if the slot is busy the
//!   caller gives up. Reaction events use this, because the pass already in
//!   flight reads reaction state fresh from the platform.
//! - [`ProcessingSlots::acquire`] waits for the slot. Deletions use this,
//!   because dropping one could leave a mirror behind for a message that no
//!   longer exists.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::hash::Hash;
use tokio::sync::Notify;

/// Set of keys currently being processed.
#[derive(Debug)]
pub struct ProcessingSlots<K> {
    busy: Mutex<HashSet<K>>,
    released: Notify,
}

impl<K> Default for ProcessingSlots<K>
where
    K: Eq + Hash + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ProcessingSlots<K>
where
    K: Eq + Hash + Copy,
{
    /// Create an empty slot set.
    pub fn new() -> Self {
        Self {
            busy: Mutex::new(HashSet::new()),
            released: Notify::new(),
        }
    }

    /// Claim the slot for `key`, or `None` if another pass holds it.
    pub fn try_acquire(&self, key: K) -> Option<SlotGuard<'_, K>> {
        if self.busy.lock().insert(key) {
            Some(SlotGuard { slots: self, key })
        } else {
            None
        }
    }

    /// Claim the slot for `key`, waiting for the current holder to finish.
    pub async fn acquire(&self, key: K) -> SlotGuard<'_, K> {
        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            // Register before checking so a release in between is not missed.
            released.as_mut().enable();

            if let Some(guard) = self.try_acquire(key) {
                return guard;
            }
            released.await;
        }
    }

    /// Whether `key` is currently held.
    pub fn is_busy(&self, key: &K) -> bool {
        self.busy.lock().contains(key)
    }

    /// Number of held slots.
    pub fn len(&self) -> usize {
        self.busy.lock().len()
    }

    /// Whether no slot is held.
    pub fn is_empty(&self) -> bool {
        self.busy.lock().is_empty()
    }

    fn release(&self, key: &K) {
        self.busy.lock().remove(key);
        self.released.notify_waiters();
    }
}

/// Exclusive claim on one key; released on drop.
#[derive(Debug)]
pub struct SlotGuard<'a, K>
where
    K: Eq + Hash + Copy,
{
    slots: &'a ProcessingSlots<K>,
    key: K,
}

impl<K> SlotGuard<'_, K>
where
    K: Eq + Hash + Copy,
{
    /// The key this guard holds.
    pub fn key(&self) -> K {
        self.key
    }
}

impl<K> Drop for SlotGuard<'_, K>
where
    K: Eq + Hash + Copy,
{
    fn drop(&mut self) {
        self.slots.release(&self.key);
    }
}
