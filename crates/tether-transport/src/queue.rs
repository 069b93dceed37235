use crate::QueueEntry;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Plain FIFO queue of raw messages.
#[derive(Debug, Default)]
pub struct MessageQueue {
    entries: VecDeque<QueueEntry>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: QueueEntry) {
        self.entries.push_back(entry);
    }

    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Remove and return everything currently queued, oldest first.
    pub fn drain(&mut self) -> Vec<QueueEntry> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared handle to a FIFO queue.
///
/// Transports hold a clone and append through `push`. That single append
/// operation is their whole producer-side contract, and the mutex keeps it
/// safe even when a transport buffers on its own thread. The engine is the
/// sole consumer and drains synchronously within a tick.
#[derive(Clone, Debug, Default)]
pub struct SharedQueue {
    inner: Arc<Mutex<MessageQueue>>,
}

impl SharedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: QueueEntry) {
        self.lock().push(entry);
    }

    pub fn pop(&self) -> Option<QueueEntry> {
        self.lock().pop()
    }

    pub fn drain(&self) -> Vec<QueueEntry> {
        self.lock().drain()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MessageQueue> {
        // A poisoned lock only means a producer panicked mid-push; the
        // queue itself is still structurally sound.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
