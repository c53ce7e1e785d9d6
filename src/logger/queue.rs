use crate::store::NewErrorLog;
use std::collections::VecDeque;

/// Bounded FIFO of rows waiting for the store. When full, the oldest row goes.
#[derive(Debug)]
pub(crate) struct PendingQueue {
    entries: VecDeque<NewErrorLog>,
    capacity: usize,
    dropped: u64,
}

impl PendingQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Append a row, returning how many old rows were dropped to make room.
    pub(crate) fn push(&mut self, entry: NewErrorLog) -> usize {
        self.entries.push_back(entry);
        self.enforce_capacity()
    }

    /// Remove up to `max` rows from the front.
    pub(crate) fn take_batch(&mut self, max: usize) -> Vec<NewErrorLog> {
        let n = max.min(self.entries.len());
        self.entries.drain(..n).collect()
    }

    /// Put a batch that failed to persist back at the front, in its original
    /// order. Returns how many rows were dropped to stay within capacity.
    pub(crate) fn restore_front(&mut self, batch: Vec<NewErrorLog>) -> usize {
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
        self.enforce_capacity()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    fn enforce_capacity(&mut self) -> usize {
        let overflow = self.entries.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.entries.drain(..overflow);
            self.dropped += overflow as u64;
        }
        overflow
    }
}
