use super::signal::Signal;
use std::collections::VecDeque;

/// Bounded most-recent-first list of signals shown to the presentation layer.
#[derive(Debug, Clone)]
pub struct RecentSignals {
    capacity: usize,
    signals: VecDeque<Signal>,
}

impl RecentSignals {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            signals: VecDeque::with_capacity(capacity),
        }
    }

    /// Prepend a batch produced by one evaluation, keeping the batch's own
    /// order at the front, and drop whatever falls beyond capacity.
    pub fn prepend(&mut self, batch: &[Signal]) {
        for signal in batch.iter().rev() {
            self.signals.push_front(signal.clone());
        }
        self.signals.truncate(self.capacity);
    }

    /// Snapshot, newest first
    pub fn to_vec(&self) -> Vec<Signal> {
        self.signals.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
