use super::candle::Candle;
use std::collections::VecDeque;
use tracing::debug;

/// Sliding FIFO window of the most recent candles, oldest first.
///
/// Timestamps are strictly ascending: a candle that does not advance past the
/// newest held candle is rejected.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    capacity: usize,
    candles: VecDeque<Candle>,
}

impl CandleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            candles: VecDeque::with_capacity(capacity.max(1) + 1),
        }
    }

    /// Build a window from a history batch, keeping only the newest `capacity`
    /// candles in ascending order.
    pub fn from_history(capacity: usize, history: impl IntoIterator<Item = Candle>) -> Self {
        let mut sorted: Vec<Candle> = history.into_iter().collect();
        sorted.sort_by_key(|c| c.timestamp);

        let mut window = Self::new(capacity);
        for candle in sorted {
            window.push(candle);
        }
        window
    }

    /// Append the newest candle, evicting the oldest beyond capacity.
    /// Returns false when the candle was rejected as stale.
    pub fn push(&mut self, candle: Candle) -> bool {
        if let Some(last) = self.candles.back()
            && candle.timestamp <= last.timestamp
        {
            debug!(
                "CandleWindow: rejecting stale candle {} (newest {})",
                candle.timestamp, last.timestamp
            );
            return false;
        }

        self.candles.push_back(candle);
        if self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
        true
    }

    /// Contiguous view of the window, oldest first
    pub fn as_slice(&mut self) -> &[Candle] {
        self.candles.make_contiguous()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(timestamp: i64) -> Candle {
        Candle {
            timestamp,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 10.0,
        }
    }

    #[test]
    fn test_evicts_oldest_beyond_capacity() {
        let mut window = CandleWindow::new(3);
        for ts in 1..=5 {
            assert!(window.push(candle(ts)));
        }

        let timestamps: Vec<i64> = window.iter().map(|c| c.timestamp).collect();
        assert_eq!(timestamps, vec![3, 4, 5]);
        assert_eq!(window.latest().map(|c| c.timestamp), Some(5));
    }

    #[test]
    fn test_rejects_non_advancing_timestamps() {
        let mut window = CandleWindow::new(10);
        assert!(window.push(candle(10)));
        assert!(!window.push(candle(10)));
        assert!(!window.push(candle(9)));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_from_history_sorts_and_truncates() {
        let history = vec![candle(4), candle(1), candle(3), candle(2), candle(3)];
        let mut window = CandleWindow::from_history(3, history);

        let timestamps: Vec<i64> = window.iter().map(|c| c.timestamp).collect();
        assert_eq!(timestamps, vec![2, 3, 4]);

        window.push(candle(5));
        let slice: Vec<i64> = window.as_slice().iter().map(|c| c.timestamp).collect();
        assert_eq!(slice, vec![3, 4, 5]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut window = CandleWindow::new(0);
        window.push(candle(1));
        window.push(candle(2));
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.len(), 1);
        assert!(!window.is_empty());
    }
}
