//! Sliding-window throughput estimation

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Simple moving-average bandwidth over a sliding time window
#[derive(Debug, Clone)]
pub struct BandwidthEstimator {
    window: Duration,
    /// (arrival, bytes) in arrival order
    samples: VecDeque<(Instant, usize)>,
}

impl BandwidthEstimator {
    /// Create with window size
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Record one received packet
    #[inline]
    pub fn add_packet(&mut self, size_bytes: usize) {
        self.samples.push_back((Instant::now(), size_bytes));
    }

    /// Bandwidth over the window in KB/s (1 KB = 1024 bytes), 0 if the window is empty
    pub fn kilobytes_per_second(&mut self) -> f64 {
        self.evict(Instant::now());

        if self.samples.is_empty() {
            return 0.0;
        }

        let total: usize = self.samples.iter().map(|(_, size)| size).sum();
        total as f64 / (self.window.as_secs_f64() * 1024.0)
    }

    /// Samples currently inside the window
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are held
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn evict(&mut self, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };
        while self.samples.front().is_some_and(|(at, _)| *at <= cutoff) {
            self.samples.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const WINDOW: Duration = Duration::from_secs(5);

    #[test]
    fn test_zero_after_construction() {
        let mut bw = BandwidthEstimator::new(WINDOW);
        assert_eq!(bw.kilobytes_per_second(), 0.0);
        assert!(bw.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_over_window() {
        let mut bw = BandwidthEstimator::new(WINDOW);
        for _ in 0..10 {
            bw.add_packet(1024);
        }

        // 10 KiB over a 5 s window
        assert!((bw.kilobytes_per_second() - 2.0).abs() < 1e-9);
        assert_eq!(bw.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction() {
        let mut bw = BandwidthEstimator::new(WINDOW);
        bw.add_packet(2048);
        advance(Duration::from_secs(3)).await;
        bw.add_packet(1024);

        advance(Duration::from_secs(2)).await;
        // First sample is exactly one window old
        assert!((bw.kilobytes_per_second() - 0.2).abs() < 1e-9);
        assert_eq!(bw.len(), 1);

        advance(Duration::from_secs(3)).await;
        assert_eq!(bw.kilobytes_per_second(), 0.0);
        assert!(bw.is_empty());
    }
}
