//! Lock-free counters and RTT histogram for strategy telemetry

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free event counter
#[derive(Debug, Default)]
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    /// Create new counter
    pub const fn new(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    /// Increment and return previous value
    #[inline(always)]
    pub fn inc(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Add value and return previous
    #[inline(always)]
    pub fn add(&self, val: u64) -> u64 {
        self.0.fetch_add(val, Ordering::Relaxed)
    }

    /// Get current value
    #[inline(always)]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Upper bounds (ms) of the bounded RTT buckets; an eighth bucket holds the rest
const BUCKET_LIMITS_MS: [u64; 7] = [1, 5, 10, 50, 100, 200, 500];

/// Lock-free histogram of RTT samples in milliseconds
#[derive(Debug)]
pub struct RttHistogram {
    /// Buckets: <=1ms, <=5ms, <=10ms, <=50ms, <=100ms, <=200ms, <=500ms, >500ms
    buckets: [AtomicU64; 8],
    count: AtomicU64,
    sum_ms: AtomicU64,
    min_ms: AtomicU64,
    max_ms: AtomicU64,
}

impl RttHistogram {
    /// Create new histogram
    pub const fn new() -> Self {
        Self {
            buckets: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
            count: AtomicU64::new(0),
            sum_ms: AtomicU64::new(0),
            min_ms: AtomicU64::new(u64::MAX),
            max_ms: AtomicU64::new(0),
        }
    }

    /// Record an RTT sample in milliseconds
    #[inline]
    pub fn record(&self, rtt_ms: u64) {
        let bucket = match rtt_ms {
            0..=1 => 0,
            2..=5 => 1,
            6..=10 => 2,
            11..=50 => 3,
            51..=100 => 4,
            101..=200 => 5,
            201..=500 => 6,
            _ => 7,
        };

        self.buckets[bucket].fetch_add(1, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_ms.fetch_add(rtt_ms, Ordering::Relaxed);
        self.min_ms.fetch_min(rtt_ms, Ordering::Relaxed);
        self.max_ms.fetch_max(rtt_ms, Ordering::Relaxed);
    }

    /// Number of samples
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Mean RTT in milliseconds
    pub fn average(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        self.sum_ms.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Approximate percentile (bucket upper bound)
    ///
    /// Samples in the open-ended bucket report the largest sample seen.
    pub fn percentile(&self, p: f64) -> u64 {
        let count = self.count();
        if count == 0 {
            return 0;
        }
        let target = ((count as f64) * p).ceil() as u64;
        let mut cumulative = 0u64;

        for (bucket, limit) in self.buckets.iter().zip(BUCKET_LIMITS_MS) {
            cumulative += bucket.load(Ordering::Relaxed);
            if cumulative >= target {
                return limit;
            }
        }

        self.max_ms.load(Ordering::Relaxed)
    }

    /// Get snapshot
    pub fn snapshot(&self) -> HistogramSnapshot {
        let count = self.count();
        HistogramSnapshot {
            count,
            average_ms: self.average(),
            min_ms: if count == 0 { 0 } else { self.min_ms.load(Ordering::Relaxed) },
            max_ms: self.max_ms.load(Ordering::Relaxed),
            p50: self.percentile(0.50),
            p90: self.percentile(0.90),
            p99: self.percentile(0.99),
        }
    }
}

impl Default for RttHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Histogram snapshot
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSnapshot {
    /// Samples recorded
    pub count: u64,
    /// Mean RTT
    pub average_ms: f64,
    /// Smallest sample (0 if empty)
    pub min_ms: u64,
    /// Largest sample
    pub max_ms: u64,
    /// Median bucket bound
    pub p50: u64,
    /// 90th percentile bucket bound
    pub p90: u64,
    /// 99th percentile bucket bound, or `max_ms` past the last bound
    pub p99: u64,
}
