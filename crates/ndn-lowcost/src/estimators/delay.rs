//! Round-trip delay estimation with an exponential moving average

use std::time::Duration;

/// RTT reported before the first sample
pub const DEFAULT_INITIAL_RTT: Duration = Duration::from_millis(10);

/// Default EWMA gain
pub const DEFAULT_GAIN: f64 = 0.1;

/// EWMA round-trip estimator without RTO calculation
#[derive(Debug, Clone)]
pub struct RttEstimator {
    /// Current estimate in microseconds
    rtt_us: f64,
    initial_rtt_us: f64,
    gain: f64,
    sample_count: u32,
}

impl RttEstimator {
    /// Create with an initial RTT and a gain in (0, 1)
    pub fn new(initial_rtt: Duration, gain: f64) -> Self {
        let initial_rtt_us = initial_rtt.as_micros() as f64;
        Self {
            rtt_us: initial_rtt_us,
            initial_rtt_us,
            gain,
            sample_count: 0,
        }
    }

    /// Add one RTT sample
    ///
    /// The first sample replaces the initial value; later samples move the
    /// estimate by `gain * (sample - estimate)`.
    #[inline]
    pub fn add_measurement(&mut self, sample: Duration) {
        let measured = sample.as_micros() as f64;
        if self.sample_count == 0 {
            self.rtt_us = measured;
        } else {
            self.rtt_us += self.gain * (measured - self.rtt_us);
        }
        self.sample_count = self.sample_count.saturating_add(1);
    }

    /// Current estimate in milliseconds
    #[inline]
    pub fn rtt_ms(&self) -> f64 {
        self.rtt_us / 1000.0
    }

    /// Initial RTT in milliseconds
    pub fn initial_rtt_ms(&self) -> f64 {
        self.initial_rtt_us / 1000.0
    }

    /// Number of samples seen
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

impl Default for RttEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_RTT, DEFAULT_GAIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_and_first_sample() {
        let mut rtt = RttEstimator::default();
        assert_eq!(rtt.rtt_ms(), 10.0);
        assert_eq!(rtt.sample_count(), 0);

        rtt.add_measurement(Duration::from_millis(80));
        assert_eq!(rtt.rtt_ms(), 80.0);

        // 80 + 0.1 * (180 - 80)
        rtt.add_measurement(Duration::from_millis(180));
        assert!((rtt.rtt_ms() - 90.0).abs() < 1e-9);
        assert_eq!(rtt.sample_count(), 2);
    }

    proptest! {
        #[test]
        fn first_sample_is_exact_then_strictly_between(
            first_us in 1u64..5_000_000,
            samples in prop::collection::vec(1u64..5_000_000, 1..32),
            gain in 0.01f64..0.99,
        ) {
            let mut rtt = RttEstimator::new(DEFAULT_INITIAL_RTT, gain);
            rtt.add_measurement(Duration::from_micros(first_us));
            prop_assert_eq!(rtt.rtt_ms(), first_us as f64 / 1000.0);

            for sample_us in samples {
                let before = rtt.rtt_ms();
                let sample_ms = sample_us as f64 / 1000.0;
                rtt.add_measurement(Duration::from_micros(sample_us));
                let after = rtt.rtt_ms();

                if (sample_ms - before).abs() > 1e-6 {
                    prop_assert!(after > before.min(sample_ms) && after < before.max(sample_ms));
                }
            }
        }
    }
}
