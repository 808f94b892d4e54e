//! Per-face estimator bundle (delay, loss, bandwidth)

use crate::estimators::{BandwidthEstimator, LossEstimator, RttEstimator, TimeWindowLossEstimator};
use crate::requirements::{RequirementKind, Requirements};
use ndn_common::{EstimatorSettings, NdnError, NdnResult};
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// Delay reported for a link that lost everything (ms)
pub const BROKEN_LINK_DELAY_MS: f64 = 1_000_000.0;

/// Point-in-time values of one face
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceMetrics {
    /// Delay in ms
    pub delay_ms: f64,
    /// Loss fraction
    pub loss: f64,
    /// Bandwidth in KB/s
    pub bandwidth_kbps: f64,
}

impl FaceMetrics {
    /// Value for a measured kind; `None` for cost
    pub fn value(&self, kind: RequirementKind) -> Option<f64> {
        match kind {
            RequirementKind::Delay => Some(self.delay_ms),
            RequirementKind::Loss => Some(self.loss),
            RequirementKind::Bandwidth => Some(self.bandwidth_kbps),
            RequirementKind::Cost => None,
        }
    }

    /// Whether every measured limit in `requirements` is met
    pub fn meets(&self, requirements: &Requirements) -> bool {
        [
            RequirementKind::Delay,
            RequirementKind::Loss,
            RequirementKind::Bandwidth,
        ]
        .into_iter()
        .all(|kind| {
            self.value(kind)
                .map_or(true, |value| requirements.is_met(kind, value))
        })
    }
}

/// All estimators of one outgoing face
#[derive(Debug)]
pub struct FaceEstimation {
    rtt: RttEstimator,
    loss: Box<dyn LossEstimator>,
    bw: BandwidthEstimator,
}

impl FaceEstimation {
    /// Create from settings with the time-window loss estimator
    pub fn new(settings: &EstimatorSettings) -> NdnResult<Self> {
        let loss = TimeWindowLossEstimator::with_refresh_interval(
            settings.interest_lifetime(),
            settings.window(),
            settings.refresh_interval(),
        )?;
        Ok(Self::with_loss_estimator(settings, Box::new(loss)))
    }

    /// Create with a custom loss estimator
    pub fn with_loss_estimator(settings: &EstimatorSettings, loss: Box<dyn LossEstimator>) -> Self {
        Self {
            rtt: RttEstimator::new(settings.initial_rtt(), settings.rtt_gain),
            loss,
            bw: BandwidthEstimator::new(settings.window()),
        }
    }

    /// A request was sent on this face
    pub fn add_sent_interest(&mut self, name: &str) {
        self.loss.add_sent(name);
    }

    /// Retract a sent request (tainted or cancelled)
    pub fn remove_sent_interest(&mut self, name: &str) {
        self.loss.remove_sent(name);
    }

    /// A request was satisfied with `size_bytes` of content
    pub fn add_satisfied_interest(&mut self, size_bytes: usize, name: &str) {
        self.loss.add_satisfied(name);
        self.bw.add_packet(size_bytes);
    }

    /// Add an RTT sample
    pub fn add_rtt_measurement(&mut self, rtt: Duration) {
        self.rtt.add_measurement(rtt);
    }

    /// Current value of `kind`
    ///
    /// Delay is reported as [`BROKEN_LINK_DELAY_MS`] once everything is lost.
    /// Cost is not measured and yields [`NdnError::InvalidMetric`].
    pub fn current_value(&mut self, kind: RequirementKind) -> NdnResult<f64> {
        match kind {
            RequirementKind::Bandwidth => Ok(self.bw.kilobytes_per_second()),
            RequirementKind::Delay => Ok(self.delay_ms()),
            RequirementKind::Loss => Ok(self.loss.loss_percentage()),
            RequirementKind::Cost => {
                warn!("Invalid metric {} requested from face estimation", kind);
                Err(NdnError::InvalidMetric(kind.to_string()))
            }
        }
    }

    fn delay_ms(&mut self) -> f64 {
        if self.loss.loss_percentage() >= 1.0 {
            BROKEN_LINK_DELAY_MS
        } else {
            self.rtt.rtt_ms()
        }
    }

    /// Snapshot of delay, loss and bandwidth
    pub fn metrics(&mut self) -> FaceMetrics {
        FaceMetrics {
            delay_ms: self.delay_ms(),
            loss: self.loss.loss_percentage(),
            bandwidth_kbps: self.bw.kilobytes_per_second(),
        }
    }

    /// Whether `metrics` equals the never-measured signature
    /// (initial delay, no loss, no bandwidth)
    pub fn looks_unmeasured(&self, metrics: &FaceMetrics) -> bool {
        metrics.delay_ms == self.rtt.initial_rtt_ms()
            && metrics.loss == 0.0
            && metrics.bandwidth_kbps == 0.0
    }

    /// Sent requests still awaiting an outcome
    pub fn outstanding(&self) -> usize {
        self.loss.outstanding()
    }

    /// RTT samples taken
    pub fn rtt_samples(&self) -> u32 {
        self.rtt.sample_count()
    }
}
