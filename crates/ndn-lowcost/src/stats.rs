//! Strategy telemetry

use ndn_common::metrics::{AtomicCounter, HistogramSnapshot, RttHistogram};
use serde::Serialize;
use std::time::Duration;

/// Lock-free strategy counters
#[derive(Debug, Default)]
pub struct StrategyStats {
    pub(crate) interests: AtomicCounter,
    pub(crate) probes: AtomicCounter,
    pub(crate) tainted_probes: AtomicCounter,
    pub(crate) nacks_sent: AtomicCounter,
    pub(crate) nacks_propagated: AtomicCounter,
    pub(crate) face_switches: AtomicCounter,
    pub(crate) measurements: AtomicCounter,
    rtt: RttHistogram,
}

impl StrategyStats {
    /// Create zeroed stats
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_rtt(&self, rtt: Duration) {
        self.rtt.record(rtt.as_millis() as u64);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            interests: self.interests.get(),
            probes: self.probes.get(),
            tainted_probes: self.tainted_probes.get(),
            nacks_sent: self.nacks_sent.get(),
            nacks_propagated: self.nacks_propagated.get(),
            face_switches: self.face_switches.get(),
            measurements: self.measurements.get(),
            rtt: self.rtt.snapshot(),
        }
    }
}

/// Point-in-time copy of [`StrategyStats`]
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Interests handled
    pub interests: u64,
    /// Probes among them
    pub probes: u64,
    /// Probes tainted by this node
    pub tainted_probes: u64,
    /// Nacks originated (tainted or no route)
    pub nacks_sent: u64,
    /// Tainted nacks forwarded downstream
    pub nacks_propagated: u64,
    /// Working face changes
    pub face_switches: u64,
    /// Probe data used for measurement
    pub measurements: u64,
    /// RTT samples
    pub rtt: HistogramSnapshot,
}
