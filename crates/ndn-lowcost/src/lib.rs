//! Lowest-Cost Multipath Forwarding Strategy
//!
//! Per-prefix face selection driven by lightweight probes.
//!
//! # Features
//!
//! - Per-face delay (EWMA), loss (sliding time window) and throughput estimation
//! - Requirement limits per prefix (max delay, max loss, min bandwidth)
//! - Probe tainting so only one router measures a redirected probe
//! - Loss estimator self-refresh on a tokio timer

#![warn(missing_docs)]

pub mod estimation;
pub mod estimators;
pub mod measurements;
pub mod requirements;
pub mod selection;
pub mod stats;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use estimation::{FaceEstimation, FaceMetrics, BROKEN_LINK_DELAY_MS};
pub use estimators::{
    BandwidthEstimator, LossEstimator, RefreshTimer, RttEstimator, TimeWindowLossEstimator,
};
pub use measurements::{MeasurementInfo, MeasurementTable, PrefixId};
pub use requirements::{parameter_map, RequirementKind, Requirements};
pub use selection::TaintingGate;
pub use stats::{StatsSnapshot, StrategyStats};
pub use strategy::{LowestCostStrategy, PrefixParameters, STRATEGY_NAME};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_name() {
        let name = ndn_common::Name::parse(STRATEGY_NAME).unwrap();
        assert_eq!(name.len(), 5);
        assert_eq!(name.get(2), Some("strategy"));
    }
}
