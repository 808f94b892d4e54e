//! Strategy configuration
//!
//! Per-prefix numeric parameters are served through [`ConfigProvider`].
//! [`ParameterConfiguration`] is the stock provider: a concurrent
//! prefix → parameter table that falls back to the process-wide (`/`)
//! values and finally to built-in defaults.

use crate::{NdnError, NdnResult};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Prefix under which process-wide values are stored
pub const DEFAULT_PREFIX: &str = "/";

/// Dynamic per-prefix parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKey {
    /// Whether probes may be redirected (1 = true, 0 = false)
    TaintingEnabled,
    /// Minimum number of next hops before probes are redirected
    MinFacesForTainting,
    /// Tainting rate: one probe in this many may be redirected
    MaxTaintedProbesPercentage,
    /// Maximum tolerated delay (ms)
    MaxDelay,
    /// Maximum tolerated loss (fraction)
    MaxLoss,
    /// Minimum tolerated bandwidth (KB/s)
    MinBandwidth,
    /// Maximum time (ms) a probe send time is kept for RTT correlation
    RttTableMaxDuration,
}

impl ParameterKey {
    /// All keys
    pub const ALL: [ParameterKey; 7] = [
        Self::TaintingEnabled,
        Self::MinFacesForTainting,
        Self::MaxTaintedProbesPercentage,
        Self::MaxDelay,
        Self::MaxLoss,
        Self::MinBandwidth,
        Self::RttTableMaxDuration,
    ];

    /// Configuration name
    pub const fn name(self) -> &'static str {
        match self {
            Self::TaintingEnabled => "TAINTING_ENABLED",
            Self::MinFacesForTainting => "MIN_NUM_OF_FACES_FOR_TAINTING",
            Self::MaxTaintedProbesPercentage => "MAX_TAINTED_PROBES_PERCENTAGE",
            Self::MaxDelay => "REQUIREMENT_MAXDELAY",
            Self::MaxLoss => "REQUIREMENT_MAXLOSS",
            Self::MinBandwidth => "REQUIREMENT_MINBANDWIDTH",
            Self::RttTableMaxDuration => "RTT_TIME_TABLE_MAX_DURATION",
        }
    }

    /// Look up a key by configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Built-in default
    pub const fn default_value(self) -> f64 {
        match self {
            Self::TaintingEnabled => 1.0,
            Self::MinFacesForTainting => 3.0,
            Self::MaxTaintedProbesPercentage => 10.0,
            Self::MaxDelay => 200.0,
            Self::MaxLoss => 0.1,
            Self::MinBandwidth => 0.0,
            Self::RttTableMaxDuration => 1000.0,
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of per-prefix parameters
pub trait ConfigProvider: Send + Sync {
    /// Value of `key` for `prefix`, or the process-wide default
    fn parameter(&self, key: ParameterKey, prefix: &str) -> f64;
}

/// Concurrent per-prefix parameter table
#[derive(Debug)]
pub struct ParameterConfiguration {
    prefixes: DashMap<String, HashMap<ParameterKey, f64>>,
}

impl ParameterConfiguration {
    /// Create with the built-in defaults installed under `/`
    pub fn new() -> Self {
        let defaults = ParameterKey::ALL
            .into_iter()
            .map(|k| (k, k.default_value()))
            .collect();

        let prefixes = DashMap::new();
        prefixes.insert(DEFAULT_PREFIX.to_string(), defaults);
        Self { prefixes }
    }

    /// Set a value for one prefix
    pub fn set_parameter(&self, key: ParameterKey, value: f64, prefix: &str) {
        debug!("Setting {}={} for {}", key, value, prefix);
        self.prefixes
            .entry(prefix.to_string())
            .or_default()
            .insert(key, value);
    }

    /// Set the process-wide value
    pub fn set_default(&self, key: ParameterKey, value: f64) {
        self.set_parameter(key, value, DEFAULT_PREFIX);
    }

    /// Drop every override for `prefix`
    pub fn clear_prefix(&self, prefix: &str) {
        if prefix != DEFAULT_PREFIX {
            self.prefixes.remove(prefix);
        }
    }

    fn lookup(&self, key: ParameterKey, prefix: &str) -> Option<f64> {
        self.prefixes
            .get(prefix)
            .and_then(|params| params.get(&key).copied())
    }
}

impl Default for ParameterConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigProvider for ParameterConfiguration {
    fn parameter(&self, key: ParameterKey, prefix: &str) -> f64 {
        self.lookup(key, prefix)
            .or_else(|| self.lookup(key, DEFAULT_PREFIX))
            .unwrap_or_else(|| key.default_value())
    }
}

/// Parameters shared by all prefixes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedParameters {
    /// Name marker of probes
    pub probe_suffix: String,
    /// Number of leading name components forming a measurement prefix
    pub prefix_offset: usize,
}

impl Default for SharedParameters {
    fn default() -> Self {
        Self {
            probe_suffix: "/probe".to_string(),
            prefix_offset: 1,
        }
    }
}

/// Per-face estimator tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Time after which an unanswered request counts as lost (ms)
    pub interest_lifetime_ms: u64,
    /// Sliding window of the loss and bandwidth estimators (ms)
    pub window_ms: u64,
    /// RTT reported before the first sample (ms)
    pub initial_rtt_ms: u64,
    /// EWMA gain of the RTT estimator
    pub rtt_gain: f64,
    /// Period of the background loss refresh (ms)
    pub refresh_interval_ms: u64,
}

impl EstimatorSettings {
    /// Interest lifetime
    pub fn interest_lifetime(&self) -> Duration {
        Duration::from_millis(self.interest_lifetime_ms)
    }

    /// Sliding window
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Initial RTT
    pub fn initial_rtt(&self) -> Duration {
        Duration::from_millis(self.initial_rtt_ms)
    }

    /// Refresh period
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            interest_lifetime_ms: 2000,
            window_ms: 5000,
            initial_rtt_ms: 10,
            rtt_gain: 0.1,
            refresh_interval_ms: 1000,
        }
    }
}

/// Complete configuration document
///
/// ```json
/// {
///   "shared": { "probe_suffix": "/probe", "prefix_offset": 1 },
///   "estimators": { "interest_lifetime_ms": 2000, "window_ms": 5000 },
///   "defaults": { "REQUIREMENT_MAXDELAY": 150.0 },
///   "prefixes": { "/video": { "TAINTING_ENABLED": 0 } }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Shared parameters
    pub shared: SharedParameters,
    /// Estimator tuning
    pub estimators: EstimatorSettings,
    /// Process-wide overrides, keyed by parameter name
    pub defaults: HashMap<String, f64>,
    /// Per-prefix overrides, keyed by prefix URI then parameter name
    pub prefixes: HashMap<String, HashMap<String, f64>>,
}

impl StrategyConfig {
    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> NdnResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> NdnResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Build the parameter table; unknown parameter names are rejected
    pub fn parameters(&self) -> NdnResult<ParameterConfiguration> {
        let table = ParameterConfiguration::new();

        for (name, value) in &self.defaults {
            table.set_default(Self::key(name)?, *value);
        }
        for (prefix, params) in &self.prefixes {
            for (name, value) in params {
                table.set_parameter(Self::key(name)?, *value, prefix);
            }
        }

        Ok(table)
    }

    fn key(name: &str) -> NdnResult<ParameterKey> {
        ParameterKey::from_name(name)
            .ok_or_else(|| NdnError::Config(format!("unknown parameter: {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let config = ParameterConfiguration::new();
        assert_eq!(config.parameter(ParameterKey::TaintingEnabled, "/"), 1.0);
        assert_eq!(config.parameter(ParameterKey::MinFacesForTainting, "/x"), 3.0);
        assert_eq!(config.parameter(ParameterKey::MaxTaintedProbesPercentage, "/x"), 10.0);
        assert_eq!(config.parameter(ParameterKey::MaxDelay, "/x"), 200.0);
        assert_eq!(config.parameter(ParameterKey::MaxLoss, "/x"), 0.1);
        assert_eq!(config.parameter(ParameterKey::MinBandwidth, "/x"), 0.0);
        assert_eq!(config.parameter(ParameterKey::RttTableMaxDuration, "/x"), 1000.0);
    }

    #[test]
    fn test_prefix_override_and_fallback() {
        let config = ParameterConfiguration::new();
        config.set_parameter(ParameterKey::MaxDelay, 50.0, "/video");
        config.set_default(ParameterKey::MaxLoss, 0.2);

        assert_eq!(config.parameter(ParameterKey::MaxDelay, "/video"), 50.0);
        assert_eq!(config.parameter(ParameterKey::MaxDelay, "/audio"), 200.0);
        assert_eq!(config.parameter(ParameterKey::MaxLoss, "/video"), 0.2);

        config.clear_prefix("/video");
        assert_eq!(config.parameter(ParameterKey::MaxDelay, "/video"), 200.0);
    }

    #[test]
    fn test_key_names() {
        for key in ParameterKey::ALL {
            assert_eq!(ParameterKey::from_name(key.name()), Some(key));
        }
        assert_eq!(ParameterKey::from_name("HYSTERESIS"), None);
    }

    #[test]
    fn test_json_document() {
        let config = StrategyConfig::from_json_str(
            r#"{
                "shared": { "probe_suffix": "/ping" },
                "estimators": { "window_ms": 8000 },
                "defaults": { "REQUIREMENT_MAXDELAY": 150.0 },
                "prefixes": { "/video": { "TAINTING_ENABLED": 0 } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.shared.probe_suffix, "/ping");
        assert_eq!(config.shared.prefix_offset, 1);
        assert_eq!(config.estimators.window(), Duration::from_secs(8));
        assert_eq!(config.estimators.interest_lifetime(), Duration::from_secs(2));

        let params = config.parameters().unwrap();
        assert_eq!(params.parameter(ParameterKey::MaxDelay, "/audio"), 150.0);
        assert_eq!(params.parameter(ParameterKey::TaintingEnabled, "/video"), 0.0);
        assert_eq!(params.parameter(ParameterKey::TaintingEnabled, "/audio"), 1.0);
    }

    #[test]
    fn test_json_rejects_unknown_parameter() {
        let config =
            StrategyConfig::from_json_str(r#"{ "defaults": { "NOT_A_KEY": 1 } }"#).unwrap();
        assert!(matches!(config.parameters(), Err(NdnError::Config(_))));
        assert!(StrategyConfig::from_json_str("{ not json").is_err());
    }
}
