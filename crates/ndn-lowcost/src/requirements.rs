//! Acceptable-performance limits per metric

use ndn_common::{NdnError, NdnResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{trace, warn};

/// Metric a limit can be placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequirementKind {
    /// Throughput in KB/s (higher is better)
    Bandwidth,
    /// Routing cost
    Cost,
    /// Round-trip delay in ms
    Delay,
    /// Loss fraction
    Loss,
}

impl RequirementKind {
    /// All kinds
    pub const ALL: [RequirementKind; 4] = [Self::Bandwidth, Self::Cost, Self::Delay, Self::Loss];

    /// Whether a higher value is preferable (only bandwidth)
    pub const fn is_upward(self) -> bool {
        matches!(self, Self::Bandwidth)
    }

    /// Map a parameter key to a kind by substring (`maxloss`, `maxdelay`, `maxcost`, `minbw`)
    pub fn from_key(key: &str) -> Option<Self> {
        if key.contains("maxloss") {
            Some(Self::Loss)
        } else if key.contains("maxdelay") {
            Some(Self::Delay)
        } else if key.contains("maxcost") {
            Some(Self::Cost)
        } else if key.contains("minbw") {
            Some(Self::Bandwidth)
        } else {
            None
        }
    }
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bandwidth => "bandwidth",
            Self::Cost => "cost",
            Self::Delay => "delay",
            Self::Loss => "loss",
        };
        f.write_str(s)
    }
}

/// Split `k1=v1,k2=v2` into a map
///
/// `%2C` and `%3D` are un-escaped first. A fragment without `=` maps to
/// itself, empty fragments are skipped and later keys override earlier ones.
pub fn parameter_map(parameters: &str) -> BTreeMap<String, String> {
    let unescaped = parameters.replace("%2C", ",").replace("%3D", "=");

    unescaped
        .split(',')
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| {
            let key = fragment.split('=').next().unwrap_or(fragment);
            let value = fragment.rsplit('=').next().unwrap_or(fragment);
            (key.to_string(), value.to_string())
        })
        .collect()
}

/// Limits currently held by a strategy for one prefix
#[derive(Debug, Clone, PartialEq)]
pub struct Requirements {
    /// (lower, upper) per kind
    limits: BTreeMap<RequirementKind, (f64, f64)>,
    supported: BTreeSet<RequirementKind>,
}

impl Requirements {
    /// Create supporting every kind
    pub fn new() -> Self {
        Self::with_supported(RequirementKind::ALL)
    }

    /// Create supporting only the given kinds
    pub fn with_supported(supported: impl IntoIterator<Item = RequirementKind>) -> Self {
        Self {
            limits: BTreeMap::new(),
            supported: supported.into_iter().collect(),
        }
    }

    /// Whether higher values of `kind` are preferable
    pub fn is_upward_metric(kind: RequirementKind) -> bool {
        kind.is_upward()
    }

    /// Parse `maxdelay=200,maxloss=0.1,minbw=10-20`
    ///
    /// Unknown keys are logged and skipped, unsupported kinds are ignored.
    /// Returns whether at least one supported kind was set. On error no limit
    /// is changed.
    pub fn parse(&mut self, parameters: &str) -> NdnResult<bool> {
        let mut parsed = BTreeMap::new();

        for (key, value) in parameter_map(parameters) {
            let Some(kind) = RequirementKind::from_key(&key) else {
                warn!("Unknown parameter: {}", key);
                continue;
            };
            if !self.supported.contains(&kind) {
                trace!("Skipping unsupported requirement {}", kind);
                continue;
            }

            let limits = match value.split_once('-') {
                Some((lower, upper)) => (Self::number(&key, lower)?, Self::number(&key, upper)?),
                None => {
                    let v = Self::number(&key, &value)?;
                    (v, v)
                }
            };
            parsed.insert(kind, limits);
        }

        let found_supported = !parsed.is_empty();
        self.limits.append(&mut parsed);
        Ok(found_supported)
    }

    fn number(key: &str, raw: &str) -> NdnResult<f64> {
        raw.trim()
            .parse()
            .map_err(|_| NdnError::InvalidParameter {
                key: key.to_string(),
                value: raw.to_string(),
            })
    }

    /// Set a single-valued limit
    pub fn set_limit(&mut self, kind: RequirementKind, value: f64) {
        if !self.supported.contains(&kind) {
            warn!("Requirement {} not supported, ignoring limit {}", kind, value);
            return;
        }
        self.limits.insert(kind, (value, value));
    }

    /// (lower, upper) for `kind`
    pub fn limits(&self, kind: RequirementKind) -> Option<(f64, f64)> {
        self.limits.get(&kind).copied()
    }

    /// Scalar limit for `kind`; the lower bound when a range is configured
    pub fn limit(&self, kind: RequirementKind) -> Option<f64> {
        let (lower, upper) = self.limits(kind)?;
        if lower != upper {
            warn!("Different limits for {}, returning lower one", kind);
        }
        Some(lower)
    }

    /// Whether a limit is set for `kind`
    pub fn contains(&self, kind: RequirementKind) -> bool {
        self.limits.contains_key(&kind)
    }

    /// Kinds with a configured limit
    pub fn own_kinds(&self) -> BTreeSet<RequirementKind> {
        self.limits.keys().copied().collect()
    }

    /// Overlay the limits of `other` (restricted to supported kinds)
    pub fn merge_from(&mut self, other: &Requirements) {
        for (kind, limits) in &other.limits {
            if self.supported.contains(kind) {
                self.limits.insert(*kind, *limits);
            }
        }
    }

    /// Whether `value` is acceptable for `kind`; true when no limit is set
    pub fn is_met(&self, kind: RequirementKind, value: f64) -> bool {
        match self.limit(kind) {
            Some(limit) if kind.is_upward() => value >= limit,
            Some(limit) => value <= limit,
            None => true,
        }
    }
}

impl Default for Requirements {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_map() {
        let map = parameter_map("maxdelay=200%2Cmaxloss%3D0.1,minbw=5-10,flag,");
        assert_eq!(map.get("maxdelay").map(String::as_str), Some("200"));
        assert_eq!(map.get("maxloss").map(String::as_str), Some("0.1"));
        assert_eq!(map.get("minbw").map(String::as_str), Some("5-10"));
        assert_eq!(map.get("flag").map(String::as_str), Some("flag"));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_parse() {
        let mut req = Requirements::new();
        assert!(req.parse("maxdelay=200,maxloss=0.1,unknown=3,minbw=5-10").unwrap());

        assert_eq!(req.limit(RequirementKind::Delay), Some(200.0));
        assert_eq!(req.limit(RequirementKind::Loss), Some(0.1));
        assert_eq!(req.limits(RequirementKind::Bandwidth), Some((5.0, 10.0)));
        assert_eq!(req.limit(RequirementKind::Bandwidth), Some(5.0));
        assert!(!req.contains(RequirementKind::Cost));
        assert_eq!(req.limit(RequirementKind::Cost), None);
        assert_eq!(
            req.own_kinds().into_iter().collect::<Vec<_>>(),
            vec![RequirementKind::Bandwidth, RequirementKind::Delay, RequirementKind::Loss]
        );
    }

    #[test]
    fn test_parse_supported_only() {
        let mut req = Requirements::with_supported([RequirementKind::Delay]);
        assert!(!req.parse("maxloss=0.2,maxcost=4").unwrap());
        assert!(req.own_kinds().is_empty());

        assert!(req.parse("prefix-maxdelay=50").unwrap());
        assert_eq!(req.limit(RequirementKind::Delay), Some(50.0));

        req.set_limit(RequirementKind::Loss, 0.5);
        assert!(!req.contains(RequirementKind::Loss));
    }

    #[test]
    fn test_parse_invalid_value() {
        let mut req = Requirements::new();
        assert!(matches!(
            req.parse("maxdelay=fast"),
            Err(NdnError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_failed_parse_leaves_limits_unchanged() {
        let mut req = Requirements::new();
        req.set_limit(RequirementKind::Delay, 200.0);

        assert!(req.parse("maxdelay=80,maxloss=x").is_err());
        assert_eq!(req.limit(RequirementKind::Delay), Some(200.0));
        assert!(!req.contains(RequirementKind::Loss));
    }

    #[test]
    fn test_polarity() {
        assert!(Requirements::is_upward_metric(RequirementKind::Bandwidth));
        for kind in [RequirementKind::Cost, RequirementKind::Delay, RequirementKind::Loss] {
            assert!(!Requirements::is_upward_metric(kind));
        }

        let mut req = Requirements::new();
        req.set_limit(RequirementKind::Delay, 200.0);
        req.set_limit(RequirementKind::Bandwidth, 10.0);

        assert!(req.is_met(RequirementKind::Delay, 200.0));
        assert!(!req.is_met(RequirementKind::Delay, 250.0));
        assert!(req.is_met(RequirementKind::Bandwidth, 12.0));
        assert!(!req.is_met(RequirementKind::Bandwidth, 9.0));
        assert!(req.is_met(RequirementKind::Loss, 0.9));
    }

    #[test]
    fn test_merge() {
        let mut base = Requirements::new();
        base.set_limit(RequirementKind::Delay, 200.0);
        base.set_limit(RequirementKind::Loss, 0.1);

        let mut overlay = Requirements::new();
        overlay.parse("maxdelay=80").unwrap();
        base.merge_from(&overlay);

        assert_eq!(base.limit(RequirementKind::Delay), Some(80.0));
        assert_eq!(base.limit(RequirementKind::Loss), Some(0.1));
    }
}
