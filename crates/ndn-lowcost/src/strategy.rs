//! Lowest-cost forwarding strategy
//!
//! Regular interests follow the working face of their prefix. Probes
//! re-evaluate the working face against the prefix's requirements and, at a
//! configured rate, are tainted and redirected to an alternative face so the
//! alternative gets measured. A `Tainted` nack tells downstream routers to
//! drop their bookkeeping for the redirected probe.

use crate::estimators::TimeWindowLossEstimator;
use crate::measurements::{MeasurementInfo, MeasurementTable, PrefixId};
use crate::requirements::{RequirementKind, Requirements};
use crate::selection::{alternative_face, best_route, face_via_id, TaintingGate};
use crate::stats::StrategyStats;
use ndn_common::{
    ConfigProvider, Data, EstimatorSettings, FaceId, ForwardingSubstrate, Interest, Nack,
    NackReason, Name, NdnResult, NextHop, ParameterKey, PendingEntry, SharedParameters,
    StrategyConfig,
};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn, Level};

/// Strategy name under which the forwarder registers this strategy
pub const STRATEGY_NAME: &str = "/localhost/nfd/strategy/lowest-cost/%FD%01";

/// Tunables refreshed from the configuration provider on every event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrefixParameters {
    /// Whether probes may be tainted
    pub tainting_enabled: bool,
    /// Next hops required before tainting
    pub min_faces_for_tainting: usize,
    /// One probe in this many is tainted
    pub max_tainted_probes: f64,
    /// Delay limit (ms)
    pub max_delay: f64,
    /// Loss limit (fraction)
    pub max_loss: f64,
    /// Bandwidth floor (KB/s)
    pub min_bandwidth: f64,
    /// Retention of probe send times
    pub rtt_table_max_duration: Duration,
}

impl PrefixParameters {
    /// Read every tunable for `prefix`
    pub fn load(config: &dyn ConfigProvider, prefix: &str) -> Self {
        Self::from_lookup(|key| config.parameter(key, prefix))
    }

    fn from_lookup(lookup: impl Fn(ParameterKey) -> f64) -> Self {
        Self {
            tainting_enabled: lookup(ParameterKey::TaintingEnabled) != 0.0,
            min_faces_for_tainting: lookup(ParameterKey::MinFacesForTainting).max(0.0) as usize,
            max_tainted_probes: lookup(ParameterKey::MaxTaintedProbesPercentage),
            max_delay: lookup(ParameterKey::MaxDelay),
            max_loss: lookup(ParameterKey::MaxLoss),
            min_bandwidth: lookup(ParameterKey::MinBandwidth),
            rtt_table_max_duration: Duration::from_millis(
                lookup(ParameterKey::RttTableMaxDuration).max(0.0) as u64,
            ),
        }
    }
}

impl Default for PrefixParameters {
    fn default() -> Self {
        Self::from_lookup(ParameterKey::default_value)
    }
}

/// Probe-driven lowest-cost strategy
pub struct LowestCostStrategy {
    config: Arc<dyn ConfigProvider>,
    shared: SharedParameters,
    settings: EstimatorSettings,
    /// Limits from the strategy parameter string, applied to new prefixes
    template: Option<Requirements>,
    params: PrefixParameters,
    tainting_gate: TaintingGate,
    measurements: MeasurementTable,
    stats: StrategyStats,
}

impl LowestCostStrategy {
    /// Create strategy
    ///
    /// Fails if the estimator window is not larger than the interest lifetime.
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        shared: SharedParameters,
        settings: EstimatorSettings,
    ) -> NdnResult<Self> {
        TimeWindowLossEstimator::validate(settings.interest_lifetime(), settings.window())?;

        Ok(Self {
            config,
            shared,
            settings,
            template: None,
            params: PrefixParameters::default(),
            tainting_gate: TaintingGate::new(),
            measurements: MeasurementTable::new(),
            stats: StrategyStats::new(),
        })
    }

    /// Create from a configuration document
    pub fn from_config(config: &StrategyConfig) -> NdnResult<Self> {
        let parameters = config.parameters()?;
        Self::new(
            Arc::new(parameters),
            config.shared.clone(),
            config.estimators,
        )
    }

    /// Apply a strategy parameter string such as `maxdelay=80,maxloss=0.05`
    ///
    /// The limits override the configured ones for every prefix created afterwards.
    pub fn with_parameters(mut self, parameters: &str) -> NdnResult<Self> {
        let mut requirements = Requirements::new();
        if !requirements.parse(parameters)? {
            warn!("Strategy parameters {:?} set no requirement", parameters);
        }
        self.template = Some(requirements);
        Ok(self)
    }

    /// Handle an incoming interest
    pub fn after_receive_interest<S: ForwardingSubstrate>(
        &mut self,
        substrate: &mut S,
        in_face: FaceId,
        interest: &Interest,
        entry: &mut S::Entry,
    ) -> NdnResult<()> {
        debug!("Incoming interest {} from face {}", interest.name, in_face);
        self.stats.interests.inc();

        let next_hops = substrate.next_hops(entry);
        let prefix = interest.name.prefix_components(self.shared.prefix_offset);
        let known = self.refresh_parameters(prefix);

        let Some(first) = next_hops.first().map(|hop| hop.face) else {
            warn!("No next hop for {}, answering with NoRoute", interest.name);
            substrate.send_nack(entry, in_face, NackReason::NoRoute);
            self.stats.nacks_sent.inc();
            return Ok(());
        };

        let params = self.params;
        let id = match known {
            Some(id) => id,
            None => {
                let measurement =
                    Self::new_measurement(self.settings, &params, self.template.as_ref(), || {
                        best_route(&*substrate, &*entry, &next_hops)
                    });
                let prefix = Name::from(prefix);
                info!(
                    "New measurements for {}, working face {:?}",
                    prefix, measurement.working_face
                );
                self.measurements.insert(prefix, measurement)
            }
        };
        let Some((prefix, measurement)) = self.measurements.get_with_uri(id) else {
            warn!("Measurements of {} missing from the table", interest.name);
            return Ok(());
        };

        let working = match measurement
            .working_face
            .filter(|face| next_hops.iter().any(|hop| hop.face == *face))
        {
            Some(face) => face,
            None => {
                let face = best_route(&*substrate, &*entry, &next_hops).unwrap_or(first);
                debug!(
                    "Working face {:?} of {} no longer a next hop, using {}",
                    measurement.working_face, prefix, face
                );
                measurement.working_face = Some(face);
                face
            }
        };

        let name = interest.name.to_uri();
        let mut outgoing = Cow::Borrowed(interest);
        let mut selected = working;

        if is_probe(&name, &self.shared.probe_suffix) {
            self.stats.probes.inc();

            let better =
                Self::look_for_better_face(&*substrate, &*entry, &next_hops, measurement, working)?;
            if better != working {
                info!(
                    "Working face of {} switched from {} to {}",
                    prefix, working, better
                );
                self.stats.face_switches.inc();
            }
            measurement.working_face = Some(better);
            selected = better;

            if !interest.tainted {
                let now = Instant::now();
                // The gate advances even while tainting is disabled
                if next_hops.len() >= params.min_faces_for_tainting
                    && self.tainting_gate.allow(params.max_tainted_probes)
                    && params.tainting_enabled
                {
                    outgoing.to_mut().tainted = true;
                    measurement.mark_tainted(&name, now);
                    selected = alternative_face(selected, &next_hops);
                    info!("Tainted probe {}, redirecting to face {}", name, selected);

                    substrate.send_nack(entry, in_face, NackReason::Tainted);
                    info!("Sent nack for {} to face {} with reason Tainted", name, in_face);
                    entry.insert_or_update_in_record(in_face, &outgoing);

                    self.stats.tainted_probes.inc();
                    self.stats.nacks_sent.inc();
                }

                measurement.record_send_time(&name, now);
                measurement.estimation(selected)?.add_sent_interest(&name);
            }
        }

        if selected == in_face {
            debug!("Selected face {} is the incoming face of {}", selected, name);
            selected = alternative_face(selected, &next_hops);
        }

        let out_face = face_via_id(selected, &next_hops).map_or(first, |hop| hop.face);
        substrate.send_interest(entry, out_face, &outgoing);
        debug!("Sent interest {} on face {}", name, out_face);

        if tracing::enabled!(Level::INFO) {
            let working = measurement.working_face.unwrap_or(first);
            Self::log_face_status(measurement, "working", working);
            Self::log_face_status(measurement, "selected", out_face);
        }

        Ok(())
    }

    /// Handle data satisfying a pending interest
    pub fn before_satisfy_interest<E: PendingEntry>(
        &mut self,
        entry: &E,
        in_face: FaceId,
        data: &Data,
    ) -> NdnResult<()> {
        debug!("Received data {} from face {}", data.name, in_face);

        let prefix = data.name.prefix_components(self.shared.prefix_offset);
        let known = self.refresh_parameters(prefix);

        let name = data.name.to_uri();
        if !is_probe(&name, &self.shared.probe_suffix) {
            return Ok(());
        }

        let Some((prefix, measurement)) = known.and_then(|id| self.measurements.get_with_uri(id))
        else {
            debug!("No measurements for {}, ignoring probe data", data.name);
            return Ok(());
        };

        let tainted_by_me = measurement.take_tainted(&name);
        if tainted_by_me {
            info!("Removed {} from self-tainted probes", name);
        }

        if !tainted_by_me && data.tainted {
            // Cannot tell whether this node is upstream or downstream of the tainter
            trace!("Probe data {} tainted elsewhere, not measured", name);
            return Ok(());
        }

        let now = Instant::now();
        measurement
            .estimation(in_face)?
            .add_satisfied_interest(data.content_size, &name);
        self.stats.measurements.inc();

        if entry.has_in_records() && entry.has_out_record(in_face) {
            match measurement.take_rtt_sample(&name, now) {
                Some(rtt) => {
                    measurement.estimation(in_face)?.add_rtt_measurement(rtt);
                    self.stats.record_rtt(rtt);
                    trace!("RTT {:?} for {} on face {}", rtt, name, in_face);
                }
                None => debug!("No send time for {}, RTT sample skipped", name),
            }

            let max_age = self.params.rtt_table_max_duration;
            let purged = measurement.purge_rtt_times(now, max_age);
            if purged > 0 {
                trace!("Purged {} stale send times of {}", purged, prefix);
            }
            let purged = measurement.purge_tainted(now, max_age);
            if purged > 0 {
                debug!("Dropped {} unanswered self-tainted probes of {}", purged, prefix);
            }
        }

        Ok(())
    }

    /// Handle a nack from upstream
    pub fn after_receive_nack<S: ForwardingSubstrate>(
        &mut self,
        substrate: &mut S,
        in_face: FaceId,
        nack: &Nack,
        entry: &mut S::Entry,
    ) -> NdnResult<()> {
        let interest_name = &entry.interest().name;
        debug!(
            "Received nack for {} with reason {}",
            interest_name, nack.reason
        );

        let name = interest_name.to_uri();
        let prefix = interest_name.prefix_components(self.shared.prefix_offset);
        let known = self.refresh_parameters(prefix);

        if nack.reason != NackReason::Tainted {
            return Ok(());
        }

        if let Some(face) = known
            .and_then(|id| self.measurements.get_mut(id))
            .and_then(|measurement| measurement.face_mut(in_face))
        {
            face.remove_sent_interest(&name);
            info!("Removed measurements for {} on face {}", name, in_face);
        }

        match entry.first_in_face() {
            Some(downstream) => {
                substrate.send_nack(entry, downstream, nack.reason);
                self.stats.nacks_propagated.inc();
                info!("Propagated tainted nack for {} to face {}", name, downstream);
            }
            None => warn!("No downstream face for tainted nack of {}", name),
        }

        Ok(())
    }

    /// Measurements of `prefix`
    pub fn measurement_for(&self, prefix: &Name) -> Option<&MeasurementInfo> {
        self.measurements.find(prefix)
    }

    /// Working face of `prefix`
    pub fn working_face(&self, prefix: &Name) -> Option<FaceId> {
        self.measurement_for(prefix)?.working_face
    }

    /// Number of measured prefixes
    pub fn prefix_count(&self) -> usize {
        self.measurements.len()
    }

    /// Tunables of the last handled prefix
    pub fn parameters(&self) -> &PrefixParameters {
        &self.params
    }

    /// Strategy counters
    pub fn stats(&self) -> &StrategyStats {
        &self.stats
    }

    /// Reload the tunables of the prefix made of `components`; returns its
    /// record id if the prefix is already measured
    fn refresh_parameters(&mut self, components: &[String]) -> Option<PrefixId> {
        let id = self.measurements.lookup(components);
        let config = self.config.as_ref();
        self.params = match id.and_then(|id| self.measurements.uri(id)) {
            Some(uri) => PrefixParameters::load(config, uri),
            None => PrefixParameters::load(config, &Name::from(components).to_uri()),
        };
        id
    }

    fn new_measurement(
        settings: EstimatorSettings,
        params: &PrefixParameters,
        template: Option<&Requirements>,
        working_face: impl FnOnce() -> Option<FaceId>,
    ) -> MeasurementInfo {
        let mut measurement = MeasurementInfo::new(settings);
        let requirements = &mut measurement.requirements;
        requirements.set_limit(RequirementKind::Delay, params.max_delay);
        requirements.set_limit(RequirementKind::Loss, params.max_loss);
        requirements.set_limit(RequirementKind::Bandwidth, params.min_bandwidth);
        if let Some(template) = template {
            requirements.merge_from(template);
        }
        measurement.working_face = working_face();
        measurement
    }

    fn look_for_better_face<S: ForwardingSubstrate>(
        substrate: &S,
        entry: &S::Entry,
        next_hops: &[NextHop],
        measurement: &mut MeasurementInfo,
        working: FaceId,
    ) -> NdnResult<FaceId> {
        if next_hops.len() <= 2 {
            debug!("At most two next hops, using best route");
            return Ok(best_route(substrate, entry, next_hops).unwrap_or(working));
        }

        let current = measurement.estimation(working)?;
        let metrics = current.metrics();
        if current.looks_unmeasured(&metrics) {
            trace!("Working face {} not measured yet", working);
            return Ok(working);
        }
        if metrics.meets(&measurement.requirements) {
            debug!("Working face {} performs well enough", working);
            return Ok(working);
        }

        let alternative = alternative_face(working, next_hops);
        let alternative_metrics = measurement.estimation(alternative)?.metrics();
        if alternative_metrics.meets(&measurement.requirements) {
            if substrate.can_forward_to(entry, alternative) {
                info!("Well performing alternative face found: {}", alternative);
                return Ok(alternative);
            }
        } else {
            let next = alternative_face(alternative, next_hops);
            if substrate.can_forward_to(entry, next) {
                info!("Alternative {} also underperforms, trying face {}", alternative, next);
                return Ok(next);
            }
        }

        Ok(working)
    }

    fn log_face_status(measurement: &mut MeasurementInfo, label: &str, face: FaceId) {
        if let Some(estimation) = measurement.face_mut(face) {
            let metrics = estimation.metrics();
            info!(
                "Face ({} path) {} - delay: {:.1}ms, loss: {:.1}%, bw: {:.2}KB/s",
                label,
                face,
                metrics.delay_ms,
                metrics.loss * 100.0,
                metrics.bandwidth_kbps
            );
        }
    }
}

fn is_probe(uri: &str, probe_suffix: &str) -> bool {
    !probe_suffix.is_empty() && uri.contains(probe_suffix)
}

impl fmt::Debug for LowestCostStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LowestCostStrategy")
            .field("shared", &self.shared)
            .field("settings", &self.settings)
            .field("template", &self.template)
            .field("params", &self.params)
            .field("prefixes", &self.measurements.len())
            .finish_non_exhaustive()
    }
}
