//! Per-prefix measurement store
//!
//! Records live in an arena indexed by [`PrefixId`]; the name → id map is
//! queried once per event with a borrowed prefix, and each record keeps its
//! prefix URI for configuration lookups.

use crate::estimation::FaceEstimation;
use crate::requirements::Requirements;
use ndn_common::{EstimatorSettings, FaceId, Name, NdnResult};
use std::collections::{hash_map::Entry, HashMap};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Measurements of one prefix
#[derive(Debug)]
pub struct MeasurementInfo {
    faces: HashMap<FaceId, FaceEstimation>,
    /// Probe name → send time, awaiting the matching data
    rtt_times: HashMap<String, Instant>,
    /// Probes this node tainted and is responsible for measuring, with taint time
    my_tainted_probes: HashMap<String, Instant>,
    /// Limits applied when judging faces
    pub requirements: Requirements,
    /// Primary face for regular traffic
    pub working_face: Option<FaceId>,
    settings: EstimatorSettings,
}

impl MeasurementInfo {
    /// Create an empty record
    pub fn new(settings: EstimatorSettings) -> Self {
        Self {
            faces: HashMap::new(),
            rtt_times: HashMap::new(),
            my_tainted_probes: HashMap::new(),
            requirements: Requirements::new(),
            working_face: None,
            settings,
        }
    }

    /// Estimation of `face`, created on first use
    pub fn estimation(&mut self, face: FaceId) -> NdnResult<&mut FaceEstimation> {
        match self.faces.entry(face) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                trace!("Creating estimation for face {}", face);
                Ok(slot.insert(FaceEstimation::new(&self.settings)?))
            }
        }
    }

    /// Existing estimation of `face`
    pub fn face(&self, face: FaceId) -> Option<&FaceEstimation> {
        self.faces.get(&face)
    }

    /// Existing estimation of `face`, mutable
    pub fn face_mut(&mut self, face: FaceId) -> Option<&mut FaceEstimation> {
        self.faces.get_mut(&face)
    }

    /// Faces with an estimation
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Record the send time of a probe
    pub fn record_send_time(&mut self, name: &str, at: Instant) {
        self.rtt_times.insert(name.to_string(), at);
    }

    /// Remove the send time of `name` and return the elapsed time
    pub fn take_rtt_sample(&mut self, name: &str, now: Instant) -> Option<Duration> {
        self.rtt_times
            .remove(name)
            .map(|sent| now.saturating_duration_since(sent))
    }

    /// Drop send times older than `max_age`; returns how many were dropped
    pub fn purge_rtt_times(&mut self, now: Instant, max_age: Duration) -> usize {
        let before = self.rtt_times.len();
        self.rtt_times
            .retain(|_, sent| now.saturating_duration_since(*sent) <= max_age);
        before - self.rtt_times.len()
    }

    /// Probe send times held
    pub fn pending_rtt_samples(&self) -> usize {
        self.rtt_times.len()
    }

    /// Whether a send time is held for `name`
    pub fn has_send_time(&self, name: &str) -> bool {
        self.rtt_times.contains_key(name)
    }

    /// Remember a probe tainted by this node at `at`
    pub fn mark_tainted(&mut self, name: &str, at: Instant) {
        self.my_tainted_probes.insert(name.to_string(), at);
    }

    /// Consume ownership of a self-tainted probe; true if it was ours
    pub fn take_tainted(&mut self, name: &str) -> bool {
        self.my_tainted_probes.remove(name).is_some()
    }

    /// Drop self-tainted probes older than `max_age` whose data never came
    /// back; returns how many were dropped
    pub fn purge_tainted(&mut self, now: Instant, max_age: Duration) -> usize {
        let before = self.my_tainted_probes.len();
        self.my_tainted_probes
            .retain(|_, at| now.saturating_duration_since(*at) <= max_age);
        before - self.my_tainted_probes.len()
    }

    /// Whether `name` was tainted by this node
    pub fn is_tainted_by_me(&self, name: &str) -> bool {
        self.my_tainted_probes.contains_key(name)
    }

    /// Self-tainted probes still awaiting data
    pub fn tainted_count(&self) -> usize {
        self.my_tainted_probes.len()
    }
}

/// Interned prefix handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrefixId(u32);

impl PrefixId {
    /// Arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Record {
    prefix: Name,
    uri: String,
    info: MeasurementInfo,
}

/// Arena of measurement records keyed by prefix
#[derive(Debug, Default)]
pub struct MeasurementTable {
    index: HashMap<Name, PrefixId>,
    records: Vec<Record>,
}

impl MeasurementTable {
    /// Create empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the prefix made of `components`, if known
    pub fn lookup(&self, components: &[String]) -> Option<PrefixId> {
        self.index.get(components).copied()
    }

    /// Add a record; an existing prefix keeps its id and record
    pub fn insert(&mut self, prefix: Name, info: MeasurementInfo) -> PrefixId {
        if let Some(id) = self.lookup(prefix.components()) {
            return id;
        }
        let id = PrefixId(self.records.len() as u32);
        self.index.insert(prefix.clone(), id);
        self.records.push(Record {
            uri: prefix.to_uri(),
            prefix,
            info,
        });
        id
    }

    /// Record by id
    pub fn get(&self, id: PrefixId) -> Option<&MeasurementInfo> {
        self.records.get(id.index()).map(|record| &record.info)
    }

    /// Record by id, mutable
    pub fn get_mut(&mut self, id: PrefixId) -> Option<&mut MeasurementInfo> {
        self.records.get_mut(id.index()).map(|record| &mut record.info)
    }

    /// Record by id together with its prefix URI
    pub fn get_with_uri(&mut self, id: PrefixId) -> Option<(&str, &mut MeasurementInfo)> {
        self.records
            .get_mut(id.index())
            .map(|record| (record.uri.as_str(), &mut record.info))
    }

    /// Prefix of `id`
    pub fn prefix(&self, id: PrefixId) -> Option<&Name> {
        self.records.get(id.index()).map(|record| &record.prefix)
    }

    /// Prefix URI of `id`, rendered once at insertion
    pub fn uri(&self, id: PrefixId) -> Option<&str> {
        self.records.get(id.index()).map(|record| record.uri.as_str())
    }

    /// Record for `prefix`
    pub fn find(&self, prefix: &Name) -> Option<&MeasurementInfo> {
        self.lookup(prefix.components()).and_then(|id| self.get(id))
    }

    /// Record for `prefix`, mutable
    pub fn find_mut(&mut self, prefix: &Name) -> Option<&mut MeasurementInfo> {
        let id = self.lookup(prefix.components())?;
        self.get_mut(id)
    }

    /// Number of prefixes
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no prefix is measured
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
