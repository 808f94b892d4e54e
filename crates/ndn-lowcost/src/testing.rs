//! In-memory forwarder for strategy tests

use ndn_common::{
    FaceId, ForwardingSubstrate, Interest, NackReason, Name, NextHop, PendingEntry,
};
use std::collections::HashSet;

/// Route strategy logs to the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Next hops with increasing cost, in the given order
pub fn hops(faces: &[u64]) -> Vec<NextHop> {
    faces
        .iter()
        .enumerate()
        .map(|(cost, face)| NextHop::new(FaceId(*face), cost as u64))
        .collect()
}

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub interest: Interest,
    pub in_faces: Vec<FaceId>,
    pub out_faces: HashSet<FaceId>,
}

impl MockEntry {
    pub fn new(interest: Interest, in_face: u64) -> Self {
        Self {
            interest,
            in_faces: vec![FaceId(in_face)],
            out_faces: HashSet::new(),
        }
    }

    pub fn probe(uri: &str, in_face: u64) -> Self {
        Self::new(Interest::new(Name::parse(uri).unwrap()), in_face)
    }
}

impl PendingEntry for MockEntry {
    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn has_in_records(&self) -> bool {
        !self.in_faces.is_empty()
    }

    fn first_in_face(&self) -> Option<FaceId> {
        self.in_faces.first().copied()
    }

    fn has_out_record(&self, face: FaceId) -> bool {
        self.out_faces.contains(&face)
    }

    fn insert_or_update_in_record(&mut self, face: FaceId, _interest: &Interest) {
        if !self.in_faces.contains(&face) {
            self.in_faces.push(face);
        }
    }
}

#[derive(Debug, Default)]
pub struct MockForwarder {
    pub hops: Vec<NextHop>,
    pub ineligible: HashSet<FaceId>,
    pub sent_interests: Vec<(FaceId, Interest)>,
    pub sent_nacks: Vec<(FaceId, NackReason)>,
}

impl MockForwarder {
    pub fn new(faces: &[u64]) -> Self {
        Self {
            hops: hops(faces),
            ..Self::default()
        }
    }

    pub fn last_interest(&self) -> Option<&(FaceId, Interest)> {
        self.sent_interests.last()
    }
}

impl ForwardingSubstrate for MockForwarder {
    type Entry = MockEntry;

    fn next_hops(&self, _entry: &MockEntry) -> Vec<NextHop> {
        self.hops.clone()
    }

    fn can_forward_to(&self, entry: &MockEntry, face: FaceId) -> bool {
        !self.ineligible.contains(&face) && !entry.in_faces.contains(&face)
    }

    fn send_interest(&mut self, entry: &mut MockEntry, face: FaceId, interest: &Interest) {
        entry.out_faces.insert(face);
        self.sent_interests.push((face, interest.clone()));
    }

    fn send_nack(&mut self, entry: &mut MockEntry, face: FaceId, reason: NackReason) {
        entry.in_faces.retain(|in_face| *in_face != face);
        self.sent_nacks.push((face, reason));
    }
}
