//! Interest Path Benchmarks
//!
//! Cost of one strategy decision for regular interests and probes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndn_common::{
    Data, EstimatorSettings, FaceId, ForwardingSubstrate, Interest, NackReason, Name, NextHop,
    ParameterConfiguration, PendingEntry, SharedParameters,
};
use ndn_lowcost::LowestCostStrategy;
use std::sync::Arc;

struct Entry {
    interest: Interest,
    in_face: Option<FaceId>,
    out_face: Option<FaceId>,
}

impl PendingEntry for Entry {
    fn interest(&self) -> &Interest {
        &self.interest
    }

    fn has_in_records(&self) -> bool {
        self.in_face.is_some()
    }

    fn first_in_face(&self) -> Option<FaceId> {
        self.in_face
    }

    fn has_out_record(&self, face: FaceId) -> bool {
        self.out_face == Some(face)
    }

    fn insert_or_update_in_record(&mut self, face: FaceId, _interest: &Interest) {
        self.in_face = Some(face);
    }
}

/// Forwarder that only remembers the last decision
struct Sink {
    hops: Vec<NextHop>,
    last: Option<FaceId>,
}

impl ForwardingSubstrate for Sink {
    type Entry = Entry;

    fn next_hops(&self, _entry: &Entry) -> Vec<NextHop> {
        self.hops.clone()
    }

    fn can_forward_to(&self, entry: &Entry, face: FaceId) -> bool {
        entry.in_face != Some(face)
    }

    fn send_interest(&mut self, entry: &mut Entry, face: FaceId, _interest: &Interest) {
        entry.out_face = Some(face);
        self.last = Some(face);
    }

    fn send_nack(&mut self, entry: &mut Entry, face: FaceId, _reason: NackReason) {
        if entry.in_face == Some(face) {
            entry.in_face = None;
        }
    }
}

fn setup(faces: u64) -> (LowestCostStrategy, Sink) {
    let strategy = LowestCostStrategy::new(
        Arc::new(ParameterConfiguration::new()),
        SharedParameters::default(),
        EstimatorSettings::default(),
    )
    .unwrap();
    let sink = Sink {
        hops: (1..=faces).map(|f| NextHop::new(FaceId(f), f)).collect(),
        last: None,
    };
    (strategy, sink)
}

fn entry_for(name: Name) -> Entry {
    Entry {
        interest: Interest::new(name),
        in_face: Some(FaceId(100)),
        out_face: None,
    }
}

fn bench_regular_interest(c: &mut Criterion) {
    let mut group = c.benchmark_group("regular_interest");

    for faces in [1u64, 3, 8] {
        let (mut strategy, mut sink) = setup(faces);
        let name = Name::parse("/video/app/seg1").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(faces), &faces, |b, _| {
            b.iter(|| {
                let mut entry = entry_for(name.clone());
                let interest = entry.interest.clone();
                strategy
                    .after_receive_interest(&mut sink, FaceId(100), &interest, &mut entry)
                    .unwrap();
                black_box(sink.last)
            })
        });
    }

    group.finish();
}

fn bench_probe_round_trip(c: &mut Criterion) {
    let (mut strategy, mut sink) = setup(3);
    let mut seq = 0u64;

    c.bench_function("probe_round_trip", |b| {
        b.iter(|| {
            seq += 1;
            let name = Name::parse("/video/probe").unwrap().append(seq.to_string());
            let mut entry = entry_for(name.clone());
            let interest = entry.interest.clone();
            strategy
                .after_receive_interest(&mut sink, FaceId(100), &interest, &mut entry)
                .unwrap();

            let data = Data::new(name, 1024);
            let face = sink.last.unwrap_or(FaceId(1));
            strategy.before_satisfy_interest(&entry, face, &data).unwrap();
        })
    });
}

criterion_group!(benches, bench_regular_interest, bench_probe_round_trip);
criterion_main!(benches);
