//! Contracts a strategy needs from the host forwarder
//!
//! The forwarder owns the face table, FIB and PIT. A strategy only sees a
//! pending entry for the request it is deciding on and a handful of send
//! primitives.

use crate::{FaceId, Interest, NackReason, NextHop};

/// Per-request PIT bookkeeping
pub trait PendingEntry {
    /// The pending interest
    fn interest(&self) -> &Interest;

    /// Whether any downstream face is still waiting for this request
    fn has_in_records(&self) -> bool;

    /// Face of the oldest in-record, if any
    fn first_in_face(&self) -> Option<FaceId>;

    /// Whether the request was forwarded on `face`
    fn has_out_record(&self, face: FaceId) -> bool;

    /// Insert or refresh the in-record for `face`
    fn insert_or_update_in_record(&mut self, face: FaceId, interest: &Interest);
}

/// Forwarding primitives of the host forwarder
pub trait ForwardingSubstrate {
    /// PIT entry type handed to the strategy
    type Entry: PendingEntry;

    /// Longest-prefix-match next hops for the entry, in priority order
    fn next_hops(&self, entry: &Self::Entry) -> Vec<NextHop>;

    /// Legacy eligibility check (not the downstream face, no unexpired out-record, ...)
    fn can_forward_to(&self, entry: &Self::Entry, face: FaceId) -> bool;

    /// Forward `interest` on `face`
    fn send_interest(&mut self, entry: &mut Self::Entry, face: FaceId, interest: &Interest);

    /// Send a nack to `face`; the forwarder drops that face's in-record
    fn send_nack(&mut self, entry: &mut Self::Entry, face: FaceId, reason: NackReason);
}
