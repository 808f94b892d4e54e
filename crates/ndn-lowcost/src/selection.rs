//! Face selection helpers over a next-hop list

use ndn_common::{FaceId, ForwardingSubstrate, NextHop};
use tracing::warn;

/// First next hop passing the legacy eligibility check, else the first next hop
///
/// `None` only for an empty list.
pub fn best_route<S: ForwardingSubstrate>(
    substrate: &S,
    entry: &S::Entry,
    next_hops: &[NextHop],
) -> Option<FaceId> {
    next_hops
        .iter()
        .find(|hop| substrate.can_forward_to(entry, hop.face))
        .or_else(|| next_hops.first())
        .map(|hop| hop.face)
}

/// Next different face after `face`, walking the list cyclically
///
/// Returns `face` itself for a single-entry list or when `face` is not listed.
pub fn alternative_face(face: FaceId, next_hops: &[NextHop]) -> FaceId {
    if next_hops.len() <= 1 {
        return face;
    }
    let Some(position) = next_hops.iter().position(|hop| hop.face == face) else {
        return face;
    };

    next_hops
        .iter()
        .cycle()
        .skip(position + 1)
        .take(next_hops.len())
        .map(|hop| hop.face)
        .find(|candidate| *candidate != face)
        .unwrap_or(face)
}

/// Next hop with the given face id, falling back to the first next hop
pub fn face_via_id(face: FaceId, next_hops: &[NextHop]) -> Option<&NextHop> {
    next_hops
        .iter()
        .find(|hop| hop.face == face)
        .or_else(|| {
            let first = next_hops.first()?;
            warn!(
                "Face {} was not found in next hops, using face {} instead",
                face, first.face
            );
            Some(first)
        })
}

/// Allows tainting once every N calls
///
/// N comes from the `MAX_TAINTED_PROBES_PERCENTAGE` parameter and is used as
/// a raw count.
#[derive(Debug, Clone)]
pub struct TaintingGate {
    counter: u32,
}

impl TaintingGate {
    /// Create gate
    pub const fn new() -> Self {
        Self { counter: 1 }
    }

    /// Count one call; true when the counter has reached `max`
    pub fn allow(&mut self, max: f64) -> bool {
        if f64::from(self.counter) >= max {
            self.counter = 1;
            true
        } else {
            self.counter = self.counter.saturating_add(1);
            false
        }
    }
}

impl Default for TaintingGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hops, MockEntry, MockForwarder};
    use proptest::prelude::*;

    #[test]
    fn test_alternative_single_face_is_noop() {
        let list = hops(&[7]);
        assert_eq!(alternative_face(FaceId(7), &list), FaceId(7));
    }

    #[test]
    fn test_alternative_two_faces_fixed_point() {
        let list = hops(&[1, 2]);
        assert_eq!(alternative_face(FaceId(1), &list), FaceId(2));
        assert_eq!(alternative_face(FaceId(2), &list), FaceId(1));
    }

    #[test]
    fn test_alternative_wraps_and_unknown() {
        let list = hops(&[1, 2, 3]);
        assert_eq!(alternative_face(FaceId(2), &list), FaceId(3));
        assert_eq!(alternative_face(FaceId(3), &list), FaceId(1));
        assert_eq!(alternative_face(FaceId(9), &list), FaceId(9));
        assert_eq!(alternative_face(FaceId(1), &[]), FaceId(1));
    }

    #[test]
    fn test_best_route() {
        let entry = MockEntry::probe("/a/probe/1", 100);
        let mut fwd = MockForwarder::new(&[1, 2, 3]);
        let list = fwd.hops.clone();
        assert_eq!(best_route(&fwd, &entry, &list), Some(FaceId(1)));

        fwd.ineligible.insert(FaceId(1));
        assert_eq!(best_route(&fwd, &entry, &list), Some(FaceId(2)));

        fwd.ineligible.extend([FaceId(2), FaceId(3)]);
        assert_eq!(best_route(&fwd, &entry, &list), Some(FaceId(1)));
        assert_eq!(best_route(&fwd, &entry, &[]), None);
    }

    #[test]
    fn test_face_via_id() {
        let list = hops(&[4, 5]);
        assert_eq!(face_via_id(FaceId(5), &list).map(|h| h.face), Some(FaceId(5)));
        assert_eq!(face_via_id(FaceId(9), &list).map(|h| h.face), Some(FaceId(4)));
        assert!(face_via_id(FaceId(9), &[]).is_none());
    }

    #[test]
    fn test_tainting_gate_every_nth_call() {
        let mut gate = TaintingGate::new();
        let decisions: Vec<bool> = (0..6).map(|_| gate.allow(3.0)).collect();
        assert_eq!(decisions, vec![false, false, true, false, false, true]);

        let mut always = TaintingGate::new();
        assert!((0..4).all(|_| always.allow(1.0)));
    }

    proptest! {
        #[test]
        fn prop_alternative_differs_when_listed(
            faces in proptest::collection::hash_set(0u64..64, 2..8),
            pick in any::<prop::sample::Index>(),
        ) {
            let faces: Vec<u64> = faces.into_iter().collect();
            let list = hops(&faces);
            let face = FaceId(faces[pick.index(faces.len())]);

            let alt = alternative_face(face, &list);
            prop_assert_ne!(alt, face);
            prop_assert!(list.iter().any(|hop| hop.face == alt));
        }
    }
}
