//! Faces and next hops

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical link identifier known to the forwarder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FaceId(pub u64);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FaceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// FIB next hop, in the priority order returned by the lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextHop {
    /// Outgoing face
    pub face: FaceId,
    /// Routing cost
    pub cost: u64,
}

impl NextHop {
    /// Create next hop
    pub const fn new(face: FaceId, cost: u64) -> Self {
        Self { face, cost }
    }
}
