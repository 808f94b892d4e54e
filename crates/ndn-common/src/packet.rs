//! Interest, Data and Nack packets as seen by a strategy
//!
//! Only the logical attributes a strategy reads are modelled; wire encoding
//! belongs to the forwarder.

use crate::Name;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request for named content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    /// Requested name
    pub name: Name,
    /// Set by the router that redirected this probe
    pub tainted: bool,
}

impl Interest {
    /// Create untainted interest
    pub fn new(name: Name) -> Self {
        Self {
            name,
            tainted: false,
        }
    }

    /// Builder: set tainted flag
    pub fn with_tainted(mut self, tainted: bool) -> Self {
        self.tainted = tainted;
        self
    }
}

/// Response satisfying an interest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    /// Content name
    pub name: Name,
    /// Payload size in bytes
    pub content_size: usize,
    /// Tainted flag copied from the interest by the producer
    pub tainted: bool,
}

impl Data {
    /// Create untainted data
    pub fn new(name: Name, content_size: usize) -> Self {
        Self {
            name,
            content_size,
            tainted: false,
        }
    }

    /// Builder: set tainted flag
    pub fn with_tainted(mut self, tainted: bool) -> Self {
        self.tainted = tainted;
        self
    }
}

/// Negative acknowledgment reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NackReason {
    /// Unspecified
    None,
    /// Upstream congestion
    Congestion,
    /// Duplicate nonce
    Duplicate,
    /// No route to the name
    NoRoute,
    /// Probe was redirected by a downstream router
    Tainted,
}

impl fmt::Display for NackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::Congestion => "Congestion",
            Self::Duplicate => "Duplicate",
            Self::NoRoute => "NoRoute",
            Self::Tainted => "Tainted",
        };
        f.write_str(s)
    }
}

/// Negative acknowledgment for an interest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nack {
    /// Name of the nacked interest
    pub interest_name: Name,
    /// Reason code
    pub reason: NackReason,
}

impl Nack {
    /// Create nack
    pub fn new(interest_name: Name, reason: NackReason) -> Self {
        Self {
            interest_name,
            reason,
        }
    }
}
