//! NDN Common - Shared vocabulary for named-data forwarding strategies
//!
//! This crate provides the types a forwarding strategy exchanges with its
//! host forwarder:
//! - Hierarchical names and faces
//! - Interest / Data / Nack packets
//! - Per-prefix configuration
//! - Forwarder contracts (next-hop lookup, PIT entry, send primitives)
//! - Telemetry counters
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod face;
pub mod forwarder;
pub mod metrics;
pub mod name;
pub mod packet;

pub use config::*;
pub use error::*;
pub use face::*;
pub use forwarder::*;
pub use name::Name;
pub use packet::*;
