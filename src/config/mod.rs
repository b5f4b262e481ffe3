//! Network configuration
//!
//! One immutable [`NetworkConfig`] exists per node process and is
//! threaded explicitly into the codec, handlers, builders and verifier.

pub mod network;

pub use network::{Exceptions, FeeSchedule, Milestone, NetworkConfig};
