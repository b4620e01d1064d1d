//! lanwatch-core: Shared types and reconciliation logic for the lanwatch monitor.
//!
//! This crate provides the foundational pieces used across the lanwatch
//! components:
//! - Domain types (Device, DeviceSet, Snapshot) describing observed hosts
//! - Event types for join/leave notifications
//! - The pure differencing function that turns two device sets into events

pub mod diff;
pub mod events;
pub mod types;

pub use diff::{diff, DiffOutcome};
pub use events::{EventKind, HostEvent};
pub use types::{Device, DeviceSet, Snapshot};
