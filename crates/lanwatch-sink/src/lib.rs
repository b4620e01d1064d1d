//! lanwatch-sink: Best-effort PostgreSQL message sink.
//!
//! The monitor forwards free-text records (startup, shutdown, join/leave
//! events, heartbeats, failure warnings) to a relational backend for remote
//! visibility. The sink is strictly best-effort: a missing configuration or
//! an unreachable database degrades to a silent no-op, and an individual
//! insert failure never surfaces to the scan loop.

mod client;
mod config;

pub use client::{EventSink, SinkError};
pub use config::SinkConfig;
