//! lanwatch-monitor: LAN presence monitor daemon.
//!
//! Periodically sweeps a /24, reconciles the observed host set against a
//! persisted snapshot, and emits join/leave events to a rotating log and an
//! optional database sink. Built to run unattended: every external operation
//! degrades instead of aborting the scan loop.

pub mod config;
pub mod error;
pub mod eventlog;
pub mod monitor;
pub mod neighbor;
pub mod netinfo;
pub mod probe;
pub mod state;
pub mod sweep;
