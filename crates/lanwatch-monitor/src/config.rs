//! Configuration for the lanwatch monitor daemon.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level monitor configuration.
///
/// Loaded from `lanwatch.toml` `[monitor]` section or `LANWATCH__`
/// environment variables; CLI flags override individual fields.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between scan cycles.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Explicit /24 base (e.g. "192.168.178" or "192.168.178.0/24").
    /// If unset, the subnet is discovered from the local interface config.
    #[serde(default)]
    pub subnet: Option<String>,

    /// Run a single cycle and exit.
    #[serde(default)]
    pub once: bool,

    /// Path of the persisted snapshot file.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Path of the append-only event log.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Number of concurrent probe workers in a sweep.
    #[serde(default = "default_ping_workers")]
    pub ping_workers: usize,

    /// Per-probe timeout in seconds.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_secs: u64,

    /// Delay after the probe fan-out before reading the neighbor table,
    /// in milliseconds.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Event log size threshold that triggers rotation, in kilobytes.
    #[serde(default = "default_max_log_size")]
    pub max_log_size_kb: u64,

    /// Consecutive snapshot-save failures before a warning is emitted.
    #[serde(default = "default_max_save_failures")]
    pub max_consecutive_save_failures: u32,
}

fn default_scan_interval() -> u64 {
    10
}

fn default_state_file() -> PathBuf {
    PathBuf::from("lanwatch_state.json")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("lanwatch_events.log")
}

fn default_ping_workers() -> usize {
    50
}

fn default_ping_timeout() -> u64 {
    2
}

fn default_settle_delay() -> u64 {
    500
}

fn default_max_log_size() -> u64 {
    500
}

fn default_max_save_failures() -> u32 {
    10
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            subnet: None,
            once: false,
            state_file: default_state_file(),
            log_file: default_log_file(),
            ping_workers: default_ping_workers(),
            ping_timeout_secs: default_ping_timeout(),
            settle_delay_ms: default_settle_delay(),
            max_log_size_kb: default_max_log_size(),
            max_consecutive_save_failures: default_max_save_failures(),
        }
    }
}
