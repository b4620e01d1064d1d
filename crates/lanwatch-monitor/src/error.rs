//! Error types for the lanwatch-monitor crate.
//!
//! Only startup can fail hard; everything inside a running cycle degrades
//! at its own layer (empty sweep, counted save failure, silent sink miss)
//! and is classified where it is caught.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("could not determine subnet; pass --subnet (e.g. --subnet 192.168.178) or set monitor.subnet")]
    SubnetUnresolved,

    #[error("invalid subnet expression: {0}")]
    InvalidSubnet(String),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
