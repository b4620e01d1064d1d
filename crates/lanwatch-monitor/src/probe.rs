//! Single-host reachability probe.
//!
//! Runs the system `ping` as a child process via `tokio::process::Command`.
//! The probe exists only to make the target answer and thereby land in the
//! OS neighbor cache; its boolean result is advisory and the sweep discards
//! it. Absence from one sweep is evidence, not proof, of absence, so there
//! are no retries at this layer.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Sends one bounded reachability probe per call.
#[derive(Debug, Clone)]
pub struct Prober {
    timeout: Duration,
}

impl Prober {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    /// Probe one address. Returns false on timeout, unreachable target, or
    /// any OS-level failure; never errors.
    pub async fn probe(&self, ip: &str) -> bool {
        let mut cmd = ping_command(ip);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        // Reap the child when the timeout drops the status future.
        cmd.kill_on_drop(true);

        let run = async {
            match cmd.status().await {
                Ok(status) => status.success(),
                Err(_) => false,
            }
        };

        tokio::time::timeout(self.timeout, run)
            .await
            .unwrap_or(false)
    }
}

#[cfg(target_os = "windows")]
fn ping_command(ip: &str) -> Command {
    let mut cmd = Command::new("ping");
    cmd.args(["-n", "1", "-w", "500", ip]);
    cmd
}

#[cfg(not(target_os = "windows"))]
fn ping_command(ip: &str) -> Command {
    let mut cmd = Command::new("ping");
    cmd.args(["-c", "1", "-W", "1", ip]);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unroutable_probe_returns_false() {
        // 192.0.2.0/24 is TEST-NET-1, guaranteed not to answer.
        let prober = Prober::new(1);
        assert!(!prober.probe("192.0.2.1").await);
    }

    #[tokio::test]
    async fn malformed_address_returns_false() {
        let prober = Prober::new(1);
        assert!(!prober.probe("999.999.999.999").await);
    }

    #[tokio::test]
    async fn timed_out_probe_returns_promptly() {
        let prober = Prober::new(1);
        let start = std::time::Instant::now();
        assert!(!prober.probe("192.0.2.2").await);
        // The child is killed with the dropped future; the probe must not
        // linger past its own timeout.
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let prober = Prober::new(0);
        assert_eq!(prober.timeout, Duration::from_secs(1));
    }
}
