//! Sweep coordination: probe fan-out plus neighbor-table read.
//!
//! A sweep probes all 254 host addresses of the active /24 across a
//! bounded worker set. The probes exist solely to populate the OS neighbor
//! cache; their results are discarded. After a short settle delay the
//! neighbor table is read and returned as the current device set. A sweep
//! never fails: every failure class degrades to "nothing observed".

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use uuid::Uuid;

use lanwatch_core::DeviceSet;

use crate::neighbor;
use crate::probe::Prober;

/// Fans probes out across a bounded worker pool and collects the
/// resulting neighbor-cache view.
pub struct SweepCoordinator {
    prober: Arc<Prober>,
    workers: usize,
    settle_delay: Duration,
}

impl SweepCoordinator {
    pub fn new(prober: Prober, workers: usize, settle_delay_ms: u64) -> Self {
        Self {
            prober: Arc::new(prober),
            workers: workers.max(1),
            settle_delay: Duration::from_millis(settle_delay_ms),
        }
    }

    /// The 254 host addresses of the /24 under `subnet_base`.
    pub fn host_addresses(subnet_base: &str) -> Vec<String> {
        (1..=254).map(|i| format!("{subnet_base}.{i}")).collect()
    }

    /// Run one full sweep of the subnet and return the devices observed.
    pub async fn sweep(&self, subnet_base: &str) -> DeviceSet {
        let scan_id = Uuid::new_v4();
        let start = Instant::now();

        tracing::debug!(
            scan_id = %scan_id,
            subnet = %subnet_base,
            workers = self.workers,
            "Starting sweep"
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(254);

        for ip in Self::host_addresses(subnet_base) {
            let prober = self.prober.clone();
            let semaphore = semaphore.clone();
            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                // Result discarded: the probe only seeds the neighbor cache.
                let _ = prober.probe(&ip).await;
            }));
        }

        // All outstanding probes finish before the sweep proceeds.
        for handle in handles {
            if handle.await.is_err() {
                tracing::debug!(scan_id = %scan_id, "Probe task panicked");
            }
        }

        tokio::time::sleep(self.settle_delay).await;

        let devices = match neighbor::read_neighbor_table().await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::warn!(
                    scan_id = %scan_id,
                    subnet = %subnet_base,
                    error = %e,
                    "Neighbor table read failed; treating sweep as empty"
                );
                DeviceSet::new()
            }
        };

        tracing::info!(
            scan_id = %scan_id,
            subnet = %subnet_base,
            hosts = devices.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Sweep complete"
        );

        devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_full_host_range() {
        let addrs = SweepCoordinator::host_addresses("192.168.178");
        assert_eq!(addrs.len(), 254);
        assert_eq!(addrs.first().map(String::as_str), Some("192.168.178.1"));
        assert_eq!(addrs.last().map(String::as_str), Some("192.168.178.254"));
    }

    #[test]
    fn worker_count_is_clamped_to_one() {
        let coordinator = SweepCoordinator::new(Prober::new(1), 0, 0);
        assert_eq!(coordinator.workers, 1);
    }
}
