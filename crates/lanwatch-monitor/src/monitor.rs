//! The scan loop: sweep → reconcile → emit → persist → heartbeat, forever.
//!
//! Every step inside a cycle degrades on failure; the loop itself ends only
//! on an explicit interrupt (or after one cycle in single-shot mode).

use chrono::{Local, Timelike, Utc};
use tokio::time::{sleep, Duration};

use lanwatch_core::{diff, Device, DeviceSet, EventKind, HostEvent};
use lanwatch_sink::EventSink;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::eventlog::{display_timestamp, EventEmitter, EventLog};
use crate::probe::Prober;
use crate::state::StateStore;
use crate::sweep::SweepCoordinator;

/// In-memory cycle accounting. Never persisted.
#[derive(Debug, Default)]
pub struct CycleStats {
    pub scan_count: u64,
    pub consecutive_save_failures: u32,
}

impl CycleStats {
    /// Record one save outcome. Returns true exactly when the consecutive
    /// failure count reaches `threshold`; the counter resets on that
    /// crossing as well as on any success, so each streak yields one
    /// warning and the loop keeps running.
    pub fn record_save(&mut self, ok: bool, threshold: u32) -> bool {
        if ok {
            self.consecutive_save_failures = 0;
            return false;
        }
        self.consecutive_save_failures += 1;
        if self.consecutive_save_failures >= threshold {
            self.consecutive_save_failures = 0;
            return true;
        }
        false
    }
}

/// Owns everything one monitoring run needs.
pub struct Monitor {
    config: MonitorConfig,
    subnet_base: String,
    sweeper: SweepCoordinator,
    store: StateStore,
    emitter: EventEmitter,
    sink: EventSink,
}

impl Monitor {
    pub fn new(config: MonitorConfig, subnet_base: String, sink: EventSink) -> Self {
        let prober = Prober::new(config.ping_timeout_secs);
        let sweeper = SweepCoordinator::new(prober, config.ping_workers, config.settle_delay_ms);
        let store = StateStore::new(&config.state_file);
        let log = EventLog::new(&config.log_file, config.max_log_size_kb);
        let emitter = EventEmitter::new(log, sink.clone());

        Self {
            config,
            subnet_base,
            sweeper,
            store,
            emitter,
            sink,
        }
    }

    /// Run the monitor until interrupted (or one cycle in `once` mode).
    pub async fn run(&self) -> Result<()> {
        // Install the interrupt handler before the first cycle starts, so a
        // Ctrl-C during the opening sweep is buffered and honored at the
        // next select point instead of hitting the default disposition.
        let mut shutdown = interrupt_stream()?;

        tracing::info!(
            subnet = %format!("{}.0/24", self.subnet_base),
            state_file = %self.store.path().display(),
            log_file = %self.config.log_file.display(),
            interval_secs = self.config.scan_interval_secs,
            "Monitor started"
        );
        self.sink
            .insert(&format!("gestartet [{}]", display_timestamp(Utc::now())))
            .await;

        let mut stats = CycleStats::default();
        let mut last_heartbeat_hour = Local::now().hour();
        let interval = Duration::from_secs(self.config.scan_interval_secs.max(1));

        loop {
            let current = self.sweeper.sweep(&self.subnet_base).await;
            let online = self.process_scan(current, &mut stats).await;

            // One liveness record per wall-clock hour boundary.
            let hour = Local::now().hour();
            if hour != last_heartbeat_hour {
                self.sink
                    .insert(&format!(
                        "ich bin noch aktiv [{}]",
                        display_timestamp(Utc::now())
                    ))
                    .await;
                last_heartbeat_hour = hour;
                tracing::debug!(scan_count = stats.scan_count, "Heartbeat emitted");
            }

            if self.config.once {
                tracing::info!(online, "Single scan complete");
                return Ok(());
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Interrupt received, shutting down");
                    self.sink
                        .insert(&format!("beendet [{}]", display_timestamp(Utc::now())))
                        .await;
                    return Ok(());
                }
                _ = sleep(interval) => {}
            }
        }
    }

    /// Everything after the sweep: reconcile against the persisted
    /// snapshot, emit events, persist the current set, account failures.
    /// Returns the number of devices currently online.
    async fn process_scan(&self, current: DeviceSet, stats: &mut CycleStats) -> usize {
        let previous = self.store.load();
        let outcome = diff(&previous.devices, &current);

        for ip in &outcome.joined {
            let mac = mac_of(&current, ip);
            self.emitter
                .emit(&HostEvent::new(EventKind::Joined, ip.clone(), mac))
                .await;
        }
        for ip in &outcome.left {
            let mac = mac_of(&previous.devices, ip);
            self.emitter
                .emit(&HostEvent::new(EventKind::Left, ip.clone(), mac))
                .await;
        }

        let save_ok = match self.store.save(&current) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    path = %self.store.path().display(),
                    error = %e,
                    "Snapshot save failed"
                );
                false
            }
        };

        let threshold = self.config.max_consecutive_save_failures;
        if stats.record_save(save_ok, threshold) {
            tracing::warn!(threshold, "Repeated snapshot save failures");
            self.sink
                .insert(&format!(
                    "Warnung: {threshold} aufeinanderfolgende Fehler beim Speichern [{}]",
                    display_timestamp(Utc::now())
                ))
                .await;
        }

        stats.scan_count += 1;
        current.len()
    }
}

/// Interrupt stream with the handler installed at construction time, not
/// at first poll. Signals arriving while a cycle runs are buffered and
/// picked up at the next select point, after outstanding probes finish.
#[cfg(unix)]
fn interrupt_stream() -> std::io::Result<tokio::signal::unix::Signal> {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
}

#[cfg(windows)]
fn interrupt_stream() -> std::io::Result<tokio::signal::windows::CtrlC> {
    tokio::signal::windows::ctrl_c()
}

fn mac_of(devices: &DeviceSet, ip: &str) -> String {
    devices
        .get(ip)
        .map(|d| d.mac.clone())
        .unwrap_or_else(|| Device::UNKNOWN_MAC.to_string())
}

/// Status command: print the persisted snapshot without any network
/// activity. This is command output, not logging.
pub fn show_status(store: &StateStore) {
    let snapshot = store.load();
    let last_scan = snapshot
        .last_scan
        .map(display_timestamp)
        .unwrap_or_else(|| "-".to_string());

    println!("{}", "=".repeat(60));
    println!("CURRENT LAN STATUS");
    println!("{}", "=".repeat(60));
    println!("Last scan:      {last_scan}");
    println!("Active devices: {}", snapshot.devices.len());
    println!("{}", "-".repeat(60));
    for ip in lanwatch_core::diff::sort_by_ip(snapshot.devices.keys().cloned().collect()) {
        println!("  IP={ip}  MAC={}", snapshot.devices[&ip].mac);
    }
    println!("{}", "=".repeat(60));
}
