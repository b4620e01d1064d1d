//! CLI entry point for the lanwatch monitor daemon.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use lanwatch_monitor::config::MonitorConfig;
use lanwatch_monitor::error::MonitorError;
use lanwatch_monitor::monitor::{show_status, Monitor};
use lanwatch_monitor::netinfo;
use lanwatch_monitor::state::StateStore;
use lanwatch_sink::{EventSink, SinkConfig};

#[derive(Parser)]
#[command(name = "lanwatch")]
#[command(about = "LAN presence monitor: sweeps a /24 and records join/leave events")]
struct Cli {
    /// Subnet to monitor (e.g. 192.168.178, 192.168.178.0, 192.168.178.0/24).
    #[arg(short, long)]
    subnet: Option<String>,

    /// Run a single scan cycle and exit.
    #[arg(short, long)]
    once: bool,

    /// Print the persisted snapshot and exit; no network activity.
    #[arg(long)]
    status: bool,

    /// Scan interval in seconds.
    #[arg(short, long)]
    interval: Option<u64>,

    /// Config file prefix (default: lanwatch).
    #[arg(short, long, default_value = "lanwatch")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut monitor_config = load_monitor_config(&cli.config)?;

    // CLI flags override file/env configuration.
    if let Some(interval) = cli.interval {
        monitor_config.scan_interval_secs = interval;
    }
    if cli.subnet.is_some() {
        monitor_config.subnet = cli.subnet.clone();
    }
    if cli.once {
        monitor_config.once = true;
    }

    if cli.status {
        show_status(&StateStore::new(&monitor_config.state_file));
        return Ok(());
    }

    // The only fatal runtime condition: no subnet determinable.
    let subnet_base = resolve_subnet(&monitor_config).await?;

    let sink = match SinkConfig::from_env() {
        Some(sink_config) => EventSink::connect(&sink_config).await,
        None => {
            tracing::info!("Sink not configured (DB_HOST/DB_USER/DB_PASSWORD unset), skipping");
            EventSink::disabled()
        }
    };

    let monitor = Monitor::new(monitor_config, subnet_base, sink);
    monitor.run().await?;
    Ok(())
}

/// Explicit subnet → normalized base; otherwise discovered from the local
/// interface configuration.
async fn resolve_subnet(config: &MonitorConfig) -> anyhow::Result<String> {
    if let Some(raw) = &config.subnet {
        let base =
            netinfo::normalize_subnet(raw).ok_or_else(|| MonitorError::InvalidSubnet(raw.clone()))?;
        return Ok(base);
    }
    let base = netinfo::discover_subnet().await?;
    Ok(base)
}

fn load_monitor_config(file_prefix: &str) -> anyhow::Result<MonitorConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("LANWATCH")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<MonitorConfig>("monitor") {
        Ok(c) => Ok(c),
        Err(_) => Ok(MonitorConfig::default()),
    }
}
