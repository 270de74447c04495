use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter, warn};

use uppe_pinger::logging::{LogMultiplexer, RemoteSink, RotatingFileSink};
use uppe_pinger::monitoring::{EndpointStore, TransitionDetector, checker};
use uppe_pinger::publish::{StatusPublisher, ZmqPublisher};
use uppe_pinger::{Config, Monitor, settings};

/// Periodically pings a list of addresses and publishes their reachability
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file, defaults to $XDG_CONFIG_HOME/uppe/pinger.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address list, overrides `settings_path` from the config
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug diagnostics
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logger::init_with_level(LevelFilter::DEBUG);
    } else {
        logger::init();
    }

    let mut config = Config::from_config(cli.config.as_ref()).context("failed to load configuration")?;
    if let Some(settings_path) = cli.settings {
        config.settings_path = settings_path;
    }

    if cli.print_config {
        print!("{config}");
        return Ok(());
    }

    let addresses = settings::read_addresses(&config.settings_path)?;
    let store = EndpointStore::initialize(addresses);
    if store.is_empty() {
        warn!(path = %config.settings_path.display(), "No addresses configured, only empty snapshots will be published");
    }
    info!("Loaded {} addresses from {}", store.len(), config.settings_path.display());

    let transport = Arc::new(ZmqPublisher::open(&config.zeromq).context("failed to open zeromq publisher")?);

    let file = RotatingFileSink::open(&config.log_file.path, config.log_file.max_bytes)
        .await
        .with_context(|| format!("failed to open log file {}", config.log_file.path.display()))?;
    let remote = RemoteSink::new(transport.clone(), &config.zeromq.log_topic, &config.log_file.source_tag);
    let log = LogMultiplexer::new().with_sink(Arc::new(file)).with_sink(Arc::new(remote));
    info!(sinks = log.sink_count(), path = %config.log_file.path.display(), "Operational log ready");

    let detector = TransitionDetector::new(checker::from_config(&config.probe), log.clone(), config.probe.timeout())
        .with_max_concurrency(config.probe.max_concurrency);
    let publisher = StatusPublisher::new(transport, &config.zeromq.status_topic);
    let monitor = Monitor::new(store, detector, publisher, log, &config.schedule)
        .with_status_logging(config.log_file.log_status);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, stopping after the current cycle");
                    shutdown.cancel();
                }
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            }
        }
    });

    monitor.run(shutdown).await
}
