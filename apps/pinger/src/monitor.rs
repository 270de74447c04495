//! Cycle owner for the address monitor.
//!
//! The [`Monitor`] owns the endpoint store and is the only writer to it. Probe
//! cycles and status publishes run on two tickers inside one task, so a
//! snapshot is always taken between cycles and cycles never overlap.

use anyhow::{Context, Result, bail};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config;
use crate::logging::LogMultiplexer;
use crate::monitoring::{EndpointStore, Ticker, TransitionDetector};
use crate::publish::StatusPublisher;

pub struct Monitor {
    store: EndpointStore,
    detector: TransitionDetector,
    publisher: StatusPublisher,
    log: LogMultiplexer,
    probe_interval: Duration,
    publish_interval: Duration,
    max_publish_failures: u32,
    publish_failures: u32,
    log_status: bool,
}

impl Monitor {
    pub fn new(
        store: EndpointStore,
        detector: TransitionDetector,
        publisher: StatusPublisher,
        log: LogMultiplexer,
        schedule: &config::Schedule,
    ) -> Self {
        Self {
            store,
            detector,
            publisher,
            log,
            probe_interval: schedule.probe_interval(),
            publish_interval: schedule.publish_interval(),
            max_publish_failures: schedule.max_publish_failures,
            publish_failures: 0,
            log_status: false,
        }
    }

    /// Write every published status payload to the log as well
    pub fn with_status_logging(mut self, enabled: bool) -> Self {
        self.log_status = enabled;
        self
    }

    /// Probe every endpoint once and log the transitions
    pub async fn probe_cycle(&mut self) -> Result<()> {
        self.detector.run_cycle(&mut self.store).await.context("probe cycle failed")?;
        Ok(())
    }

    /// Publish the current snapshot.
    ///
    /// A failed publish is logged and tolerated until `max_publish_failures`
    /// consecutive failures, a successful one resets the count.
    pub async fn publish_status(&mut self) -> Result<()> {
        match self.publisher.publish(&self.store).await {
            Ok(payload) => {
                self.publish_failures = 0;
                if self.log_status {
                    self.log.write(String::from_utf8_lossy(&payload)).await;
                }
                Ok(())
            }
            Err(e) => {
                self.publish_failures += 1;
                error!(
                    topic = self.publisher.topic(),
                    failures = self.publish_failures,
                    error = %e,
                    "Failed to publish status"
                );
                self.log.write(format!("status publish failed: {e}")).await;

                if self.max_publish_failures > 0 && self.publish_failures >= self.max_publish_failures {
                    bail!("status publish failed {} times in a row: {e}", self.publish_failures);
                }
                Ok(())
            }
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Cancellation is observed between cycles only. Returns an error when a
    /// probe cannot be started or the status feed gave up.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        let mut probe_ticker = Ticker::new(self.probe_interval);
        let mut publish_ticker = Ticker::new(self.publish_interval);

        info!(
            endpoints = self.store.len(),
            probe_interval = ?probe_ticker.period(),
            publish_interval = ?publish_ticker.period(),
            "Monitor started"
        );
        self.log.write(format!("monitoring {} addresses", self.store.len())).await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = probe_ticker.tick() => self.probe_cycle().await?,
                _ = publish_ticker.tick() => self.publish_status().await?,
            }
        }

        info!("Monitor stopped");
        self.log.write("shutting down").await;
        Ok(())
    }
}
