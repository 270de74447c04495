use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::debug;

use super::checker::{ProbeError, Prober};
use super::types::{EndpointStore, Transition};
use crate::logging::LogMultiplexer;

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Probes every endpoint once per cycle and records reachability changes
pub struct TransitionDetector {
    prober: Arc<dyn Prober>,
    log: LogMultiplexer,
    timeout: Duration,
    max_concurrency: usize,
    clock: Clock,
}

impl TransitionDetector {
    pub fn new(prober: Arc<dyn Prober>, log: LogMultiplexer, timeout: Duration) -> Self {
        Self { prober, log, timeout, max_concurrency: 1, clock: Box::new(Utc::now) }
    }

    /// Allow up to `limit` probes in flight, 1 keeps probing sequential
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Run one probe cycle over `store`.
    ///
    /// Every probe of the cycle finishes before the store is touched, so the
    /// store never holds a partially updated cycle. Transitions are written to
    /// the log as `<address> is UP|DOWN` and returned in store order.
    ///
    /// A probe that cannot be started aborts the cycle with the store unchanged.
    pub async fn run_cycle(&self, store: &mut EndpointStore) -> Result<Vec<Transition>, ProbeError> {
        let probes: Vec<_> =
            store.addresses().map(|address| self.prober.probe(address, self.timeout)).collect();
        let results: Vec<Result<bool, ProbeError>> =
            stream::iter(probes).buffered(self.max_concurrency).collect().await;
        let results = results.into_iter().collect::<Result<Vec<bool>, ProbeError>>()?;

        let now = (self.clock)();
        let transitions: Vec<Transition> = results
            .into_iter()
            .enumerate()
            .filter_map(|(index, reachable)| store.record_probe(index, reachable, now))
            .collect();

        for transition in &transitions {
            self.log.write(transition.to_string()).await;
        }

        debug!(endpoints = store.len(), transitions = transitions.len(), "Probe cycle completed");
        Ok(transitions)
    }
}
