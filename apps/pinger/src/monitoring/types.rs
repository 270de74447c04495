use chrono::{DateTime, Utc};
use std::fmt;

/// Reachability of an endpoint as rendered in transition lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Up,
    Down,
}

impl From<bool> for Reachability {
    fn from(reachable: bool) -> Self {
        if reachable { Reachability::Up } else { Reachability::Down }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reachability::Up => write!(f, "UP"),
            Reachability::Down => write!(f, "DOWN"),
        }
    }
}

/// One monitored address and its last known reachability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    address: String,
    reachable: bool,
    last_change: DateTime<Utc>,
}

impl Endpoint {
    fn new(address: String, now: DateTime<Utc>) -> Self {
        Self { address, reachable: false, last_change: now }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn reachable(&self) -> bool {
        self.reachable
    }

    /// Time of the most recent change of `reachable`, or creation time
    pub fn last_change(&self) -> DateTime<Utc> {
        self.last_change
    }
}

/// A change in reachability detected during a probe cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub address: String,
    pub reachable: bool,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is {}", self.address, Reachability::from(self.reachable))
    }
}

/// Ordered state of every monitored endpoint.
///
/// The order is the settings order and never changes: no endpoint is added,
/// removed or moved after [`EndpointStore::initialize`]. Only the transition
/// detector writes to the store, through [`EndpointStore::record_probe`].
#[derive(Debug, Clone)]
pub struct EndpointStore {
    endpoints: Vec<Endpoint>,
}

impl EndpointStore {
    /// Create one unreachable endpoint per address, stamped with the current time
    pub fn initialize<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::initialize_at(addresses, Utc::now())
    }

    pub fn initialize_at<I, S>(addresses: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints = addresses.into_iter().map(|address| Endpoint::new(address.into(), now)).collect();
        Self { endpoints }
    }

    pub fn snapshot(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(Endpoint::address)
    }

    /// Store a probe result for the endpoint at `index`.
    ///
    /// `last_change` moves only when the result differs from the stored state.
    pub(crate) fn record_probe(
        &mut self,
        index: usize,
        reachable: bool,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        let endpoint = self.endpoints.get_mut(index)?;
        let previous = endpoint.reachable;
        endpoint.reachable = reachable;
        if reachable == previous {
            return None;
        }

        endpoint.last_change = now;
        Some(Transition { address: endpoint.address.clone(), reachable, timestamp: now })
    }
}
