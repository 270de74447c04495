use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::trace;

use crate::config::{self, ProbeMethod};

/// Extra time granted to the ping process beyond its own deadline
const PROCESS_GRACE: Duration = Duration::from_millis(500);

/// Failures that prevent a probe from running at all.
///
/// Network-level outcomes (timeout, unreachable, bad target) are never
/// errors, they resolve to `false`.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn { program: String, source: std::io::Error },
}

/// Reachability prober trait for the different probe methods
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probe `address`, resolving within roughly `timeout`
    async fn probe(&self, address: &str, timeout: Duration) -> Result<bool, ProbeError>;
}

/// Build the prober selected by the configuration
pub fn from_config(probe: &config::Probe) -> Arc<dyn Prober> {
    match probe.method {
        ProbeMethod::Icmp => Arc::new(IcmpProber::new()),
        ProbeMethod::Tcp => Arc::new(TcpProber::new(probe.tcp_port)),
    }
}

/// ICMP echo via the system `ping` binary (raw sockets need elevated privileges)
pub struct IcmpProber {
    program: String,
}

impl IcmpProber {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    fn deadline_secs(timeout: Duration) -> u64 {
        timeout.as_secs_f64().ceil().max(1.0) as u64
    }

    /// `--` ends option parsing, an address starting with `-` stays an operand
    fn args(address: &str, limit: Duration) -> [String; 6] {
        ["-c".into(), "1".into(), "-W".into(), Self::deadline_secs(limit).to_string(), "--".into(), address.into()]
    }
}

impl Default for IcmpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, address: &str, limit: Duration) -> Result<bool, ProbeError> {
        let mut child = Command::new(&self.program)
            .args(Self::args(address, limit))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Spawn { program: self.program.clone(), source })?;

        // The child is killed on drop when the hard deadline fires
        match timeout(limit + PROCESS_GRACE, child.wait()).await {
            Ok(Ok(status)) => Ok(status.success()),
            Ok(Err(e)) => {
                trace!(address, error = %e, "Waiting for ping failed");
                Ok(false)
            }
            Err(_) => {
                trace!(address, "Ping exceeded its deadline");
                Ok(false)
            }
        }
    }
}

/// TCP connect checker
pub struct TcpProber {
    default_port: u16,
}

impl TcpProber {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }

    fn target(&self, address: &str) -> String {
        // Bracketed IPv6 with a port, or a host:port pair
        let has_port = if address.starts_with('[') {
            address.contains("]:")
        } else {
            address.matches(':').count() == 1
        };

        if has_port {
            address.to_string()
        } else if address.contains(':') && !address.starts_with('[') {
            format!("[{}]:{}", address, self.default_port)
        } else {
            format!("{}:{}", address, self.default_port)
        }
    }
}

#[async_trait::async_trait]
impl Prober for TcpProber {
    async fn probe(&self, address: &str, limit: Duration) -> Result<bool, ProbeError> {
        let target = self.target(address);
        let connect = tokio::net::TcpStream::connect(target.as_str());

        match timeout(limit, connect).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) => {
                trace!(addr = %target, error = %e, "TCP connection failed");
                Ok(false)
            }
            Err(_) => {
                trace!(addr = %target, "TCP connection timeout");
                Ok(false)
            }
        }
    }
}
