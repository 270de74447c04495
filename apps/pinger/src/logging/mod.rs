//! Operational log fan-out.
//!
//! A [`LogMultiplexer`] hands every record to each configured sink:
//! - [`RotatingFileSink`]: size-bounded local file with one backup slot
//! - [`RemoteSink`]: one message per record on the log topic
//!
//! Sinks are written concurrently and independently. A failing sink is
//! reported as a diagnostic and never blocks the others or the caller.

pub mod file;
pub mod remote;

pub use file::RotatingFileSink;
pub use remote::RemoteSink;

use chrono::{DateTime, Local};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::publish::PublishError;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("log file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote log publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// A single line handed to the sinks, each sink renders it on its own
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub line: String,
    pub timestamp: DateTime<Local>,
}

impl LogRecord {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into(), timestamp: Local::now() }
    }
}

/// Destination for log records
#[async_trait::async_trait]
pub trait LogSink: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    async fn write(&self, record: &LogRecord) -> Result<(), SinkError>;
}

#[derive(Clone, Default)]
pub struct LogMultiplexer {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl LogMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Write `line` to every sink. Returns the number of sinks that accepted it.
    pub async fn write(&self, line: impl Into<String>) -> usize {
        let record = LogRecord::new(line);
        let writes: Vec<_> = self.sinks.iter().map(|sink| sink.write(&record)).collect();
        let results = join_all(writes).await;

        let mut delivered = 0;
        for (sink, result) in self.sinks.iter().zip(results) {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => warn!(sink = sink.name(), error = %e, "Failed to write log record"),
            }
        }
        delivered
    }
}
