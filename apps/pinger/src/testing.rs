//! Deterministic fakes shared by unit tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::logging::{LogRecord, LogSink, SinkError};
use crate::monitoring::checker::{ProbeError, Prober};
use crate::publish::{MessageSink, PublishError};

/// Log sink keeping every line in memory
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap())
    }
}

#[async_trait::async_trait]
impl LogSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.lines.lock().unwrap().push(record.line.clone());
        Ok(())
    }
}

/// Log sink that rejects every record
pub struct FailingSink;

#[async_trait::async_trait]
impl LogSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn write(&self, _record: &LogRecord) -> Result<(), SinkError> {
        Err(SinkError::Publish(PublishError::Transport(zmq::Error::EHOSTUNREACH)))
    }
}

/// Message transport recording `(topic, payload)` pairs
#[derive(Default)]
pub struct RecordingMessageSink {
    published: Mutex<Vec<(String, Vec<u8>)>>,
    fail: bool,
}

impl RecordingMessageSink {
    pub fn failing() -> Self {
        Self { published: Mutex::default(), fail: true }
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }

    pub fn on_topic(&self, topic: &str) -> Vec<Vec<u8>> {
        self.published().into_iter().filter(|(t, _)| t == topic).map(|(_, p)| p).collect()
    }
}

#[async_trait::async_trait]
impl MessageSink for RecordingMessageSink {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Transport(zmq::Error::EHOSTUNREACH));
        }
        self.published.lock().unwrap().push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Prober answering from per-address scripts.
///
/// Each probe pops the next scripted answer; an exhausted script keeps
/// returning its last answer, an unknown address is unreachable.
#[derive(Default)]
pub struct ScriptedProber {
    scripts: Mutex<HashMap<String, VecDeque<bool>>>,
    last: Mutex<HashMap<String, bool>>,
    calls: Mutex<Vec<String>>,
    escalate: HashSet<String>,
}

impl ScriptedProber {
    pub fn new<'a>(scripts: impl IntoIterator<Item = (&'a str, Vec<bool>)>) -> Self {
        let scripts = scripts
            .into_iter()
            .map(|(address, answers)| (address.to_string(), VecDeque::from(answers)))
            .collect();
        Self { scripts: Mutex::new(scripts), ..Default::default() }
    }

    /// Make probes of `address` fail to spawn
    pub fn escalating(mut self, address: &str) -> Self {
        self.escalate.insert(address.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, address: &str, _timeout: Duration) -> Result<bool, ProbeError> {
        self.calls.lock().unwrap().push(address.to_string());
        if self.escalate.contains(address) {
            return Err(ProbeError::Spawn {
                program: "ping".into(),
                source: std::io::Error::other("resource temporarily unavailable"),
            });
        }

        let next = self.scripts.lock().unwrap().get_mut(address).and_then(VecDeque::pop_front);
        let mut last = self.last.lock().unwrap();
        let answer = next.or_else(|| last.get(address).copied()).unwrap_or(false);
        last.insert(address.to_string(), answer);
        Ok(answer)
    }
}
