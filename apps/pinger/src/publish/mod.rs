//! Outbound message streams: the status snapshot feed and the transport it
//! shares with the remote log sink.

pub mod transport;
pub mod wire;

pub use transport::ZmqPublisher;

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::monitoring::types::EndpointStore;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("zeromq transport error: {0}")]
    Transport(#[from] zmq::Error),
    #[error("failed to serialize status snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Topic based message transport
#[async_trait::async_trait]
pub trait MessageSink: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Serializes the endpoint store and publishes it on the status topic
pub struct StatusPublisher {
    sink: Arc<dyn MessageSink>,
    topic: String,
}

impl StatusPublisher {
    pub fn new(sink: Arc<dyn MessageSink>, topic: impl Into<String>) -> Self {
        Self { sink, topic: topic.into() }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish one snapshot, returning the payload that was sent
    pub async fn publish(&self, store: &EndpointStore) -> Result<Vec<u8>, PublishError> {
        let payload = wire::encode(store.snapshot())?;
        self.sink.publish(&self.topic, &payload).await?;
        debug!(topic = %self.topic, endpoints = store.len(), bytes = payload.len(), "Published status snapshot");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMessageSink;

    #[tokio::test]
    async fn test_publishes_snapshot_on_status_topic() {
        let messages = Arc::new(RecordingMessageSink::default());
        let publisher = StatusPublisher::new(messages.clone(), "ping");
        let store = EndpointStore::initialize(["10.0.0.1", "10.0.0.2"]);

        let payload = publisher.publish(&store).await.unwrap();

        let published = messages.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "ping");
        assert_eq!(published[0].1, payload);

        let decoded = wire::decode(&published[0].1).unwrap();
        let addresses: Vec<&str> = decoded.iter().map(|r| r.address()).collect();
        assert_eq!(addresses, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_transport_failure_is_returned() {
        let publisher = StatusPublisher::new(Arc::new(RecordingMessageSink::failing()), "ping");
        let store = EndpointStore::initialize(["10.0.0.1"]);

        assert!(matches!(publisher.publish(&store).await, Err(PublishError::Transport(_))));
    }
}
