use tokio::sync::Mutex;
use tracing::info;

use super::{MessageSink, PublishError};
use crate::config;

/// ZeroMQ PUB socket carrying `[topic, payload]` multipart messages
pub struct ZmqPublisher {
    // Keeps the context alive for as long as the socket
    #[allow(dead_code)]
    context: zmq::Context,
    socket: Mutex<zmq::Socket>,
}

impl ZmqPublisher {
    /// Create the socket and bind (or connect) it to the configured endpoint
    pub fn open(config: &config::ZeroMQ) -> Result<Self, PublishError> {
        let context = zmq::Context::new();
        let socket = context.socket(zmq::PUB)?;
        socket.set_sndhwm(config.send_high_water_mark)?;
        socket.set_linger(0)?;

        if config.connect {
            socket.connect(&config.endpoint)?;
            info!(endpoint = %config.endpoint, "Connected publisher");
        } else {
            socket.bind(&config.endpoint)?;
            info!(endpoint = %config.endpoint, "Bound publisher");
        }

        Ok(Self { context, socket: Mutex::new(socket) })
    }
}

#[async_trait::async_trait]
impl MessageSink for ZmqPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let socket = self.socket.lock().await;
        socket.send_multipart([topic.as_bytes(), payload], zmq::DONTWAIT)?;
        Ok(())
    }
}
