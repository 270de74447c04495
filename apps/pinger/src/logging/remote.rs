use std::sync::Arc;

use super::{LogRecord, LogSink, SinkError};
use crate::publish::MessageSink;

/// `Mon Jan  2 15:04:05 +01:00 2006`, local time
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// Publishes every record as one message on the log topic.
///
/// Delivery is best effort: a failed publish is returned to the multiplexer
/// and dropped, nothing is queued or retried.
pub struct RemoteSink {
    sink: Arc<dyn MessageSink>,
    topic: String,
    source_tag: String,
}

impl RemoteSink {
    pub fn new(sink: Arc<dyn MessageSink>, topic: impl Into<String>, source_tag: impl Into<String>) -> Self {
        Self { sink, topic: topic.into(), source_tag: source_tag.into() }
    }

    pub fn render(&self, record: &LogRecord) -> String {
        format!("{} {} {}", record.timestamp.format(TIMESTAMP_FORMAT), self.source_tag, record.line)
    }
}

#[async_trait::async_trait]
impl LogSink for RemoteSink {
    fn name(&self) -> &str {
        "remote"
    }

    async fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let message = self.render(record);
        self.sink.publish(&self.topic, message.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMessageSink;
    use chrono::{Local, TimeZone};

    #[test]
    fn test_render_prefixes_timestamp_and_tag() {
        let sink = RemoteSink::new(Arc::new(RecordingMessageSink::default()), "logging", "PINGER");
        let record = LogRecord {
            line: "10.0.0.1 is UP".into(),
            timestamp: Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap(),
        };

        let rendered = sink.render(&record);

        assert!(rendered.starts_with("Thu Mar  7 09:05:01 "), "{rendered}");
        assert!(rendered.ends_with(" 2024 PINGER 10.0.0.1 is UP"), "{rendered}");
    }

    #[tokio::test]
    async fn test_write_publishes_on_log_topic() {
        let messages = Arc::new(RecordingMessageSink::default());
        let sink = RemoteSink::new(messages.clone(), "logging", "PINGER");

        sink.write(&LogRecord::new("10.0.0.2 is DOWN")).await.unwrap();

        let published = messages.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "logging");
        let body = String::from_utf8(published[0].1.clone()).unwrap();
        assert!(body.ends_with("PINGER 10.0.0.2 is DOWN"));
    }

    #[tokio::test]
    async fn test_publish_failure_is_reported() {
        let messages = Arc::new(RecordingMessageSink::failing());
        let sink = RemoteSink::new(messages, "logging", "PINGER");

        let result = sink.write(&LogRecord::new("lost")).await;
        assert!(matches!(result, Err(SinkError::Publish(_))));
    }
}
