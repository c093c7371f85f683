//! Kafka tick publisher

use super::{SinkError, SinkKind, TickPublisher};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaResult;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use std::time::Duration;

/// Topic dedicated to market ticks
pub const TICKS_TOPIC: &str = "market.ticks";

/// Configuration for the Kafka publisher
#[derive(Debug, Clone)]
pub struct KafkaPublisherConfig {
    /// Comma-separated bootstrap servers
    pub brokers: String,
    /// Destination topic
    pub topic: String,
    /// Upper bound for queueing and delivering one message
    pub send_timeout: Duration,
}

impl Default for KafkaPublisherConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: TICKS_TOPIC.to_string(),
            send_timeout: Duration::from_secs(5),
        }
    }
}

/// Publishes serialized ticks to a fixed topic
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaPublisher {
    /// Create the producer; does not contact the brokers
    pub fn new(config: &KafkaPublisherConfig) -> KafkaResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set(
                "message.timeout.ms",
                config.send_timeout.as_millis().to_string(),
            )
            .create()?;

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            send_timeout: config.send_timeout,
        })
    }

    /// Topic messages are sent to
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Fetch topic metadata to confirm a broker is reachable
    pub async fn verify(&self, timeout: Duration) -> Result<(), SinkError> {
        let producer = self.producer.clone();
        let topic = self.topic.clone();

        // librdkafka metadata calls block the calling thread
        tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(Some(topic.as_str()), timeout)
                .map(|_| ())
        })
        .await
        .map_err(|e| SinkError::Unavailable {
            sink: SinkKind::Publish,
            reason: e.to_string(),
        })??;

        tracing::info!(topic = %self.topic, "Kafka publisher ready");
        Ok(())
    }

    /// Wait for queued messages to be delivered
    pub fn flush(&self, timeout: Duration) -> KafkaResult<()> {
        self.producer.flush(timeout)
    }
}

#[async_trait]
impl TickPublisher for KafkaPublisher {
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), SinkError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);

        self.producer
            .send(record, self.send_timeout)
            .await
            .map_err(|(e, _)| SinkError::Publish(e))?;
        Ok(())
    }
}
