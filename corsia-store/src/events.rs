use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::error::Error;
use std::time::Duration;
use tracing::{error, info};

use corsia_domain::{AuditEntry, AuditSink};

/// Publishes completed audit entries to a Kafka topic for compliance and
/// analytics consumers. Keyed by flight id so all attempts against one
/// flight land on the same partition, in order.
pub struct KafkaAuditSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaAuditSink {
    pub fn new(brokers: &str, topic: impl Into<String>) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            topic: topic.into(),
        })
    }
}

#[async_trait]
impl AuditSink for KafkaAuditSink {
    async fn publish(&self, entry: &AuditEntry) -> Result<(), Box<dyn Error + Send + Sync>> {
        let payload = serde_json::to_string(entry)?;
        let key = entry.flight_id.to_string();
        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        match self
            .producer
            .send(record, Timeout::After(Duration::from_secs(0)))
            .await
        {
            Ok(delivery) => {
                let partition = delivery.partition;
                let offset = delivery.offset;
                info!(
                    "Audit entry {} sent to {}: partition {} offset {}",
                    entry.id, self.topic, partition, offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to publish audit entry {}: {}", entry.id, e);
                Err(Box::new(e))
            }
        }
    }
}
