//! Kafka Producer Adapter
//!
//! Delivery retries inside librdkafka are governed by the producer
//! properties (`retries`, `retry.backoff.ms`); this layer makes one send and
//! waits for the delivery report.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::{debug, info};

use super::BrokerProducer;
use crate::config::BrokerConfig;
use crate::transfer::error::BrokerError;

pub struct KafkaProducer {
    producer: FutureProducer,
    queue_timeout: Duration,
}

impl KafkaProducer {
    pub fn from_config(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let mut client = ClientConfig::new();
        client
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("message.timeout.ms", config.timeout_ms.to_string());
        for (key, value) in &config.properties {
            client.set(key, value);
        }

        let producer: FutureProducer = client
            .create()
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        info!(
            bootstrap_servers = %config.bootstrap_servers,
            topic = %config.topic,
            "Kafka producer created"
        );

        Ok(Self {
            producer,
            queue_timeout: Duration::from_millis(config.timeout_ms),
        })
    }
}

#[async_trait]
impl BrokerProducer for KafkaProducer {
    async fn produce(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let record = FutureRecord::to(topic).key(key).payload(&payload);

        match self
            .producer
            .send(record, Timeout::After(self.queue_timeout))
            .await
        {
            Ok(delivery) => {
                debug!(topic, key, ?delivery, "Kafka delivery acknowledged");
                Ok(())
            }
            Err((e, _)) => Err(BrokerError::Delivery(e.to_string())),
        }
    }
}
