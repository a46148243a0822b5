//! Fulfillment Message Dispatcher
//!
//! Publishes the fulfillment message keyed by the source account and waits a
//! bounded time for the broker acknowledgement. Exactly one attempt: if the
//! ack does not arrive, the saga compensates instead of resending.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::adapters::BrokerProducer;
use super::error::TransferError;
use super::types::{FulfillmentMessage, TraceHeaders, TraceableMessage};
use crate::config::BrokerConfig;

pub struct MessageDispatcher {
    producer: Arc<dyn BrokerProducer>,
    topic: String,
    timeout: Duration,
    producer_ait: String,
}

impl MessageDispatcher {
    pub fn new(
        producer: Arc<dyn BrokerProducer>,
        topic: impl Into<String>,
        timeout: Duration,
        producer_ait: impl Into<String>,
    ) -> Self {
        Self {
            producer,
            topic: topic.into(),
            timeout,
            producer_ait: producer_ait.into(),
        }
    }

    pub fn from_config(producer: Arc<dyn BrokerProducer>, config: &BrokerConfig, ait_id: &str) -> Self {
        Self::new(
            producer,
            config.topic.clone(),
            Duration::from_millis(config.timeout_ms),
            ait_id,
        )
    }

    pub async fn dispatch(
        &self,
        headers: &TraceHeaders,
        message: &FulfillmentMessage,
    ) -> Result<(), TransferError> {
        let envelope = TraceableMessage::new(&self.producer_ait, headers, message);
        let payload = serde_json::to_vec(&envelope).map_err(|e| {
            TransferError::DispatchFailure(format!("message serialization failed: {}", e))
        })?;

        let started = Instant::now();
        let result = tokio::time::timeout(
            self.timeout,
            self.producer
                .produce(&self.topic, &message.from_account, payload),
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(())) => {
                info!(
                    topic = %self.topic,
                    request_id = %message.request_id,
                    elapsed_ms,
                    "Fulfillment message produced"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(
                    topic = %self.topic,
                    request_id = %message.request_id,
                    elapsed_ms,
                    error = %e,
                    "Broker rejected fulfillment message"
                );
                Err(TransferError::DispatchFailure(e.to_string()))
            }
            Err(_) => {
                warn!(
                    topic = %self.topic,
                    request_id = %message.request_id,
                    elapsed_ms,
                    "Broker acknowledgement timed out"
                );
                Err(TransferError::DispatchFailure(format!(
                    "no broker acknowledgement within {} ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::adapters::{Journal, MockBrokerProducer};
    use crate::transfer::types::fixtures::{reservation_record, transfer_request};
    use crate::transfer::types::{Account, LifecycleStatus, ReservationOutcome};

    fn message() -> FulfillmentMessage {
        let req = transfer_request(2345);
        let reservation = reservation_record(&req, ReservationOutcome::Success);
        FulfillmentMessage::for_reservation(
            &reservation,
            &Account::new(&req.from_account, LifecycleStatus::Active),
            &Account::new(&req.to_account, LifecycleStatus::Active),
            &req,
        )
    }

    fn dispatcher(producer: Arc<MockBrokerProducer>, timeout_ms: u64) -> MessageDispatcher {
        MessageDispatcher::new(
            producer,
            "transfer.request",
            Duration::from_millis(timeout_ms),
            "27834",
        )
    }

    #[tokio::test]
    async fn test_dispatch_wraps_message_in_envelope() {
        let producer = Arc::new(MockBrokerProducer::new(Journal::default()));
        let msg = message();
        let headers = TraceHeaders::new("corr-1", "tax-1");

        dispatcher(producer.clone(), 500)
            .dispatch(&headers, &msg)
            .await
            .unwrap();

        let produced = producer.produced();
        assert_eq!(produced.len(), 1);
        let (topic, key, payload) = &produced[0];
        assert_eq!(topic, "transfer.request");
        assert_eq!(key, &msg.from_account);

        let envelope: TraceableMessage<FulfillmentMessage> =
            serde_json::from_slice(payload).unwrap();
        assert_eq!(envelope.producer_ait, "27834");
        assert_eq!(envelope.correlation_id, "corr-1");
        assert_eq!(envelope.business_taxonomy_id, "tax-1");
        assert_eq!(envelope.payload, msg);
    }

    #[tokio::test]
    async fn test_broker_error_is_dispatch_failure() {
        let producer = Arc::new(MockBrokerProducer::new(Journal::default()));
        producer.set_fail_produce(true);

        let result = dispatcher(producer.clone(), 500)
            .dispatch(&TraceHeaders::default(), &message())
            .await;

        assert!(matches!(result, Err(TransferError::DispatchFailure(_))));
        assert_eq!(producer.produce_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_ack_times_out_without_resend() {
        let producer = Arc::new(MockBrokerProducer::new(Journal::default()));
        producer.set_hang(true);

        let started = Instant::now();
        let result = dispatcher(producer.clone(), 50)
            .dispatch(&TraceHeaders::default(), &message())
            .await;

        assert!(matches!(result, Err(TransferError::DispatchFailure(ref m)) if m.contains("50 ms")));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(producer.produce_count(), 1);
    }
}
