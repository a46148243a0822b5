//! Reservation Gateway
//!
//! Places and releases debit holds through a `ReservationClient`, each call
//! wrapped independently by the retry policy. An `INSUFFICIENT_FUNDS`
//! outcome comes back as `Ok`; the saga branches on it.

use std::sync::Arc;

use tracing::info;

use super::adapters::ReservationClient;
use super::error::{RemoteCallError, TransferError};
use super::retry::{RetryError, RetryPolicy};
use super::types::{CancellationRequest, ReservationRecord, ReservationRequest, TraceHeaders};

pub struct ReservationGateway {
    client: Arc<dyn ReservationClient>,
    retry: RetryPolicy,
}

impl ReservationGateway {
    pub fn new(client: Arc<dyn ReservationClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub async fn reserve(
        &self,
        headers: &TraceHeaders,
        request: &ReservationRequest,
    ) -> Result<ReservationRecord, TransferError> {
        let client = self.client.as_ref();
        let record = self
            .retry
            .run("reserve", move || client.reserve(headers, request))
            .await
            .map_err(|e| escalate("reserve", e))?;

        info!(
            request_id = %request.request_id,
            transaction_id = %record.transaction_id,
            outcome = ?record.outcome,
            running_balance = record.running_balance,
            "Reservation recorded"
        );
        Ok(record)
    }

    pub async fn cancel(
        &self,
        headers: &TraceHeaders,
        request: &CancellationRequest,
    ) -> Result<ReservationRecord, TransferError> {
        let client = self.client.as_ref();
        let record = self
            .retry
            .run("cancel", move || client.cancel(headers, request))
            .await
            .map_err(|e| escalate("cancel", e))?;

        info!(
            reservation_id = %request.reservation_id,
            transaction_id = %record.transaction_id,
            "Reservation cancelled"
        );
        Ok(record)
    }
}

fn escalate(operation: &'static str, err: RetryError<RemoteCallError>) -> TransferError {
    match err {
        RetryError::Exhausted { attempts, last } => TransferError::RemoteUnavailable {
            operation,
            attempts,
            reason: last.to_string(),
        },
        RetryError::Permanent(e) => TransferError::RemoteRejected {
            operation,
            status: e.status(),
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::adapters::{Journal, MockReservationClient};
    use crate::transfer::types::ReservationOutcome;
    use crate::transfer::types::fixtures::{reservation_record, transfer_request};
    use std::time::Duration;

    fn gateway(client: Arc<MockReservationClient>) -> ReservationGateway {
        let retry = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5));
        ReservationGateway::new(client, retry)
    }

    #[tokio::test]
    async fn test_insufficient_funds_is_not_an_error() {
        let client = Arc::new(MockReservationClient::new(Journal::default()));
        client.set_reserve_outcome(ReservationOutcome::InsufficientFunds);
        let gateway = gateway(client.clone());

        let request = ReservationRequest::debit_for(&transfer_request(500));
        let record = gateway
            .reserve(&TraceHeaders::default(), &request)
            .await
            .unwrap();

        assert!(record.is_insufficient_funds());
        assert_eq!(client.reserve_count(), 1);
    }

    #[tokio::test]
    async fn test_reserve_retries_transient_failures() {
        let client = Arc::new(MockReservationClient::new(Journal::default()));
        client.fail_reserve_transiently(2);
        let gateway = gateway(client.clone());

        let request = ReservationRequest::debit_for(&transfer_request(500));
        let record = gateway.reserve(&TraceHeaders::default(), &request).await;

        assert!(record.is_ok());
        assert_eq!(client.reserve_count(), 3);
    }

    #[tokio::test]
    async fn test_reserve_exhaustion_is_remote_unavailable() {
        let client = Arc::new(MockReservationClient::new(Journal::default()));
        client.fail_reserve_transiently(10);
        let gateway = gateway(client.clone());

        let request = ReservationRequest::debit_for(&transfer_request(500));
        let result = gateway.reserve(&TraceHeaders::default(), &request).await;

        assert!(matches!(
            result,
            Err(TransferError::RemoteUnavailable {
                operation: "reserve",
                attempts: 3,
                ..
            })
        ));
        assert_eq!(client.reserve_count(), 3);
    }

    #[tokio::test]
    async fn test_rejection_is_surfaced_once() {
        let client = Arc::new(MockReservationClient::new(Journal::default()));
        client.set_reject_reserve(true);
        let gateway = gateway(client.clone());

        let request = ReservationRequest::debit_for(&transfer_request(500));
        let result = gateway.reserve(&TraceHeaders::default(), &request).await;

        assert!(matches!(
            result,
            Err(TransferError::RemoteRejected {
                status: Some(400),
                ..
            })
        ));
        assert_eq!(client.reserve_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_retried_independently() {
        let client = Arc::new(MockReservationClient::new(Journal::default()));
        client.set_fail_cancel(true);
        let gateway = gateway(client.clone());

        let req = transfer_request(500);
        let reservation = reservation_record(&req, ReservationOutcome::Success);
        let cancellation = CancellationRequest::for_reservation(&reservation, &req.metadata);
        let result = gateway.cancel(&TraceHeaders::default(), &cancellation).await;

        assert!(matches!(
            result,
            Err(TransferError::RemoteUnavailable {
                operation: "cancel",
                ..
            })
        ));
        assert_eq!(client.cancel_count(), 3);
        assert_eq!(client.reserve_count(), 0);
    }
}
