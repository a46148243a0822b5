//! Reservation Service Adapter
//!
//! HTTP client for the ledger's reserve / cancel endpoints. One call here is
//! one attempt; `ReservationGateway` owns the retry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::ReservationClient;
use crate::config::ReservationConfig;
use crate::transfer::error::RemoteCallError;
use crate::transfer::types::{
    AIT_ID, BUSINESS_TAXONOMY_ID, CORRELATION_ID, CancellationRequest, ReservationOutcome,
    ReservationRecord, ReservationRequest, TimedResponse, TraceHeaders,
};

/// Status field of a ledger response payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum LedgerStatus {
    Success,
    InsufficientFunds,
    Failure,
}

/// Ledger entry as the reservation service returns it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerResource {
    #[serde(rename = "transactionUuid")]
    transaction_id: Uuid,
    #[serde(rename = "requestUuid")]
    request_id: Uuid,
    #[serde(rename = "reservationUuid", default)]
    reservation_id: Option<Uuid>,
    account_number: String,
    #[serde(rename = "transactionAmount")]
    amount: i64,
    #[serde(rename = "runningBalanceAmount", default)]
    running_balance: i64,
    #[serde(rename = "transactionTypeCode", default)]
    transaction_type: String,
    #[serde(rename = "transactionMetaDataJson", default)]
    metadata: String,
    #[serde(rename = "insertTimestamp", default)]
    inserted_at: Option<DateTime<Utc>>,
}

impl LedgerResource {
    fn into_record(self, outcome: ReservationOutcome) -> ReservationRecord {
        ReservationRecord {
            transaction_id: self.transaction_id,
            request_id: self.request_id,
            reservation_id: self.reservation_id,
            account_number: self.account_number,
            amount: self.amount,
            running_balance: self.running_balance,
            outcome,
            transaction_type: self.transaction_type,
            metadata: self.metadata,
            inserted_at: self.inserted_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LedgerPayload {
    status: LedgerStatus,
    resource: LedgerResource,
}

pub struct HttpReservationClient {
    client: Client,
    reserve_url: String,
    cancel_url: String,
    ait_id: String,
}

impl HttpReservationClient {
    /// Build a client with the connect / request timeouts from config
    pub fn new(config: &ReservationConfig, ait_id: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self::with_client(
            client,
            &config.reserve_url,
            &config.cancel_url,
            ait_id,
        ))
    }

    pub fn with_client(client: Client, reserve_url: &str, cancel_url: &str, ait_id: &str) -> Self {
        Self {
            client,
            reserve_url: reserve_url.to_string(),
            cancel_url: cancel_url.to_string(),
            ait_id: ait_id.to_string(),
        }
    }

    async fn post<B, R>(&self, url: &str, headers: &TraceHeaders, body: &B) -> Result<R, RemoteCallError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(AIT_ID, &self.ait_id)
            .header(BUSINESS_TAXONOMY_ID, &headers.business_taxonomy_id)
            .header(CORRELATION_ID, &headers.correlation_id)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteCallError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: TimedResponse<R> = response.json().await?;
        debug!(
            url,
            elapsed_ms = started.elapsed().as_millis() as u64,
            service_ms = envelope.service_time_elapsed,
            "Reservation service responded"
        );
        Ok(envelope.payload)
    }
}

#[async_trait]
impl ReservationClient for HttpReservationClient {
    async fn reserve(
        &self,
        headers: &TraceHeaders,
        request: &ReservationRequest,
    ) -> Result<ReservationRecord, RemoteCallError> {
        let payload: LedgerPayload = self.post(&self.reserve_url, headers, request).await?;

        match payload.status {
            LedgerStatus::Success => Ok(payload.resource.into_record(ReservationOutcome::Success)),
            LedgerStatus::InsufficientFunds => Ok(payload
                .resource
                .into_record(ReservationOutcome::InsufficientFunds)),
            LedgerStatus::Failure => Err(RemoteCallError::Rejected {
                status: 200,
                message: format!("reservation {} reported FAILURE", request.request_id),
            }),
        }
    }

    async fn cancel(
        &self,
        headers: &TraceHeaders,
        request: &CancellationRequest,
    ) -> Result<ReservationRecord, RemoteCallError> {
        let payload: LedgerPayload = self.post(&self.cancel_url, headers, request).await?;

        match payload.status {
            LedgerStatus::Success => Ok(payload.resource.into_record(ReservationOutcome::Success)),
            other => Err(RemoteCallError::Rejected {
                status: 200,
                message: format!(
                    "cancellation of {} reported {:?}",
                    request.reservation_id, other
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_parsing() {
        let json = r#"{
            "status": "INSUFFICIENT_FUNDS",
            "resource": {
                "transactionUuid": "6f1c1f0e-3d3a-4a1e-9a5e-2f3f1b7d9c11",
                "requestUuid": "0b8f2c55-8a0d-4c3c-9d84-0f6e5b3f1a22",
                "accountNumber": "12341234",
                "transactionAmount": -2345,
                "runningBalanceAmount": 100,
                "transactionTypeCode": "REJECTED_TRANSACTION",
                "transactionMetaDataJson": "{}"
            }
        }"#;

        let payload: LedgerPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.status, LedgerStatus::InsufficientFunds);

        let record = payload
            .resource
            .into_record(ReservationOutcome::InsufficientFunds);
        assert!(record.is_insufficient_funds());
        assert_eq!(record.amount, -2345);
        assert!(record.reservation_id.is_none());
        assert!(record.inserted_at.is_none());
    }

    #[test]
    fn test_client_from_config() {
        let config = ReservationConfig::default();
        let client = HttpReservationClient::new(&config, "27834").unwrap();
        assert_eq!(client.reserve_url, config.reserve_url);
        assert_eq!(client.ait_id, "27834");
    }
}
