//! Transfer Core Types
//!
//! Entities exchanged between the saga, the reservation service and the
//! fulfillment broker. Everything here is created fresh per request; the
//! remote services own persistence.
//!
//! Field names on the wire are camelCase and follow the ledger's historical
//! naming (`requestUuid`, `transactionAmount`, ...).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the calling application's id
pub const AIT_ID: &str = "ait-id";
/// Header carrying the business taxonomy id (forwarded unchanged)
pub const BUSINESS_TAXONOMY_ID: &str = "business-taxonomy-id";
/// Header carrying the correlation id (forwarded unchanged)
pub const CORRELATION_ID: &str = "correlation-id";
/// Header carrying the API version requested by the caller
pub const ACCEPT_VERSION: &str = "accept-version";

/// The only supported version of the transfer API and fulfillment schema
pub const VERSION_1_0: &str = "1_0";

/// Tracing headers forwarded to both remote calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceHeaders {
    pub correlation_id: String,
    pub business_taxonomy_id: String,
}

impl TraceHeaders {
    pub fn new(correlation_id: impl Into<String>, business_taxonomy_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            business_taxonomy_id: business_taxonomy_id.into(),
        }
    }
}

/// Funds transfer request, validated by the inbound layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Idempotency key supplied by the caller
    #[serde(rename = "requestUuid")]
    pub request_id: Uuid,
    #[serde(rename = "fromAccountNumber")]
    pub from_account: String,
    #[serde(rename = "toAccountNumber")]
    pub to_account: String,
    /// Minor currency units, strictly positive
    #[serde(rename = "transactionAmount")]
    pub amount: i64,
    /// Opaque JSON document passed through to every downstream call
    #[serde(rename = "transactionJsonMetaData")]
    pub metadata: String,
}

impl TransferRequest {
    pub fn new(
        request_id: Uuid,
        from_account: impl Into<String>,
        to_account: impl Into<String>,
        amount: i64,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            from_account: from_account.into(),
            to_account: to_account.into(),
            amount,
            metadata: metadata.into(),
        }
    }
}

/// Account lifecycle status
///
/// The account store uses two-letter codes. `EF` (effective) and its long
/// form `ACTIVE` are the only statuses in good standing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleStatus {
    Active,
    Closed,
    /// Any other code, kept verbatim
    Other(String),
}

impl LifecycleStatus {
    /// Parse a lifecycle status code from the account store
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "EF" | "ACTIVE" => LifecycleStatus::Active,
            "CL" | "CLOSED" => LifecycleStatus::Closed,
            other => LifecycleStatus::Other(other.to_string()),
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            LifecycleStatus::Active => "EF",
            LifecycleStatus::Closed => "CL",
            LifecycleStatus::Other(code) => code,
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Read-only account snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_number: String,
    pub lifecycle_status: LifecycleStatus,
}

impl Account {
    pub fn new(account_number: impl Into<String>, lifecycle_status: LifecycleStatus) -> Self {
        Self {
            account_number: account_number.into(),
            lifecycle_status,
        }
    }

    /// Only ACTIVE accounts may take part in a transfer
    #[inline]
    pub fn is_in_good_standing(&self) -> bool {
        self.lifecycle_status == LifecycleStatus::Active
    }
}

/// Debit hold request sent to the reservation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    #[serde(rename = "accountNumber")]
    pub account_number: String,
    #[serde(rename = "requestUuid")]
    pub request_id: Uuid,
    /// Signed; negative is a debit
    #[serde(rename = "transactionAmount")]
    pub amount: i64,
    #[serde(rename = "transactionMetaDataJson")]
    pub metadata: String,
}

impl ReservationRequest {
    /// Debit hold against the transfer's source account.
    ///
    /// The transfer's own request id is the idempotency key, so replaying a
    /// transfer never places a second hold.
    pub fn debit_for(request: &TransferRequest) -> Self {
        Self {
            account_number: request.from_account.clone(),
            request_id: request.request_id,
            amount: -request.amount,
            metadata: request.metadata.clone(),
        }
    }
}

/// Outcome reported by the reservation service for a well-formed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationOutcome {
    Success,
    InsufficientFunds,
}

/// Ledger entry returned by the reservation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRecord {
    /// Server-assigned id of the ledger entry
    #[serde(rename = "transactionUuid")]
    pub transaction_id: Uuid,
    /// Idempotency key the entry was recorded under
    #[serde(rename = "requestUuid")]
    pub request_id: Uuid,
    /// Set on cancellation entries: the hold being released
    #[serde(rename = "reservationUuid", skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<Uuid>,
    pub account_number: String,
    #[serde(rename = "transactionAmount")]
    pub amount: i64,
    #[serde(rename = "runningBalanceAmount")]
    pub running_balance: i64,
    pub outcome: ReservationOutcome,
    #[serde(rename = "transactionTypeCode", default)]
    pub transaction_type: String,
    #[serde(rename = "transactionMetaDataJson")]
    pub metadata: String,
    #[serde(rename = "insertTimestamp", skip_serializing_if = "Option::is_none")]
    pub inserted_at: Option<DateTime<Utc>>,
}

impl ReservationRecord {
    #[inline]
    pub fn is_insufficient_funds(&self) -> bool {
        self.outcome == ReservationOutcome::InsufficientFunds
    }
}

/// Asynchronous instruction that makes the downstream consumer move the funds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentMessage {
    /// Always the reservation's transaction id, never a fresh UUID:
    /// downstream deduplicates on it.
    #[serde(rename = "requestUuid")]
    pub request_id: Uuid,
    #[serde(rename = "reservationUuid")]
    pub reservation_id: Uuid,
    #[serde(rename = "fromAccountNumber")]
    pub from_account: String,
    #[serde(rename = "toAccountNumber")]
    pub to_account: String,
    #[serde(rename = "transactionAmount")]
    pub amount: i64,
    #[serde(rename = "transactionMetaDataJson")]
    pub metadata: String,
    #[serde(rename = "version")]
    pub schema_version: String,
}

impl FulfillmentMessage {
    /// Build the fulfillment message for a successful reservation
    pub fn for_reservation(
        reservation: &ReservationRecord,
        from: &Account,
        to: &Account,
        request: &TransferRequest,
    ) -> Self {
        Self {
            request_id: reservation.transaction_id,
            reservation_id: reservation.transaction_id,
            from_account: from.account_number.clone(),
            to_account: to.account_number.clone(),
            amount: request.amount,
            metadata: request.metadata.clone(),
            schema_version: VERSION_1_0.to_string(),
        }
    }
}

/// Release of a previously placed hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRequest {
    #[serde(rename = "requestUuid")]
    pub request_id: Uuid,
    #[serde(rename = "reservationUuid")]
    pub reservation_id: Uuid,
    #[serde(rename = "transactionMetaDataJson")]
    pub metadata: String,
}

impl CancellationRequest {
    pub fn for_reservation(reservation: &ReservationRecord, metadata: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            reservation_id: reservation.transaction_id,
            metadata: metadata.to_string(),
        }
    }
}

/// Caller-visible transfer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Success,
    InsufficientFunds,
    Failure,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Success => "SUCCESS",
            TransferStatus::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferStatus::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a transfer, including the remote mutations actually performed
///
/// `applied_records` holds the reservation first and, when the hold was
/// released, the cancellation second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub status: TransferStatus,
    #[serde(rename = "reservations")]
    pub applied_records: Vec<ReservationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_message: Option<FulfillmentMessage>,
}

impl TransferResult {
    pub fn completed(reservation: ReservationRecord, message: FulfillmentMessage) -> Self {
        Self {
            status: TransferStatus::Success,
            applied_records: vec![reservation],
            fulfillment_message: Some(message),
        }
    }

    pub fn insufficient_funds(reservation: ReservationRecord) -> Self {
        Self {
            status: TransferStatus::InsufficientFunds,
            applied_records: vec![reservation],
            fulfillment_message: None,
        }
    }

    pub fn failed(reservation: ReservationRecord, cancellation: Option<ReservationRecord>) -> Self {
        let mut applied_records = vec![reservation];
        applied_records.extend(cancellation);
        Self {
            status: TransferStatus::Failure,
            applied_records,
            fulfillment_message: None,
        }
    }

    pub fn reservation(&self) -> Option<&ReservationRecord> {
        self.applied_records.first()
    }

    pub fn cancellation(&self) -> Option<&ReservationRecord> {
        self.applied_records.get(1)
    }
}

/// Response envelope used by the ledger services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedResponse<T> {
    /// Milliseconds spent inside the responding service
    pub service_time_elapsed: u64,
    pub payload: T,
}

impl<T> TimedResponse<T> {
    pub fn new(service_time_elapsed: u64, payload: T) -> Self {
        Self {
            service_time_elapsed,
            payload,
        }
    }
}

/// Broker envelope carrying tracing data alongside the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceableMessage<T> {
    pub producer_ait: String,
    pub correlation_id: String,
    pub business_taxonomy_id: String,
    pub message_creation_time: DateTime<Utc>,
    pub payload: T,
}

impl<T> TraceableMessage<T> {
    pub fn new(producer_ait: &str, headers: &TraceHeaders, payload: T) -> Self {
        Self {
            producer_ait: producer_ait.to_string(),
            correlation_id: headers.correlation_id.clone(),
            business_taxonomy_id: headers.business_taxonomy_id.clone(),
            message_creation_time: Utc::now(),
            payload,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_lifecycle_status_codes() {
        assert_eq!(LifecycleStatus::from_code("EF"), LifecycleStatus::Active);
        assert_eq!(LifecycleStatus::from_code("ACTIVE"), LifecycleStatus::Active);
        assert_eq!(LifecycleStatus::from_code("CL"), LifecycleStatus::Closed);
        assert_eq!(
            LifecycleStatus::from_code("FR"),
            LifecycleStatus::Other("FR".to_string())
        );
        // CHAR(n) columns come back space padded
        assert_eq!(LifecycleStatus::from_code("EF "), LifecycleStatus::Active);
    }

    #[test]
    fn test_good_standing() {
        assert!(Account::new("1", LifecycleStatus::Active).is_in_good_standing());
        assert!(!Account::new("1", LifecycleStatus::Closed).is_in_good_standing());
        assert!(!Account::new("1", LifecycleStatus::from_code("FR")).is_in_good_standing());
    }

    #[test]
    fn test_debit_negates_amount() {
        let req = transfer_request(2345);
        let debit = ReservationRequest::debit_for(&req);

        assert_eq!(debit.amount, -2345);
        assert_eq!(debit.request_id, req.request_id);
        assert_eq!(debit.account_number, req.from_account);
        assert_eq!(debit.metadata, req.metadata);
    }

    #[test]
    fn test_fulfillment_ids_follow_reservation() {
        let req = transfer_request(100);
        let reservation = reservation_record(&req, ReservationOutcome::Success);
        let from = Account::new(&req.from_account, LifecycleStatus::Active);
        let to = Account::new(&req.to_account, LifecycleStatus::Active);

        let msg = FulfillmentMessage::for_reservation(&reservation, &from, &to, &req);

        assert_eq!(msg.request_id, reservation.transaction_id);
        assert_eq!(msg.reservation_id, reservation.transaction_id);
        assert_ne!(msg.request_id, req.request_id);
        assert_eq!(msg.amount, 100);
        assert_eq!(msg.schema_version, VERSION_1_0);
    }

    #[test]
    fn test_cancellation_gets_fresh_request_id() {
        let req = transfer_request(100);
        let reservation = reservation_record(&req, ReservationOutcome::Success);

        let a = CancellationRequest::for_reservation(&reservation, "{}");
        let b = CancellationRequest::for_reservation(&reservation, "{}");

        assert_eq!(a.reservation_id, reservation.transaction_id);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_failed_result_orders_records() {
        let req = transfer_request(100);
        let reservation = reservation_record(&req, ReservationOutcome::Success);
        let mut cancellation = reservation_record(&req, ReservationOutcome::Success);
        cancellation.reservation_id = Some(reservation.transaction_id);

        let result = TransferResult::failed(reservation.clone(), Some(cancellation.clone()));
        assert_eq!(result.status, TransferStatus::Failure);
        assert_eq!(result.reservation(), Some(&reservation));
        assert_eq!(result.cancellation(), Some(&cancellation));
        assert!(result.fulfillment_message.is_none());

        let result = TransferResult::failed(reservation, None);
        assert_eq!(result.applied_records.len(), 1);
        assert!(result.cancellation().is_none());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let req = transfer_request(100);
        let reservation = reservation_record(&req, ReservationOutcome::InsufficientFunds);
        let json = serde_json::to_value(TransferResult::insufficient_funds(reservation)).unwrap();

        assert_eq!(json["status"], "INSUFFICIENT_FUNDS");
        assert_eq!(json["reservations"][0]["outcome"], "INSUFFICIENT_FUNDS");
        assert_eq!(json["reservations"][0]["transactionAmount"], -100);
        assert!(json.get("fulfillmentMessage").is_none());
    }
}
