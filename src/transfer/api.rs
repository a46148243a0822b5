//! Transfer API Layer
//!
//! Request/response types for `POST /TransferFunds` and the mapping between
//! HTTP and the saga. Header and body checks happen here; the orchestrator
//! re-validates the request before any remote call.

use std::time::Instant;

use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::error::TransferError;
use super::orchestrator::TransferOrchestrator;
use super::outcome::TransferOutcome;
use super::types::{
    ACCEPT_VERSION, AIT_ID, BUSINESS_TAXONOMY_ID, CORRELATION_ID, TimedResponse, TraceHeaders,
    TransferRequest, TransferResult, VERSION_1_0,
};
use super::validation::validate_transfer_request;

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Inbound transfer request body
///
/// Every field is optional at the serde level so a missing field becomes a
/// 400 with a useful message instead of a generic deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFundsRequest {
    pub request_uuid: Option<Uuid>,
    pub from_account_number: Option<String>,
    pub to_account_number: Option<String>,
    pub transaction_amount: Option<i64>,
    pub transaction_json_meta_data: Option<String>,
}

impl TransferFundsRequest {
    pub fn into_transfer_request(self) -> Result<TransferRequest, TransferError> {
        let request = TransferRequest::new(
            required(self.request_uuid, "requestUuid")?,
            required(self.from_account_number, "fromAccountNumber")?,
            required(self.to_account_number, "toAccountNumber")?,
            required(self.transaction_amount, "transactionAmount")?,
            required(self.transaction_json_meta_data, "transactionJsonMetaData")?,
        );
        validate_transfer_request(&request)?;
        Ok(request)
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, TransferError> {
    value.ok_or_else(|| TransferError::Validation(format!("{} is required", field)))
}

/// Error body for requests that never reached a reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub msg: String,
}

impl From<&TransferError> for ErrorBody {
    fn from(e: &TransferError) -> Self {
        Self {
            code: e.code().to_string(),
            msg: e.to_string(),
        }
    }
}

/// Transfer response payload
///
/// On a disrupted transfer `error` explains what went wrong and the
/// reservations list shows what was actually applied upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFundsResponse {
    #[serde(flatten)]
    pub result: TransferResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(default)]
    pub reconciliation_required: bool,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);
pub type ApiSuccess = (StatusCode, Json<TimedResponse<TransferFundsResponse>>);

// ============================================================================
// Helper Functions
// ============================================================================

pub fn error_response(e: &TransferError) -> ApiError {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody::from(e)))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, TransferError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TransferError::Validation(format!("Missing {} header", name)))
}

/// Check the required inbound headers and keep the ones forwarded downstream
pub fn extract_trace_headers(headers: &HeaderMap) -> Result<TraceHeaders, TransferError> {
    header(headers, AIT_ID)?;
    let business_taxonomy_id = header(headers, BUSINESS_TAXONOMY_ID)?;
    let correlation_id = header(headers, CORRELATION_ID)?;

    let version = header(headers, ACCEPT_VERSION)?;
    if version != VERSION_1_0 {
        return Err(TransferError::Validation(format!(
            "Unsupported {}: {}",
            ACCEPT_VERSION, version
        )));
    }

    Ok(TraceHeaders::new(correlation_id, business_taxonomy_id))
}

/// Map a saga outcome onto the HTTP contract
pub fn render_outcome(outcome: TransferOutcome, elapsed_ms: u64) -> Result<ApiSuccess, ApiError> {
    match outcome {
        TransferOutcome::Success(result) => Ok((
            StatusCode::OK,
            Json(TimedResponse::new(
                elapsed_ms,
                TransferFundsResponse {
                    result,
                    error: None,
                    reconciliation_required: false,
                },
            )),
        )),
        TransferOutcome::Disrupted { partial, cause } => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TimedResponse::new(
                elapsed_ms,
                TransferFundsResponse {
                    result: partial,
                    error: Some(ErrorBody::from(&cause)),
                    reconciliation_required: cause.requires_reconciliation(),
                },
            )),
        )),
        TransferOutcome::Fatal { cause } => Err(error_response(&cause)),
    }
}

// ============================================================================
// Handler (for integration with the Gateway)
// ============================================================================

/// Convert the body, run the saga and render its outcome
pub async fn transfer_funds(
    orchestrator: &TransferOrchestrator,
    headers: &TraceHeaders,
    body: TransferFundsRequest,
) -> Result<ApiSuccess, ApiError> {
    let started = Instant::now();
    let request = body.into_transfer_request().map_err(|e| error_response(&e))?;

    let outcome = orchestrator.transfer(headers, &request).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        request_id = %request.request_id,
        correlation_id = %headers.correlation_id,
        success = outcome.is_success(),
        retry_safe = outcome.is_retry_safe(),
        elapsed_ms,
        "TransferFunds handled"
    );
    render_outcome(outcome, elapsed_ms)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::types::ReservationOutcome;
    use crate::transfer::types::fixtures::{reservation_record, transfer_request};
    use axum::http::HeaderValue;

    fn valid_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AIT_ID, HeaderValue::from_static("12345"));
        headers.insert(BUSINESS_TAXONOMY_ID, HeaderValue::from_static("tax-1"));
        headers.insert(CORRELATION_ID, HeaderValue::from_static("corr-1"));
        headers.insert(ACCEPT_VERSION, HeaderValue::from_static("1_0"));
        headers
    }

    fn valid_body() -> TransferFundsRequest {
        TransferFundsRequest {
            request_uuid: Some(Uuid::new_v4()),
            from_account_number: Some("12341234".into()),
            to_account_number: Some("1334124".into()),
            transaction_amount: Some(2345),
            transaction_json_meta_data: Some("{}".into()),
        }
    }

    #[test]
    fn test_extract_trace_headers() {
        let trace = extract_trace_headers(&valid_headers()).unwrap();
        assert_eq!(trace, TraceHeaders::new("corr-1", "tax-1"));
    }

    #[test]
    fn test_missing_header_rejected() {
        for name in [AIT_ID, BUSINESS_TAXONOMY_ID, CORRELATION_ID, ACCEPT_VERSION] {
            let mut headers = valid_headers();
            headers.remove(name);
            let err = extract_trace_headers(&headers).unwrap_err();
            assert_eq!(err.http_status(), 400, "{}", name);
        }
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut headers = valid_headers();
        headers.insert(ACCEPT_VERSION, HeaderValue::from_static("2_0"));
        assert!(matches!(
            extract_trace_headers(&headers),
            Err(TransferError::Validation(_))
        ));
    }

    #[test]
    fn test_body_conversion() {
        let body = valid_body();
        let request_id = body.request_uuid;
        let req = body.into_transfer_request().unwrap();
        assert_eq!(Some(req.request_id), request_id);
        assert_eq!(req.amount, 2345);

        let body = TransferFundsRequest {
            transaction_amount: None,
            ..valid_body()
        };
        let err = body.into_transfer_request().unwrap_err();
        assert!(err.to_string().contains("transactionAmount"));

        let body = TransferFundsRequest {
            transaction_json_meta_data: Some("x".into()),
            ..valid_body()
        };
        assert!(body.into_transfer_request().is_err());
    }

    #[test]
    fn test_body_deserializes_camel_case() {
        let json = r#"{
            "requestUuid": "0b8f2c55-8a0d-4c3c-9d84-0f6e5b3f1a22",
            "fromAccountNumber": "12341234",
            "toAccountNumber": "1334124",
            "transactionAmount": 2345,
            "transactionJsonMetaData": "{\"memo\":\"rent\"}"
        }"#;
        let body: TransferFundsRequest = serde_json::from_str(json).unwrap();
        let req = body.into_transfer_request().unwrap();
        assert_eq!(req.metadata, r#"{"memo":"rent"}"#);
    }

    #[test]
    fn test_render_disrupted_outcome() {
        let req = transfer_request(100);
        let reservation = reservation_record(&req, ReservationOutcome::Success);
        let outcome = TransferOutcome::Disrupted {
            partial: TransferResult::failed(reservation.clone(), Some(reservation)),
            cause: TransferError::DispatchFailure("timeout".into()),
        };

        let (status, Json(body)) = render_outcome(outcome, 12).unwrap();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.service_time_elapsed, 12);
        assert!(!body.payload.reconciliation_required);
        assert_eq!(
            body.payload.error.as_ref().map(|e| e.code.as_str()),
            Some("DISPATCH_FAILURE")
        );

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["payload"]["status"], "FAILURE");
        assert_eq!(json["payload"]["reservations"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(json["payload"]["reconciliationRequired"], false);
    }

    #[test]
    fn test_render_fatal_outcome() {
        let outcome = TransferOutcome::Fatal {
            cause: TransferError::RemoteUnavailable {
                operation: "reserve",
                attempts: 3,
                reason: "connection refused".into(),
            },
        };

        let (status, Json(body)) = render_outcome(outcome, 5).unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "REMOTE_UNAVAILABLE");
    }
}
