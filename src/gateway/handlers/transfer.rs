//! Funds transfer handler

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};

use super::super::state::AppState;
use crate::transfer::TransferError;
use crate::transfer::api::{self, ApiError, ApiSuccess, TransferFundsRequest};

/// POST /TransferFunds
///
/// Headers are checked before the body so a bad version is reported as such
/// even when the body is malformed.
pub async fn transfer_funds(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<TransferFundsRequest>, JsonRejection>,
) -> Result<ApiSuccess, ApiError> {
    let trace = api::extract_trace_headers(&headers).map_err(|e| api::error_response(&e))?;

    let Json(body) = body.map_err(|rejection| {
        api::error_response(&TransferError::Validation(rejection.body_text()))
    })?;

    tracing::info!(
        correlation_id = %trace.correlation_id,
        business_taxonomy_id = %trace.business_taxonomy_id,
        "[TRACE] TransferFunds request"
    );

    api::transfer_funds(&state.orchestrator, &trace, body).await
}
