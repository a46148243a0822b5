//! Transfer Error Types
//!
//! `TransferError` is what the saga reports to its caller.
//! `RemoteCallError` describes one failed attempt at a remote call and is what
//! the retry policy classifies.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Which side of the transfer an account error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSide {
    From,
    To,
}

impl fmt::Display for AccountSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountSide::From => f.write_str("From"),
            AccountSide::To => f.write_str("To"),
        }
    }
}

/// Transfer error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Rejected before any remote mutation ===
    #[error("Malformed request: {0}")]
    Validation(String),

    #[error("Account lookup failed for {account}: {reason}")]
    AccountLookup { account: String, reason: String },

    #[error("{side} account {account} is in an invalid state ({status})")]
    AccountState {
        side: AccountSide,
        account: String,
        status: String,
    },

    // === Reservation service ===
    #[error("{operation} failed after {attempts} attempt(s): {reason}")]
    RemoteUnavailable {
        operation: &'static str,
        attempts: u32,
        reason: String,
    },

    #[error("{operation} rejected: {reason}")]
    RemoteRejected {
        operation: &'static str,
        status: Option<u16>,
        reason: String,
    },

    // === Fulfillment ===
    #[error("Fulfillment dispatch failed: {0}")]
    DispatchFailure(String),

    #[error(
        "Fulfillment dispatch failed ({dispatch}) and reservation {reservation_id} could not be cancelled ({compensation})"
    )]
    CompensationFailure {
        reservation_id: Uuid,
        dispatch: String,
        compensation: String,
    },
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::Validation(_) => "VALIDATION_ERROR",
            TransferError::AccountLookup { .. } => "ACCOUNT_LOOKUP_ERROR",
            TransferError::AccountState { .. } => "ACCOUNT_STATE_ERROR",
            TransferError::RemoteUnavailable { .. } => "REMOTE_UNAVAILABLE",
            TransferError::RemoteRejected { .. } => "REMOTE_REJECTED",
            TransferError::DispatchFailure(_) => "DISPATCH_FAILURE",
            TransferError::CompensationFailure { .. } => "COMPENSATION_FAILURE",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::Validation(_) => 400,
            TransferError::AccountState { .. } => 422,
            TransferError::RemoteRejected { .. } => 502,
            TransferError::RemoteUnavailable { .. } => 503,
            TransferError::AccountLookup { .. }
            | TransferError::DispatchFailure(_)
            | TransferError::CompensationFailure { .. } => 500,
        }
    }

    /// A hold may still exist upstream that was neither fulfilled nor released
    pub fn requires_reconciliation(&self) -> bool {
        matches!(self, TransferError::CompensationFailure { .. })
    }
}

/// One failed attempt at a remote call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteCallError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request could not be built or followed (bad URL, header, redirect)
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl RemoteCallError {
    /// Transport-level failures are worth another attempt; anything the
    /// remote side actually answered is not.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteCallError::Connect(_) | RemoteCallError::Timeout(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteCallError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteCallError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteCallError::Timeout(e.to_string())
        } else if e.is_builder() || e.is_redirect() {
            RemoteCallError::Invalid(e.to_string())
        } else if e.is_connect() || e.is_request() || e.is_body() {
            RemoteCallError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteCallError::Rejected {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RemoteCallError::Malformed(e.to_string())
        }
    }
}

/// Broker-side failure reported by a producer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("producer unavailable: {0}")]
    Unavailable(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}
