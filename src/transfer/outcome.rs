//! Transfer Outcome
//!
//! What the saga hands back to its caller. A failed transfer still carries
//! the result built so far, so the caller can see exactly which remote
//! mutations happened.

use super::error::TransferError;
use super::state::SagaState;
use super::types::{TransferResult, TransferStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Saga finished without error: COMPLETED or INSUFFICIENT_FUNDS_TERMINAL
    Success(TransferResult),

    /// A hold was placed and the transfer then failed
    Disrupted {
        partial: TransferResult,
        cause: TransferError,
    },

    /// Failed before any hold was placed
    Fatal { cause: TransferError },
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success(_))
    }

    /// The full or partial result, if any remote mutation happened
    pub fn result(&self) -> Option<&TransferResult> {
        match self {
            TransferOutcome::Success(result) => Some(result),
            TransferOutcome::Disrupted { partial, .. } => Some(partial),
            TransferOutcome::Fatal { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&TransferError> {
        match self {
            TransferOutcome::Success(_) => None,
            TransferOutcome::Disrupted { cause, .. } | TransferOutcome::Fatal { cause } => {
                Some(cause)
            }
        }
    }

    /// Terminal saga state, `None` when the saga aborted before reserving funds
    pub fn terminal_state(&self) -> Option<SagaState> {
        match self {
            TransferOutcome::Success(result) => match result.status {
                TransferStatus::InsufficientFunds => Some(SagaState::InsufficientFundsTerminal),
                _ => Some(SagaState::Completed),
            },
            TransferOutcome::Disrupted { cause, .. } if cause.requires_reconciliation() => {
                Some(SagaState::CompensationFailed)
            }
            TransferOutcome::Disrupted { .. } => Some(SagaState::CompensatedFailure),
            TransferOutcome::Fatal { .. } => None,
        }
    }

    /// Whether the caller may resubmit the transfer under a new request id.
    ///
    /// Not safe when a hold may still be active upstream.
    pub fn is_retry_safe(&self) -> bool {
        match self {
            TransferOutcome::Success(_) => false,
            TransferOutcome::Disrupted { cause, .. } => !cause.requires_reconciliation(),
            TransferOutcome::Fatal { cause } => !matches!(
                cause,
                TransferError::RemoteUnavailable { .. } | TransferError::RemoteRejected { .. }
            ),
        }
    }
}
