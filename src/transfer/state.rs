//! Transfer Saga State Definitions
//!
//! ```text
//! VALIDATING → RESERVING → INSUFFICIENT_FUNDS_TERMINAL
//!                  ↓
//!             DISPATCHING → COMPLETED
//!                  ↓
//!             COMPENSATING → COMPENSATED_FAILURE
//!                  ↓
//!             COMPENSATION_FAILED
//! ```

use std::fmt;

/// Transfer saga states
///
/// Terminal states: INSUFFICIENT_FUNDS_TERMINAL, COMPLETED,
/// COMPENSATED_FAILURE, COMPENSATION_FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SagaState {
    /// Initial state - request and both accounts being checked
    Validating,

    /// Debit hold requested from the reservation service
    Reserving,

    /// Terminal: the ledger refused the hold, nothing to undo
    InsufficientFundsTerminal,

    /// Hold placed, fulfillment message being published
    /// CRITICAL: funds are held upstream from here on
    Dispatching,

    /// Terminal: hold placed and fulfillment message acknowledged
    Completed,

    /// Dispatch failed, releasing the hold
    Compensating,

    /// Terminal: hold released after a dispatch failure
    CompensatedFailure,

    /// Terminal: hold could not be released, needs reconciliation
    CompensationFailed,
}

impl SagaState {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::InsufficientFundsTerminal
                | SagaState::Completed
                | SagaState::CompensatedFailure
                | SagaState::CompensationFailed
        )
    }

    /// Check if a debit hold exists upstream in this state
    #[inline]
    pub fn holds_funds(&self) -> bool {
        matches!(
            self,
            SagaState::Dispatching
                | SagaState::Completed
                | SagaState::Compensating
                | SagaState::CompensationFailed
        )
    }

    pub fn can_transition_to(&self, next: SagaState) -> bool {
        use SagaState::*;
        matches!(
            (self, next),
            (Validating, Reserving)
                | (Reserving, InsufficientFundsTerminal)
                | (Reserving, Dispatching)
                | (Dispatching, Completed)
                | (Dispatching, Compensating)
                | (Compensating, CompensatedFailure)
                | (Compensating, CompensationFailed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Validating => "VALIDATING",
            SagaState::Reserving => "RESERVING",
            SagaState::InsufficientFundsTerminal => "INSUFFICIENT_FUNDS_TERMINAL",
            SagaState::Dispatching => "DISPATCHING",
            SagaState::Completed => "COMPLETED",
            SagaState::Compensating => "COMPENSATING",
            SagaState::CompensatedFailure => "COMPENSATED_FAILURE",
            SagaState::CompensationFailed => "COMPENSATION_FAILED",
        }
    }
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
