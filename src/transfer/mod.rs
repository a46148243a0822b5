//! Funds Transfer Saga
//!
//! Moves funds between two accounts in cooperation with an external
//! reservation (ledger) service and an asynchronous fulfillment broker.
//!
//! # State Machine
//!
//! ```text
//! VALIDATING → RESERVING → INSUFFICIENT_FUNDS_TERMINAL
//!                  ↓
//!             DISPATCHING → COMPLETED
//!                  ↓
//!             COMPENSATING → COMPENSATED_FAILURE | COMPENSATION_FAILED
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Reserve-Before-Dispatch**: no fulfillment message without a successful hold
//! 2. **Compensate-On-Dispatch-Failure**: a failed dispatch triggers exactly one cancellation
//! 3. **Idempotency**: the request id keys the hold, the hold's transaction id keys the message
//! 4. **No Silent Loss**: every failure after a hold carries the records actually applied

pub mod adapters;
pub mod api;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod reservation;
pub mod retry;
pub mod state;
pub mod types;
pub mod validation;


// Re-exports for convenience
pub use api::{TransferFundsRequest, TransferFundsResponse};
pub use dispatcher::MessageDispatcher;
pub use error::{BrokerError, RemoteCallError, TransferError};
pub use orchestrator::TransferOrchestrator;
pub use outcome::TransferOutcome;
pub use reservation::ReservationGateway;
pub use retry::{RetryError, RetryPolicy};
pub use state::SagaState;
pub use types::{
    Account, CancellationRequest, FulfillmentMessage, LifecycleStatus, ReservationOutcome,
    ReservationRecord, ReservationRequest, TraceHeaders, TransferRequest, TransferResult,
    TransferStatus,
};
