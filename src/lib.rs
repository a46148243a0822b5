//! Funds Transfer - saga-based transfer service
//!
//! Moves funds between two accounts by placing a debit hold with the ledger's
//! reservation service and publishing a fulfillment message to a broker,
//! releasing the hold if the message cannot be delivered.
//!
//! # Modules
//!
//! - [`transfer`] - Saga orchestrator, gateways, adapters and domain types
//! - [`gateway`] - axum HTTP surface (`POST /TransferFunds`, `GET /health`)
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod gateway;
pub mod logging;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use transfer::{
    TraceHeaders, TransferError, TransferOrchestrator, TransferOutcome, TransferRequest,
    TransferResult,
};
