//! Service Adapters
//!
//! Seams between the saga and its collaborators: the account store, the
//! reservation service and the fulfillment broker. Reservation calls must be
//! idempotent on the server side by `request_id`.

pub mod account;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod reservation;

pub use account::PgAccountGateway;
#[cfg(feature = "kafka")]
pub use kafka::KafkaProducer;
pub use reservation::HttpReservationClient;

use async_trait::async_trait;

use super::error::{BrokerError, RemoteCallError, TransferError};
use super::types::{
    Account, CancellationRequest, ReservationRecord, ReservationRequest, TraceHeaders,
};

/// Single-shot account status read. Never retried.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Fails with `TransferError::AccountLookup` on any data-access error
    async fn fetch(&self, account_number: &str) -> Result<Account, TransferError>;
}

/// One attempt at a reservation service call
///
/// Retry is applied by `ReservationGateway`, not here.
#[async_trait]
pub trait ReservationClient: Send + Sync {
    /// Place a debit hold. `INSUFFICIENT_FUNDS` is an `Ok` record.
    async fn reserve(
        &self,
        headers: &TraceHeaders,
        request: &ReservationRequest,
    ) -> Result<ReservationRecord, RemoteCallError>;

    /// Release a previously placed hold
    async fn cancel(
        &self,
        headers: &TraceHeaders,
        request: &CancellationRequest,
    ) -> Result<ReservationRecord, RemoteCallError>;
}

/// Publishes an already serialized message and waits for the broker ack
#[async_trait]
pub trait BrokerProducer: Send + Sync {
    async fn produce(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), BrokerError>;
}


#[cfg(test)]
pub use mock::{Journal, MockAccountGateway, MockBrokerProducer, MockReservationClient};
