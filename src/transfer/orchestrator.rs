//! Transfer Orchestrator
//!
//! Drives one transfer through the saga:
//!
//! 1. Validate the request, then check both accounts are in good standing
//! 2. Place a debit hold on the source account
//! 3. Publish the fulfillment message
//! 4. If publishing fails, release the hold
//!
//! Every step awaits its remote call before the next one starts, so remote
//! mutations never overlap. Once a hold exists the saga always runs to a
//! terminal state.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::adapters::AccountGateway;
use super::dispatcher::MessageDispatcher;
use super::error::{AccountSide, TransferError};
use super::outcome::TransferOutcome;
use super::reservation::ReservationGateway;
use super::state::SagaState;
use super::types::{
    Account, CancellationRequest, FulfillmentMessage, ReservationRecord, ReservationRequest,
    TraceHeaders, TransferRequest, TransferResult,
};
use super::validation::validate_transfer_request;

pub struct TransferOrchestrator {
    accounts: Arc<dyn AccountGateway>,
    reservations: ReservationGateway,
    dispatcher: MessageDispatcher,
}

impl TransferOrchestrator {
    pub fn new(
        accounts: Arc<dyn AccountGateway>,
        reservations: ReservationGateway,
        dispatcher: MessageDispatcher,
    ) -> Self {
        Self {
            accounts,
            reservations,
            dispatcher,
        }
    }

    /// Run the saga to a terminal state
    pub async fn transfer(
        &self,
        headers: &TraceHeaders,
        request: &TransferRequest,
    ) -> TransferOutcome {
        info!(
            request_id = %request.request_id,
            correlation_id = %headers.correlation_id,
            amount = request.amount,
            "Transfer started: {} -> {}", request.from_account, request.to_account
        );

        let mut state = SagaState::Validating;

        let (from, to) = match self.validate(request).await {
            Ok(accounts) => accounts,
            Err(cause) => {
                warn!(
                    request_id = %request.request_id,
                    code = cause.code(),
                    error = %cause,
                    "Transfer rejected before reservation"
                );
                return TransferOutcome::Fatal { cause };
            }
        };

        transition(request, &mut state, SagaState::Reserving);
        let reservation = match self
            .reservations
            .reserve(headers, &ReservationRequest::debit_for(request))
            .await
        {
            Ok(record) => record,
            Err(cause) => {
                error!(
                    request_id = %request.request_id,
                    state = %state,
                    error = %cause,
                    "Reservation failed"
                );
                return TransferOutcome::Fatal { cause };
            }
        };

        if reservation.is_insufficient_funds() {
            transition(request, &mut state, SagaState::InsufficientFundsTerminal);
            info!(
                request_id = %request.request_id,
                running_balance = reservation.running_balance,
                "Transfer declined: insufficient funds"
            );
            return TransferOutcome::Success(TransferResult::insufficient_funds(reservation));
        }

        transition(request, &mut state, SagaState::Dispatching);
        let message = FulfillmentMessage::for_reservation(&reservation, &from, &to, request);
        match self.dispatcher.dispatch(headers, &message).await {
            Ok(()) => {
                transition(request, &mut state, SagaState::Completed);
                info!(
                    request_id = %request.request_id,
                    reservation_id = %reservation.transaction_id,
                    "Transfer completed"
                );
                TransferOutcome::Success(TransferResult::completed(reservation, message))
            }
            Err(dispatch_error) => {
                transition(request, &mut state, SagaState::Compensating);
                self.compensate(headers, request, &mut state, reservation, dispatch_error)
                    .await
            }
        }
    }

    /// Step 0-2: request shape, then source and target account standing.
    /// Any failure here happens before a remote mutation.
    async fn validate(&self, request: &TransferRequest) -> Result<(Account, Account), TransferError> {
        validate_transfer_request(request)?;

        let from = self.fetch_in_good_standing(AccountSide::From, &request.from_account).await?;
        let to = self.fetch_in_good_standing(AccountSide::To, &request.to_account).await?;
        Ok((from, to))
    }

    async fn fetch_in_good_standing(
        &self,
        side: AccountSide,
        account_number: &str,
    ) -> Result<Account, TransferError> {
        let account = self.accounts.fetch(account_number).await?;
        if !account.is_in_good_standing() {
            return Err(TransferError::AccountState {
                side,
                account: account.account_number,
                status: account.lifecycle_status.to_string(),
            });
        }
        debug!(side = %side, account = account_number, "Account in good standing");
        Ok(account)
    }

    /// Release the hold after a failed dispatch. Exactly one cancellation is
    /// attempted (the gateway may retry it internally).
    async fn compensate(
        &self,
        headers: &TraceHeaders,
        request: &TransferRequest,
        state: &mut SagaState,
        reservation: ReservationRecord,
        dispatch_error: TransferError,
    ) -> TransferOutcome {
        let cancellation = CancellationRequest::for_reservation(&reservation, &request.metadata);
        warn!(
            request_id = %request.request_id,
            reservation_id = %reservation.transaction_id,
            error = %dispatch_error,
            "Dispatch failed, cancelling reservation"
        );

        match self.reservations.cancel(headers, &cancellation).await {
            Ok(record) => {
                transition(request, state, SagaState::CompensatedFailure);
                TransferOutcome::Disrupted {
                    partial: TransferResult::failed(reservation, Some(record)),
                    cause: dispatch_error,
                }
            }
            Err(cancel_error) => {
                transition(request, state, SagaState::CompensationFailed);
                error!(
                    request_id = %request.request_id,
                    reservation_id = %reservation.transaction_id,
                    amount = reservation.amount,
                    account = %reservation.account_number,
                    error = %cancel_error,
                    "CRITICAL: reservation could not be cancelled, manual reconciliation required"
                );
                let cause = TransferError::CompensationFailure {
                    reservation_id: reservation.transaction_id,
                    dispatch: dispatch_error.to_string(),
                    compensation: cancel_error.to_string(),
                };
                TransferOutcome::Disrupted {
                    partial: TransferResult::failed(reservation, None),
                    cause,
                }
            }
        }
    }
}

fn transition(request: &TransferRequest, state: &mut SagaState, next: SagaState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal saga transition {} -> {}",
        state,
        next
    );
    debug!(
        request_id = %request.request_id,
        from = %state,
        to = %next,
        holds_funds = next.holds_funds(),
        "Saga state transition"
    );
    *state = next;
}
