//! Request validation
//!
//! Run by the inbound API and again by the orchestrator, so internal callers
//! cannot bypass it.

use super::error::TransferError;
use super::types::TransferRequest;

/// Shortest metadata accepted, in characters; an empty JSON document is `{}`
pub const MIN_METADATA_LEN: usize = 2;

pub fn validate_transfer_request(request: &TransferRequest) -> Result<(), TransferError> {
    if request.request_id.is_nil() {
        return Err(TransferError::Validation(
            "requestUuid must not be nil".into(),
        ));
    }

    if request.from_account.trim().is_empty() {
        return Err(TransferError::Validation(
            "fromAccountNumber is required".into(),
        ));
    }

    if request.to_account.trim().is_empty() {
        return Err(TransferError::Validation(
            "toAccountNumber is required".into(),
        ));
    }

    if request.amount <= 0 {
        return Err(TransferError::Validation(format!(
            "transactionAmount must be positive, got {}",
            request.amount
        )));
    }

    if request.metadata.chars().count() < MIN_METADATA_LEN {
        return Err(TransferError::Validation(
            "transactionJsonMetaData is required".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::types::fixtures::transfer_request;
    use uuid::Uuid;

    #[test]
    fn test_valid_request() {
        assert!(validate_transfer_request(&transfer_request(1)).is_ok());
    }

    #[test]
    fn test_amount_must_be_positive() {
        for amount in [0, -1, i64::MIN] {
            let err = validate_transfer_request(&transfer_request(amount)).unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR");
        }
    }

    #[test]
    fn test_missing_fields() {
        let mut req = transfer_request(10);
        req.request_id = Uuid::nil();
        assert!(validate_transfer_request(&req).is_err());

        let mut req = transfer_request(10);
        req.from_account = "  ".into();
        assert!(validate_transfer_request(&req).is_err());

        let mut req = transfer_request(10);
        req.to_account = String::new();
        assert!(validate_transfer_request(&req).is_err());

        let mut req = transfer_request(10);
        req.metadata = "x".into();
        assert!(validate_transfer_request(&req).is_err());
    }

    #[test]
    fn test_metadata_length_counts_characters() {
        // Two bytes of UTF-8 but a single character
        let mut req = transfer_request(10);
        req.metadata = "é".into();
        assert!(validate_transfer_request(&req).is_err());

        req.metadata = "éé".into();
        assert!(validate_transfer_request(&req).is_ok());
    }

    #[test]
    fn test_same_account_allowed() {
        // The ledger decides whether a self-transfer is meaningful
        let mut req = transfer_request(10);
        req.to_account = req.from_account.clone();
        assert!(validate_transfer_request(&req).is_ok());
    }
}
