use std::time::Duration;

use thiserror::Error;

/// Message returned when any of the three top-level request fields is absent.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: paymentData, type, contactId";

/// Message returned when `type` is neither `card` nor `ach`.
pub const INVALID_TYPE_MESSAGE: &str = "Invalid payment type";

/// Errors returned by a tokenization request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The inbound request is missing fields or carries an unknown payment type.
    #[error("{0}")]
    Validation(String),

    /// The tokenization provider answered but refused the payment method.
    #[error("tokenization rejected: {0}")]
    Provider(String),

    /// Transport failure, timeout, or a response we could not interpret.
    #[error("{0}")]
    Internal(String),
}

impl RelayError {
    pub fn missing_fields() -> Self {
        RelayError::Validation(MISSING_FIELDS_MESSAGE.to_string())
    }

    pub fn invalid_type() -> Self {
        RelayError::Validation(INVALID_TYPE_MESSAGE.to_string())
    }
}

/// Errors from the CRM lead update. Never fatal to a tokenization.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("CRM request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("CRM request failed: {0}")]
    Transport(String),

    #[error("CRM rejected update with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
