//! Controller error types.

use carrier_store::CarrierError;
use thiserror::Error;

/// Error type for controller operations.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Store or validation failure, propagated unmodified.
    #[error(transparent)]
    Carrier(#[from] CarrierError),

    /// The requested action is not valid in the controller's current state
    /// (e.g. submitting while a submit is in flight).
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl AdminError {
    /// The underlying store error, if any.
    pub fn as_carrier_error(&self) -> Option<&CarrierError> {
        match self {
            AdminError::Carrier(e) => Some(e),
            AdminError::InvalidStateTransition(_) => None,
        }
    }
}

/// Result type alias using AdminError.
pub type AdminResult<T> = Result<T, AdminError>;
