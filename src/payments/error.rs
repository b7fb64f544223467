use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::AuthError;
use crate::error::error_response;
use crate::payments::provider::ProviderError;
use crate::store::StoreError;

/// Error types for checkout and payment reconciliation
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("{0}")]
    MissingField(&'static str),

    #[error("Invalid payment reference.")]
    InvalidReference,

    #[error("Invalid ID format.")]
    InvalidId,

    #[error("Booking not found.")]
    BookingNotFound,

    #[error("Payment record not found.")]
    PaymentRecordNotFound,

    #[error("Unauthorized access to this booking.")]
    Forbidden,

    #[error("{0}")]
    InvalidBookingState(String),

    #[error("Payment verification failed: transaction status is {0}.")]
    VerificationFailed(String),

    #[error("Payment provider did not respond in time. Please retry.")]
    ProviderTimeout,

    #[error("Payment provider error: {0}")]
    Provider(ProviderError),

    #[error(transparent)]
    Unauthorized(AuthError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::MissingField(_)
            | PaymentError::InvalidReference
            | PaymentError::InvalidId
            | PaymentError::VerificationFailed(_) => StatusCode::BAD_REQUEST,
            PaymentError::BookingNotFound | PaymentError::PaymentRecordNotFound => StatusCode::NOT_FOUND,
            PaymentError::Forbidden => StatusCode::FORBIDDEN,
            PaymentError::InvalidBookingState(_) => StatusCode::CONFLICT,
            PaymentError::ProviderTimeout => StatusCode::GATEWAY_TIMEOUT,
            PaymentError::Provider(_) => StatusCode::BAD_GATEWAY,
            PaymentError::Unauthorized(err) => err.status_code(),
            PaymentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PaymentError::MissingField(_) => "MISSING_FIELD",
            PaymentError::InvalidReference => "INVALID_REFERENCE",
            PaymentError::InvalidId => "INVALID_ID",
            PaymentError::BookingNotFound => "BOOKING_NOT_FOUND",
            PaymentError::PaymentRecordNotFound => "PAYMENT_NOT_FOUND",
            PaymentError::Forbidden => "FORBIDDEN",
            PaymentError::InvalidBookingState(_) => "INVALID_BOOKING_STATE",
            PaymentError::VerificationFailed(_) => "PAYMENT_VERIFICATION_FAILED",
            PaymentError::ProviderTimeout => "PROVIDER_TIMEOUT",
            PaymentError::Provider(_) => "PROVIDER_ERROR",
            PaymentError::Unauthorized(err) => err.error_code(),
            PaymentError::Store(_) => "SERVER_ERROR",
        }
    }
}

impl From<StoreError> for PaymentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BookingNotFound(_) => PaymentError::BookingNotFound,
            StoreError::PaymentNotFound { .. } => PaymentError::PaymentRecordNotFound,
            StoreError::Conflict => {
                PaymentError::InvalidBookingState("Booking can no longer be confirmed.".to_string())
            }
            other => PaymentError::Store(other),
        }
    }
}

impl From<ProviderError> for PaymentError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout => PaymentError::ProviderTimeout,
            other => PaymentError::Provider(other),
        }
    }
}

impl From<AuthError> for PaymentError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions { .. } => PaymentError::Forbidden,
            other => PaymentError::Unauthorized(other),
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        if let PaymentError::Unauthorized(err) = self {
            return err.into_response();
        }

        let status = self.status_code();
        let message = match &self {
            PaymentError::Store(err) => {
                tracing::error!("Payment store error: {}", err);
                "Server error.".to_string()
            }
            PaymentError::Provider(err) => {
                tracing::error!("Payment provider error: {}", err);
                "Payment provider error. Please try again later.".to_string()
            }
            PaymentError::ProviderTimeout => {
                tracing::warn!("Payment provider timed out");
                self.to_string()
            }
            other => other.to_string(),
        };

        error_response(status, self.error_code(), message)
    }
}
