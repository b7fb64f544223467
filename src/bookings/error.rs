use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::AuthError;
use crate::error::error_response;
use crate::store::StoreError;

/// Error types for booking operations
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Missing required booking details (propertyId, dates, guests).")]
    MissingField,

    #[error("Invalid date format.")]
    InvalidDate,

    #[error("Check-out date must be after check-in date.")]
    InvalidRange,

    #[error("Number of guests must be at least 1.")]
    InvalidGuestCount,

    #[error("Invalid ID format.")]
    InvalidId,

    #[error("{0}")]
    Validation(String),

    #[error("Property not found.")]
    PropertyNotFound,

    #[error("Number of guests exceeds property capacity of {capacity}.")]
    CapacityExceeded { capacity: i32 },

    #[error("Property is no longer available for the selected dates.")]
    AvailabilityConflict,

    #[error("Booking not found.")]
    NotFound,

    #[error("Unauthorized access to this booking.")]
    Forbidden,

    #[error("{0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Unauthorized(AuthError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::MissingField
            | BookingError::InvalidDate
            | BookingError::InvalidRange
            | BookingError::InvalidGuestCount
            | BookingError::InvalidId
            | BookingError::Validation(_)
            | BookingError::CapacityExceeded { .. } => StatusCode::BAD_REQUEST,
            BookingError::PropertyNotFound | BookingError::NotFound => StatusCode::NOT_FOUND,
            BookingError::AvailabilityConflict | BookingError::InvalidTransition(_) => StatusCode::CONFLICT,
            BookingError::Forbidden => StatusCode::FORBIDDEN,
            BookingError::Unauthorized(err) => err.status_code(),
            BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            BookingError::MissingField => "MISSING_FIELD",
            BookingError::InvalidDate => "INVALID_DATE",
            BookingError::InvalidRange => "INVALID_DATE_RANGE",
            BookingError::InvalidGuestCount => "INVALID_GUEST_COUNT",
            BookingError::InvalidId => "INVALID_ID",
            BookingError::Validation(_) => "VALIDATION_ERROR",
            BookingError::PropertyNotFound => "PROPERTY_NOT_FOUND",
            BookingError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            BookingError::AvailabilityConflict => "AVAILABILITY_CONFLICT",
            BookingError::NotFound => "NOT_FOUND",
            BookingError::Forbidden => "FORBIDDEN",
            BookingError::InvalidTransition(_) => "INVALID_TRANSITION",
            BookingError::Unauthorized(err) => err.error_code(),
            BookingError::Store(_) => "SERVER_ERROR",
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => BookingError::AvailabilityConflict,
            StoreError::BookingNotFound(_) => BookingError::NotFound,
            other => BookingError::Store(other),
        }
    }
}

impl From<AuthError> for BookingError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions { .. } => BookingError::Forbidden,
            other => BookingError::Unauthorized(other),
        }
    }
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        BookingError::Validation(if message.is_empty() {
            "Validation failed".to_string()
        } else {
            message
        })
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        if let BookingError::Unauthorized(err) = self {
            return err.into_response();
        }

        let status = self.status_code();
        let message = match &self {
            BookingError::Store(err) => {
                tracing::error!("Booking store error: {}", err);
                "Server error.".to_string()
            }
            BookingError::AvailabilityConflict => {
                tracing::warn!("Booking rejected: {}", self);
                self.to_string()
            }
            other => other.to_string(),
        };

        error_response(status, self.error_code(), message)
    }
}
