use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Booking status enum representing the lifecycle of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    /// Reserved for host rejection; nothing sets it yet
    Declined,
}

impl BookingStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::Declined => "declined",
        }
    }

    /// Blocking statuses count against a property's availability
    pub fn is_blocking(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state as recorded on the booking itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingPaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

impl BookingPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingPaymentStatus::Pending => "pending",
            BookingPaymentStatus::Paid => "paid",
            BookingPaymentStatus::Refunded => "refunded",
            BookingPaymentStatus::Failed => "failed",
        }
    }

    /// Payment state a booking moves to when it is cancelled.
    /// Only money already taken is marked for refund; issuing it happens elsewhere.
    pub fn after_cancellation(self) -> Self {
        match self {
            BookingPaymentStatus::Paid => BookingPaymentStatus::Refunded,
            other => other,
        }
    }
}

impl Default for BookingPaymentStatus {
    fn default() -> Self {
        BookingPaymentStatus::Pending
    }
}

impl std::fmt::Display for BookingPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Property as seen by the booking core (read-only)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    /// Nightly rate
    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "50.00")]
    pub price: Decimal,
    /// Maximum number of guests
    pub capacity: i32,
    pub location: Option<String>,
    pub image_urls: Vec<String>,
}

/// Property display fields joined into booking listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: Uuid,
    pub title: String,
    pub image_urls: Vec<String>,
    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "50.00")]
    pub price: Decimal,
    pub location: Option<String>,
}

impl From<&Property> for PropertySummary {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id,
            title: property.title.clone(),
            image_urls: property.image_urls.clone(),
            price: property.price,
            location: property.location.clone(),
        }
    }
}

/// Domain model representing a booking in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub check_in_date: DateTime<Utc>,
    pub check_out_date: DateTime<Utc>,
    pub number_of_guests: i32,
    /// Decimal string, e.g. `"150.00"`
    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "150.00")]
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub payment_status: BookingPaymentStatus,
    pub guest_message: Option<String>,
    pub owner_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking joined with its property's display fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithProperty {
    #[serde(flatten)]
    pub booking: Booking,
    pub property: PropertySummary,
}

/// Values for a booking insert; everything here is server-derived
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub check_in_date: DateTime<Utc>,
    pub check_out_date: DateTime<Utc>,
    pub number_of_guests: i32,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub payment_status: BookingPaymentStatus,
    pub guest_message: Option<String>,
}

/// Request DTO for creating a booking
///
/// Every field is optional at the wire level so missing input is reported
/// as a validation error rather than a body rejection. Identity and price
/// are never read from here.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[schema(example = "5d0c7b9e-2f43-4c55-9a7a-0b8f2a1f1c11")]
    pub property_id: Option<String>,
    #[schema(example = "2024-06-01")]
    pub check_in_date: Option<String>,
    #[schema(example = "2024-06-04")]
    pub check_out_date: Option<String>,
    #[schema(example = 2)]
    pub number_of_guests: Option<i64>,
    #[validate(length(max = 1000, message = "Guest message cannot be more than 1000 characters"))]
    pub guest_message: Option<String>,
}

/// Query parameters for the availability check
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// Requested check-in date (inclusive)
    pub check_in_date: Option<String>,
    /// Requested check-out date (exclusive)
    pub check_out_date: Option<String>,
}

/// Response DTO for the availability check
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub is_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_statuses() {
        assert!(BookingStatus::Pending.is_blocking());
        assert!(BookingStatus::Confirmed.is_blocking());
        assert!(!BookingStatus::Cancelled.is_blocking());
        assert!(!BookingStatus::Completed.is_blocking());
        assert!(!BookingStatus::Declined.is_blocking());
    }

    #[test]
    fn test_cancellation_refunds_only_paid() {
        assert_eq!(BookingPaymentStatus::Paid.after_cancellation(), BookingPaymentStatus::Refunded);
        assert_eq!(BookingPaymentStatus::Pending.after_cancellation(), BookingPaymentStatus::Pending);
        assert_eq!(BookingPaymentStatus::Failed.after_cancellation(), BookingPaymentStatus::Failed);
        assert_eq!(BookingPaymentStatus::Refunded.after_cancellation(), BookingPaymentStatus::Refunded);
    }

    #[test]
    fn test_create_request_ignores_client_identity_and_price() {
        let request: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "propertyId": "5d0c7b9e-2f43-4c55-9a7a-0b8f2a1f1c11",
            "checkInDate": "2024-06-01",
            "checkOutDate": "2024-06-04",
            "numberOfGuests": 2,
            "guestId": "00000000-0000-0000-0000-000000000000",
            "totalPrice": 1
        }))
        .unwrap();

        assert_eq!(request.number_of_guests, Some(2));
        assert_eq!(request.check_in_date.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_booking_serializes_camel_case_with_lowercase_status() {
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            guest_id: Uuid::new_v4(),
            check_in_date: now,
            check_out_date: now + chrono::Duration::days(1),
            number_of_guests: 1,
            total_price: Decimal::from(50),
            status: BookingStatus::Pending,
            payment_status: BookingPaymentStatus::Pending,
            guest_message: None,
            owner_message: None,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["paymentStatus"], "pending");
        assert!(value.get("checkInDate").is_some());
        assert!(value.get("numberOfGuests").is_some());
    }
}
