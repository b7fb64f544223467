use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::bookings::models::Booking;

/// Status of the payment record kept for a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment record; at most one exists per booking
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub guest_id: Uuid,
    pub property_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "150.00")]
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub provider_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values written when a checkout is initialized
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub booking_id: Uuid,
    pub guest_id: Uuid,
    pub property_id: Uuid,
    pub amount: Decimal,
    pub provider_reference: String,
}

/// Request DTO for POST /checkout
///
/// Only the booking id is read. The amount charged is always the booking's
/// stored total, so any client-sent amount is ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub booking_id: Option<String>,
}

/// Request DTO for POST /verify-payment
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub booking_id: Option<String>,
    pub reference: Option<String>,
}

/// Hosted payment page handed back to the client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Response DTO for POST /checkout: `{ "status": "success", "data": ... }`
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub status: String,
    pub data: CheckoutSession,
}

impl CheckoutResponse {
    pub fn success(data: CheckoutSession) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// Records written by a successful reconciliation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub booking: Booking,
    pub payment: Payment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_ignores_amount() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "bookingId": "8e0b1b1e-8c3c-4a55-9b1f-5b8cb6cf5a01",
            "amount": 1
        }))
        .unwrap();
        assert_eq!(
            request.booking_id.as_deref(),
            Some("8e0b1b1e-8c3c-4a55-9b1f-5b8cb6cf5a01")
        );
    }

    #[test]
    fn test_checkout_response_shape() {
        let response = CheckoutResponse::success(CheckoutSession {
            authorization_url: "https://checkout.paystack.com/abc".to_string(),
            access_code: "abc".to_string(),
            reference: "BKG_1_2".to_string(),
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["authorizationUrl"], "https://checkout.paystack.com/abc");
        assert_eq!(value["data"]["accessCode"], "abc");
    }
}
