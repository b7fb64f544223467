// HTTP handlers for checkout and payment verification

use axum::{extract::State, Json};

use crate::auth::AuthenticatedUser;
use crate::error::{ApiResponse, ErrorResponse};
use crate::extract::ApiJson;
use crate::payments::{
    CheckoutRequest, CheckoutResponse, PaymentError, ReconciliationResult, VerifyPaymentRequest,
};

/// Handler for POST /checkout
/// Opens a hosted payment page for the guest's pending booking
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout opened", body = CheckoutResponse),
        (status = 400, description = "Missing or invalid booking ID", body = ErrorResponse),
        (status = 403, description = "Caller may not pay for this booking", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Booking is not awaiting payment", body = ErrorResponse),
        (status = 502, description = "Payment provider error", body = ErrorResponse),
        (status = 504, description = "Payment provider timed out", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn checkout_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, PaymentError> {
    let session = state
        .payment_service
        .initialize_checkout(&user, request)
        .await?;

    Ok(Json(CheckoutResponse::success(session)))
}

/// Handler for POST /verify-payment
/// Confirms the booking once the provider reports the payment successful
#[utoipa::path(
    post,
    path = "/verify-payment",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Booking confirmed; body is `{success, data}`", body = ReconciliationResult),
        (status = 400, description = "Missing fields or payment not successful", body = ErrorResponse),
        (status = 403, description = "Booking belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Booking or payment record not found", body = ErrorResponse),
        (status = 502, description = "Payment provider error", body = ErrorResponse),
        (status = 504, description = "Payment provider timed out; retry", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn verify_payment_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<ReconciliationResult>>, PaymentError> {
    let result = state.payment_service.verify(&user, request).await?;

    Ok(Json(ApiResponse::with_message(
        result,
        "Payment verified and booking confirmed.",
    )))
}
