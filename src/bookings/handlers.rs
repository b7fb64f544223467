// HTTP handlers for booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::bookings::{
    AvailabilityQuery, AvailabilityResponse, Booking, BookingError, BookingWithProperty,
    CreateBookingRequest,
};
use crate::error::{ApiResponse, ErrorResponse};
use crate::extract::ApiJson;
use crate::validation::parse_id;

fn path_id(raw: &str) -> Result<Uuid, BookingError> {
    parse_id(raw).ok_or(BookingError::InvalidId)
}

/// Handler for POST /bookings
/// Creates a pending booking for the authenticated guest
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created; body is `{success, data: Booking}`", body = Booking),
        (status = 400, description = "Invalid booking details", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
        (status = 409, description = "Dates no longer available", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn create_booking_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), BookingError> {
    let booking = state
        .booking_service
        .create_booking(user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(booking))))
}

/// Handler for GET /bookings
/// Lists the authenticated guest's bookings, newest first
#[utoipa::path(
    get,
    path = "/bookings",
    responses(
        (status = 200, description = "Bookings with property details", body = Vec<BookingWithProperty>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn list_bookings_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<BookingWithProperty>>>, BookingError> {
    let bookings = state.booking_service.list_for_guest(user.user_id).await?;
    Ok(Json(ApiResponse::ok(bookings)))
}

/// Handler for GET /bookings/{id}
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking with property details", body = BookingWithProperty),
        (status = 403, description = "Booking belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn get_booking_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingWithProperty>>, BookingError> {
    let booking = state
        .booking_service
        .get_booking(path_id(&id)?, user.user_id)
        .await?;

    Ok(Json(ApiResponse::ok(booking)))
}

/// Handler for DELETE /bookings/{id}
/// Cancels the booking; nothing is deleted
#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 403, description = "Booking belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Booking can no longer be cancelled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn cancel_booking_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, BookingError> {
    let booking = state
        .booking_service
        .cancel_booking(path_id(&id)?, user.user_id)
        .await?;

    Ok(Json(ApiResponse::with_message(booking, "Booking cancelled.")))
}

/// Handler for GET /properties/{id}/availability
#[utoipa::path(
    get,
    path = "/properties/{id}/availability",
    params(
        ("id" = String, Path, description = "Property ID"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Availability for the range", body = AvailabilityResponse),
        (status = 400, description = "Missing or invalid dates", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn availability_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<ApiResponse<AvailabilityResponse>>, BookingError> {
    let is_available = state
        .booking_service
        .check_availability(
            path_id(&id)?,
            query.check_in_date.as_deref(),
            query.check_out_date.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::ok(AvailabilityResponse { is_available })))
}

/// Handler for GET /hosts/bookings
/// Lists bookings on every property the authenticated host owns
#[utoipa::path(
    get,
    path = "/hosts/bookings",
    responses(
        (status = 200, description = "Bookings on the host's properties", body = Vec<BookingWithProperty>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not a host", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn host_bookings_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<BookingWithProperty>>>, BookingError> {
    user.require_role(Role::Host)?;

    let bookings = state.booking_service.list_for_host(user.user_id).await?;
    Ok(Json(ApiResponse::ok(bookings)))
}
