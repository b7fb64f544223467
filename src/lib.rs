// Booking core for a vacation-rental marketplace: pricing, availability,
// booking lifecycle and payment reconciliation behind an axum API

pub mod auth;
pub mod bookings;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod payments;
pub mod store;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::TokenService;
use bookings::BookingService;
use config::AppConfig;
use payments::{PaymentProvider, PaymentService};
use store::Stores;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        bookings::create_booking_handler,
        bookings::list_bookings_handler,
        bookings::get_booking_handler,
        bookings::cancel_booking_handler,
        bookings::availability_handler,
        bookings::host_bookings_handler,
        payments::checkout_handler,
        payments::verify_payment_handler,
    ),
    components(schemas(
        bookings::Booking,
        bookings::BookingStatus,
        bookings::BookingPaymentStatus,
        bookings::BookingWithProperty,
        bookings::PropertySummary,
        bookings::CreateBookingRequest,
        bookings::AvailabilityResponse,
        payments::Payment,
        payments::PaymentStatus,
        payments::CheckoutRequest,
        payments::CheckoutSession,
        payments::CheckoutResponse,
        payments::VerifyPaymentRequest,
        payments::ReconciliationResult,
        error::ErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "bookings", description = "Booking lifecycle and availability endpoints"),
        (name = "payments", description = "Checkout and payment reconciliation endpoints")
    ),
    info(
        title = "Stay Booking API",
        version = "0.1.0",
        description = "Booking and payment core for a vacation-rental marketplace"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub booking_service: BookingService,
    pub payment_service: PaymentService,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        stores: &Stores,
        provider: Arc<dyn PaymentProvider>,
        tokens: Arc<TokenService>,
        provider_timeout: Duration,
        app_url: String,
    ) -> Self {
        Self {
            booking_service: BookingService::new(stores),
            payment_service: PaymentService::new(stores, provider, provider_timeout, app_url),
            tokens,
        }
    }

    pub fn from_config(stores: &Stores, provider: Arc<dyn PaymentProvider>, config: &AppConfig) -> Self {
        Self::new(
            stores,
            provider,
            Arc::new(TokenService::new(&config.jwt_secret)),
            config.provider_timeout,
            config.app_url.clone(),
        )
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds tracing and CORS middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route(
            "/bookings",
            post(bookings::create_booking_handler).get(bookings::list_bookings_handler),
        )
        .route(
            "/bookings/:id",
            get(bookings::get_booking_handler).delete(bookings::cancel_booking_handler),
        )
        .route("/properties/:id/availability", get(bookings::availability_handler))
        .route("/hosts/bookings", get(bookings::host_bookings_handler))
        .route("/checkout", post(payments::checkout_handler))
        .route("/verify-payment", post(payments::verify_payment_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod test_support;
