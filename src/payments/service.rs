use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::bookings::BookingStatus;
use crate::payments::provider::{
    InitializePayload, PaymentProvider, ProviderError, TransactionStatus,
};
use crate::payments::{
    CheckoutRequest, CheckoutSession, NewPayment, PaymentError, ReconciliationResult,
    VerifyPaymentRequest,
};
use crate::store::{BookingRepository, PaymentRepository, Stores};
use crate::validation::{is_valid_provider_reference, non_blank, parse_id};

/// Provider reference for a checkout attempt: `BKG_<booking id>_<unix millis>`
pub fn generate_reference(booking_id: Uuid, now: DateTime<Utc>) -> String {
    format!("BKG_{}_{}", booking_id.simple(), now.timestamp_millis())
}

/// Amount in minor currency units, or `None` if it does not fit an `i64`
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64()
}

/// Service for checkout initialization and payment reconciliation
#[derive(Clone)]
pub struct PaymentService {
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    provider: Arc<dyn PaymentProvider>,
    provider_timeout: Duration,
    app_url: String,
}

impl PaymentService {
    pub fn new(
        stores: &Stores,
        provider: Arc<dyn PaymentProvider>,
        provider_timeout: Duration,
        app_url: String,
    ) -> Self {
        Self {
            bookings: stores.bookings.clone(),
            payments: stores.payments.clone(),
            provider,
            provider_timeout,
            app_url,
        }
    }

    /// Run a provider call under the configured deadline
    async fn bounded<T, F>(&self, call: F) -> Result<T, PaymentError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PaymentError::ProviderTimeout),
        }
    }

    /// Open a hosted checkout for the guest's pending booking
    ///
    /// The amount charged is the booking's stored total. Retrying checkout
    /// updates the booking's single payment record with the new reference.
    pub async fn initialize_checkout(
        &self,
        user: &AuthenticatedUser,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        user.require_role(Role::Guest)?;

        let raw_id = non_blank(request.booking_id.as_deref())
            .ok_or(PaymentError::MissingField("Booking ID is required."))?;
        let booking_id = parse_id(raw_id).ok_or(PaymentError::InvalidId)?;

        let booking = self
            .bookings
            .find_booking(booking_id)
            .await?
            .ok_or(PaymentError::BookingNotFound)?;

        if booking.guest_id != user.user_id {
            tracing::warn!("User {} attempted checkout for booking {}", user.user_id, booking_id);
            return Err(PaymentError::Forbidden);
        }
        if booking.status != BookingStatus::Pending {
            return Err(PaymentError::InvalidBookingState(format!(
                "Booking is {} and cannot be paid.",
                booking.status
            )));
        }

        let amount_minor = to_minor_units(booking.total_price).ok_or_else(|| {
            PaymentError::InvalidBookingState("Booking total cannot be charged.".to_string())
        })?;
        let reference = generate_reference(booking_id, Utc::now());

        tracing::debug!("Initializing checkout {} for booking {}", reference, booking_id);
        let session = self
            .bounded(self.provider.initialize(InitializePayload {
                email: user.email.clone(),
                amount_minor,
                reference,
                callback_url: format!("{}/bookings/{}?payment=success", self.app_url, booking_id),
                metadata: json!({
                    "bookingId": booking_id,
                    "guestId": booking.guest_id,
                    "propertyId": booking.property_id,
                }),
            }))
            .await?;

        self.payments
            .upsert_for_booking(NewPayment {
                booking_id,
                guest_id: booking.guest_id,
                property_id: booking.property_id,
                amount: booking.total_price,
                provider_reference: session.reference.clone(),
            })
            .await?;

        tracing::info!("Checkout {} opened for booking {}", session.reference, booking_id);
        Ok(CheckoutSession {
            authorization_url: session.authorization_url,
            access_code: session.access_code,
            reference: session.reference,
        })
    }

    /// Confirm a booking once the provider reports its payment successful
    ///
    /// The booking and payment change together or not at all. A provider
    /// timeout is reported as retryable and leaves both records untouched.
    pub async fn verify(
        &self,
        user: &AuthenticatedUser,
        request: VerifyPaymentRequest,
    ) -> Result<ReconciliationResult, PaymentError> {
        let (Some(raw_id), Some(reference)) = (
            non_blank(request.booking_id.as_deref()),
            non_blank(request.reference.as_deref()),
        ) else {
            return Err(PaymentError::MissingField(
                "Booking ID and payment reference are required.",
            ));
        };
        if !is_valid_provider_reference(reference) {
            return Err(PaymentError::InvalidReference);
        }
        let booking_id = parse_id(raw_id).ok_or(PaymentError::InvalidId)?;

        let booking = self
            .bookings
            .find_booking(booking_id)
            .await?
            .ok_or(PaymentError::BookingNotFound)?;
        if booking.guest_id != user.user_id {
            tracing::warn!("User {} attempted to verify booking {}", user.user_id, booking_id);
            return Err(PaymentError::Forbidden);
        }

        let payment = self
            .payments
            .find_by_booking(booking_id)
            .await?
            .filter(|p| p.provider_reference == reference)
            .ok_or(PaymentError::PaymentRecordNotFound)?;

        tracing::debug!("Verifying payment {} for booking {}", payment.provider_reference, booking_id);
        let verified = self.bounded(self.provider.verify(reference)).await?;
        if verified.status != TransactionStatus::Success {
            tracing::warn!(
                "Payment {} for booking {} not successful: {}",
                reference,
                booking_id,
                verified.status
            );
            tracing::debug!("Provider payload for {}: {}", reference, verified.raw);
            return Err(PaymentError::VerificationFailed(verified.status.to_string()));
        }

        let (booking, payment) = self.payments.confirm(booking_id, reference).await.map_err(|err| {
            tracing::error!("Reconciliation of booking {} failed: {}", booking_id, err);
            PaymentError::from(err)
        })?;

        tracing::info!("Booking {} confirmed by payment {}", booking.id, payment.provider_reference);
        Ok(ReconciliationResult { booking, payment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::bookings::{BookingPaymentStatus, BookingService, CreateBookingRequest};
    use crate::payments::PaymentStatus;
    use crate::store::InMemoryStore;
    use crate::test_support::{sample_property, FakeProvider};
    use rust_decimal_macros::dec;

    struct Fixture {
        store: Arc<InMemoryStore>,
        provider: Arc<FakeProvider>,
        payments: PaymentService,
        guest: AuthenticatedUser,
        booking_id: Uuid,
    }

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "guest@example.com".to_string(),
            role,
        }
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let property = sample_property(Uuid::new_v4());
        store.insert_property(property.clone()).await;
        let stores = Stores::in_memory(store.clone());

        let guest = user(Role::Guest);
        let booking = BookingService::new(&stores)
            .create_booking(
                guest.user_id,
                CreateBookingRequest {
                    property_id: Some(property.id.to_string()),
                    check_in_date: Some("2024-06-01".to_string()),
                    check_out_date: Some("2024-06-04".to_string()),
                    number_of_guests: Some(2),
                    guest_message: None,
                },
            )
            .await
            .unwrap();

        let provider = Arc::new(FakeProvider::new());
        let payments = PaymentService::new(
            &stores,
            provider.clone(),
            Duration::from_millis(200),
            "http://localhost:3000".to_string(),
        );

        Fixture {
            store,
            provider,
            payments,
            guest,
            booking_id: booking.id,
        }
    }

    fn checkout(booking_id: Uuid) -> CheckoutRequest {
        CheckoutRequest {
            booking_id: Some(booking_id.to_string()),
        }
    }

    fn verify_request(booking_id: Uuid, reference: &str) -> VerifyPaymentRequest {
        VerifyPaymentRequest {
            booking_id: Some(booking_id.to_string()),
            reference: Some(reference.to_string()),
        }
    }

    #[test]
    fn test_reference_format() {
        let booking_id = Uuid::parse_str("8e0b1b1e-8c3c-4a55-9b1f-5b8cb6cf5a01").unwrap();
        let now = Utc.timestamp_millis_opt(1_717_200_000_000).unwrap();
        assert_eq!(
            generate_reference(booking_id, now),
            "BKG_8e0b1b1e8c3c4a559b1f5b8cb6cf5a01_1717200000000"
        );
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(dec!(150)), Some(15000));
        assert_eq!(to_minor_units(dec!(179.99)), Some(17999));
        assert_eq!(to_minor_units(dec!(0.005)), Some(0));
    }

    #[tokio::test]
    async fn test_checkout_charges_stored_total() {
        let f = fixture().await;

        let session = f.payments.initialize_checkout(&f.guest, checkout(f.booking_id)).await.unwrap();

        let sent = f.provider.last_initialize().unwrap();
        assert_eq!(sent.amount_minor, 15000);
        assert_eq!(sent.reference, session.reference);
        assert_eq!(
            sent.callback_url,
            format!("http://localhost:3000/bookings/{}?payment=success", f.booking_id)
        );
        assert_eq!(sent.metadata["bookingId"], f.booking_id.to_string());

        let payment = f.store.find_by_booking(f.booking_id).await.unwrap().unwrap();
        assert_eq!(payment.amount, dec!(150));
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.provider_reference, session.reference);
    }

    #[tokio::test]
    async fn test_checkout_requires_guest_owner_of_pending_booking() {
        let f = fixture().await;

        let host = user(Role::Host);
        assert!(matches!(
            f.payments.initialize_checkout(&host, checkout(f.booking_id)).await,
            Err(PaymentError::Forbidden)
        ));

        let stranger = user(Role::Guest);
        assert!(matches!(
            f.payments.initialize_checkout(&stranger, checkout(f.booking_id)).await,
            Err(PaymentError::Forbidden)
        ));

        f.store
            .update_status(f.booking_id, BookingStatus::Cancelled, BookingPaymentStatus::Pending)
            .await
            .unwrap();
        assert!(matches!(
            f.payments.initialize_checkout(&f.guest, checkout(f.booking_id)).await,
            Err(PaymentError::InvalidBookingState(_))
        ));
        assert_eq!(f.provider.initialize_calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_success_confirms_booking_and_payment() {
        let f = fixture().await;
        let session = f.payments.initialize_checkout(&f.guest, checkout(f.booking_id)).await.unwrap();

        let result = f
            .payments
            .verify(&f.guest, verify_request(f.booking_id, &session.reference))
            .await
            .unwrap();

        assert_eq!(result.booking.status, BookingStatus::Confirmed);
        assert_eq!(result.booking.payment_status, BookingPaymentStatus::Paid);
        assert_eq!(result.payment.status, PaymentStatus::Success);
    }

    #[tokio::test]
    async fn test_verify_failed_transaction_leaves_booking_pending() {
        let f = fixture().await;
        let session = f.payments.initialize_checkout(&f.guest, checkout(f.booking_id)).await.unwrap();
        f.provider.set_verify_status(TransactionStatus::Failed);

        let result = f
            .payments
            .verify(&f.guest, verify_request(f.booking_id, &session.reference))
            .await;
        assert!(matches!(result, Err(PaymentError::VerificationFailed(_))));

        let booking = f.store.find_booking(f.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        let payment = f.store.find_by_booking(f.booking_id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_verify_timeout_is_retryable() {
        let f = fixture().await;
        let session = f.payments.initialize_checkout(&f.guest, checkout(f.booking_id)).await.unwrap();
        f.provider.set_delay(Duration::from_secs(5));

        let result = f
            .payments
            .verify(&f.guest, verify_request(f.booking_id, &session.reference))
            .await;
        assert!(matches!(result, Err(PaymentError::ProviderTimeout)));

        let booking = f.store.find_booking(f.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        // A later retry succeeds
        f.provider.set_delay(Duration::ZERO);
        let retried = f
            .payments
            .verify(&f.guest, verify_request(f.booking_id, &session.reference))
            .await
            .unwrap();
        assert_eq!(retried.booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_verify_is_atomic_when_payment_write_fails() {
        let f = fixture().await;
        let session = f.payments.initialize_checkout(&f.guest, checkout(f.booking_id)).await.unwrap();
        f.store.faults().set_fail_payment_writes(true);

        let result = f
            .payments
            .verify(&f.guest, verify_request(f.booking_id, &session.reference))
            .await;
        assert!(matches!(result, Err(PaymentError::Store(_))));

        let booking = f.store.find_booking(f.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, BookingPaymentStatus::Pending);
        let payment = f.store.find_by_booking(f.booking_id).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_verify_unknown_reference_or_booking() {
        let f = fixture().await;
        f.payments.initialize_checkout(&f.guest, checkout(f.booking_id)).await.unwrap();

        assert!(matches!(
            f.payments.verify(&f.guest, verify_request(f.booking_id, "BKG_other_1")).await,
            Err(PaymentError::PaymentRecordNotFound)
        ));
        assert!(matches!(
            f.payments.verify(&f.guest, verify_request(Uuid::new_v4(), "BKG_other_1")).await,
            Err(PaymentError::BookingNotFound)
        ));
        assert!(matches!(
            f.payments.verify(&f.guest, verify_request(f.booking_id, "../../etc")).await,
            Err(PaymentError::InvalidReference)
        ));
        assert_eq!(f.provider.verify_calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_cancelled_booking_is_rejected() {
        let f = fixture().await;
        let session = f.payments.initialize_checkout(&f.guest, checkout(f.booking_id)).await.unwrap();
        f.store
            .update_status(f.booking_id, BookingStatus::Cancelled, BookingPaymentStatus::Pending)
            .await
            .unwrap();

        let result = f
            .payments
            .verify(&f.guest, verify_request(f.booking_id, &session.reference))
            .await;
        assert!(matches!(result, Err(PaymentError::InvalidBookingState(_))));

        let booking = f.store.find_booking(f.booking_id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }
}
