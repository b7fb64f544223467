// Persistence seams for the booking core
//
// Services hold these traits as `Arc<dyn ...>` so the Postgres store and the
// in-memory store are interchangeable.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::bookings::models::{
    Booking, BookingPaymentStatus, BookingStatus, BookingWithProperty, NewBooking, Property,
};
use crate::payments::models::{NewPayment, Payment};

pub use memory::{FaultInjection, InMemoryStore};
pub use postgres::PgStore;

/// Errors surfaced by any store implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A write would violate the no-overlap or state invariants
    #[error("conflicting write")]
    Conflict,

    #[error("booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("no payment for booking {booking_id} with reference {reference}")]
    PaymentNotFound { booking_id: Uuid, reference: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn find_property(&self, id: Uuid) -> Result<Option<Property>, StoreError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Blocking bookings for the property whose stay overlaps `[check_in, check_out)`
    async fn find_blocking_overlaps(
        &self,
        property_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Insert a booking; fails with `Conflict` if a blocking overlap exists
    async fn insert(&self, booking: NewBooking) -> Result<Booking, StoreError>;

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn find_with_property(&self, id: Uuid) -> Result<Option<BookingWithProperty>, StoreError>;

    /// Bookings made by a guest, newest first
    async fn find_by_guest(&self, guest_id: Uuid) -> Result<Vec<BookingWithProperty>, StoreError>;

    /// Bookings on any property owned by the host, newest first
    async fn find_by_host(&self, host_id: Uuid) -> Result<Vec<BookingWithProperty>, StoreError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: BookingPaymentStatus,
    ) -> Result<Booking, StoreError>;

    /// Cancel a pending or confirmed booking in one conditional write.
    ///
    /// The payment status is derived from the row as stored at write time, so
    /// a payment confirmed concurrently still ends up `refunded`. An already
    /// cancelled booking is returned unchanged. Any other state fails with
    /// `Conflict`.
    async fn cancel(&self, id: Uuid) -> Result<Booking, StoreError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Create the booking's payment record or overwrite its provider reference
    async fn upsert_for_booking(&self, payment: NewPayment) -> Result<Payment, StoreError>;

    /// Confirm the booking and mark its payment successful as one atomic unit.
    ///
    /// Either both records change or neither does. Fails with `Conflict` when
    /// the booking is no longer pending or confirmed.
    async fn confirm(&self, booking_id: Uuid, reference: &str) -> Result<(Booking, Payment), StoreError>;

    async fn find_by_booking(&self, booking_id: Uuid) -> Result<Option<Payment>, StoreError>;
}

/// The set of repositories a running service needs
#[derive(Clone)]
pub struct Stores {
    pub properties: Arc<dyn PropertyRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
}

impl Stores {
    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            properties: store.clone(),
            bookings: store.clone(),
            payments: store,
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            properties: store.clone(),
            bookings: store.clone(),
            payments: store,
        }
    }
}
