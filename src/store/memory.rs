// In-process store used by tests and embedders that do not run Postgres

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::bookings::availability::overlaps;
use crate::bookings::models::{
    Booking, BookingPaymentStatus, BookingStatus, BookingWithProperty, NewBooking, Property,
    PropertySummary,
};
use crate::payments::models::{NewPayment, Payment, PaymentStatus};
use crate::store::{BookingRepository, PaymentRepository, PropertyRepository, StoreError};

/// Switches that make selected store operations fail on demand
#[derive(Debug, Default)]
pub struct FaultInjection {
    fail_payment_writes: AtomicBool,
    fail_booking_queries: AtomicBool,
}

impl FaultInjection {
    /// Make every payment write fail with `StoreError::Unavailable`
    pub fn set_fail_payment_writes(&self, enabled: bool) {
        self.fail_payment_writes.store(enabled, Ordering::SeqCst);
    }

    /// Make overlap queries fail with `StoreError::Unavailable`
    pub fn set_fail_booking_queries(&self, enabled: bool) {
        self.fail_booking_queries.store(enabled, Ordering::SeqCst);
    }

    fn payment_write(&self) -> Result<(), StoreError> {
        if self.fail_payment_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected payment write failure".to_string()));
        }
        Ok(())
    }

    fn booking_query(&self) -> Result<(), StoreError> {
        if self.fail_booking_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected booking query failure".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    properties: HashMap<Uuid, Property>,
    bookings: HashMap<Uuid, Booking>,
    /// Keyed by booking id; one payment per booking
    payments: HashMap<Uuid, Payment>,
}

impl MemoryState {
    fn with_property(&self, booking: &Booking) -> Option<BookingWithProperty> {
        self.properties
            .get(&booking.property_id)
            .map(|property| BookingWithProperty {
                booking: booking.clone(),
                property: PropertySummary::from(property),
            })
    }

    fn newest_first<F>(&self, filter: F) -> Vec<BookingWithProperty>
    where
        F: Fn(&Booking) -> bool,
    {
        let mut rows: Vec<BookingWithProperty> = self
            .bookings
            .values()
            .filter(|booking| filter(booking))
            .filter_map(|booking| self.with_property(booking))
            .collect();
        rows.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        rows
    }
}

/// Store holding every record behind one async read-write lock
///
/// Writes that must be atomic (booking insert with its overlap check, payment
/// reconciliation) run entirely under the write guard.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    faults: FaultInjection,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &FaultInjection {
        &self.faults
    }

    /// Seed a property; listings are owned by another service
    pub async fn insert_property(&self, property: Property) {
        self.state.write().await.properties.insert(property.id, property);
    }
}

#[async_trait]
impl PropertyRepository for InMemoryStore {
    async fn find_property(&self, id: Uuid) -> Result<Option<Property>, StoreError> {
        Ok(self.state.read().await.properties.get(&id).cloned())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn find_blocking_overlaps(
        &self,
        property_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        self.faults.booking_query()?;

        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.property_id == property_id && b.status.is_blocking())
            .filter(|b| overlaps(b.check_in_date, b.check_out_date, check_in, check_out))
            .cloned()
            .collect())
    }

    async fn insert(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let mut state = self.state.write().await;

        let clashes = booking.status.is_blocking()
            && state.bookings.values().any(|existing| {
                existing.property_id == booking.property_id
                    && existing.status.is_blocking()
                    && overlaps(
                        existing.check_in_date,
                        existing.check_out_date,
                        booking.check_in_date,
                        booking.check_out_date,
                    )
            });
        if clashes {
            return Err(StoreError::Conflict);
        }

        let now = Utc::now();
        let stored = Booking {
            id: Uuid::new_v4(),
            property_id: booking.property_id,
            guest_id: booking.guest_id,
            check_in_date: booking.check_in_date,
            check_out_date: booking.check_out_date,
            number_of_guests: booking.number_of_guests,
            total_price: booking.total_price,
            status: booking.status,
            payment_status: booking.payment_status,
            guest_message: booking.guest_message,
            owner_message: None,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn find_with_property(&self, id: Uuid) -> Result<Option<BookingWithProperty>, StoreError> {
        let state = self.state.read().await;
        Ok(state.bookings.get(&id).and_then(|b| state.with_property(b)))
    }

    async fn find_by_guest(&self, guest_id: Uuid) -> Result<Vec<BookingWithProperty>, StoreError> {
        let state = self.state.read().await;
        Ok(state.newest_first(|b| b.guest_id == guest_id))
    }

    async fn find_by_host(&self, host_id: Uuid) -> Result<Vec<BookingWithProperty>, StoreError> {
        let state = self.state.read().await;
        Ok(state.newest_first(|b| {
            state
                .properties
                .get(&b.property_id)
                .map_or(false, |p| p.host_id == host_id)
        }))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: BookingPaymentStatus,
    ) -> Result<Booking, StoreError> {
        let mut state = self.state.write().await;
        let booking = state.bookings.get_mut(&id).ok_or(StoreError::BookingNotFound(id))?;
        booking.status = status;
        booking.payment_status = payment_status;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn cancel(&self, id: Uuid) -> Result<Booking, StoreError> {
        let mut state = self.state.write().await;
        let booking = state.bookings.get_mut(&id).ok_or(StoreError::BookingNotFound(id))?;
        match booking.status {
            BookingStatus::Cancelled => {}
            BookingStatus::Pending | BookingStatus::Confirmed => {
                booking.status = BookingStatus::Cancelled;
                booking.payment_status = booking.payment_status.after_cancellation();
                booking.updated_at = Utc::now();
            }
            _ => return Err(StoreError::Conflict),
        }
        Ok(booking.clone())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn upsert_for_booking(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        self.faults.payment_write()?;

        let mut state = self.state.write().await;
        let now = Utc::now();
        let stored = match state.payments.get(&payment.booking_id) {
            Some(existing) => Payment {
                amount: payment.amount,
                provider_reference: payment.provider_reference,
                status: PaymentStatus::Pending,
                updated_at: now,
                ..existing.clone()
            },
            None => Payment {
                id: Uuid::new_v4(),
                booking_id: payment.booking_id,
                guest_id: payment.guest_id,
                property_id: payment.property_id,
                amount: payment.amount,
                status: PaymentStatus::Pending,
                provider_reference: payment.provider_reference,
                created_at: now,
                updated_at: now,
            },
        };
        state.payments.insert(stored.booking_id, stored.clone());
        Ok(stored)
    }

    async fn confirm(&self, booking_id: Uuid, reference: &str) -> Result<(Booking, Payment), StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        // Stage both records and write back only when every step succeeded
        let mut booking = state
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or(StoreError::BookingNotFound(booking_id))?;
        if !booking.status.is_blocking() {
            return Err(StoreError::Conflict);
        }
        booking.status = BookingStatus::Confirmed;
        booking.payment_status = BookingPaymentStatus::Paid;
        booking.updated_at = now;

        let mut payment = state
            .payments
            .get(&booking_id)
            .filter(|p| p.provider_reference == reference)
            .cloned()
            .ok_or_else(|| StoreError::PaymentNotFound {
                booking_id,
                reference: reference.to_string(),
            })?;
        self.faults.payment_write()?;
        payment.status = PaymentStatus::Success;
        payment.updated_at = now;

        state.bookings.insert(booking_id, booking.clone());
        state.payments.insert(booking_id, payment.clone());
        Ok((booking, payment))
    }

    async fn find_by_booking(&self, booking_id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(self.state.read().await.payments.get(&booking_id).cloned())
    }
}
