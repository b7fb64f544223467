use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::bookings::{
    AvailabilityChecker, Booking, BookingError, BookingPaymentStatus, BookingStatus,
    BookingWithProperty, CreateBookingRequest, NewBooking, PriceCalculator, PropertyLocks,
    StatusMachine,
};
use crate::store::{BookingRepository, PropertyRepository, StoreError, Stores};
use crate::validation::{non_blank, parse_booking_date, parse_id};

/// Service for booking business logic
#[derive(Clone)]
pub struct BookingService {
    properties: Arc<dyn PropertyRepository>,
    bookings: Arc<dyn BookingRepository>,
    availability: AvailabilityChecker,
    locks: PropertyLocks,
}

impl BookingService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            properties: stores.properties.clone(),
            bookings: stores.bookings.clone(),
            availability: AvailabilityChecker::new(stores.bookings.clone()),
            locks: PropertyLocks::new(),
        }
    }

    /// Create a pending booking for the authenticated guest
    ///
    /// Checks run in a fixed order and the first failure is returned. The
    /// availability check and insert happen under the property's lock; the
    /// store rejects any overlap that still slips through.
    ///
    /// # Arguments
    /// * `guest_id` - ID of the authenticated user making the booking
    /// * `request` - Booking request; identity and price fields are never read
    pub async fn create_booking(
        &self,
        guest_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let (Some(property_id), Some(check_in), Some(check_out), Some(guests)) = (
            non_blank(request.property_id.as_deref()),
            non_blank(request.check_in_date.as_deref()),
            non_blank(request.check_out_date.as_deref()),
            request.number_of_guests,
        ) else {
            return Err(BookingError::MissingField);
        };

        let (check_in, check_out) = parse_range(check_in, check_out)?;
        if guests < 1 {
            return Err(BookingError::InvalidGuestCount);
        }
        request.validate()?;
        let property_id = parse_id(property_id).ok_or(BookingError::InvalidId)?;

        tracing::debug!(
            "Creating booking for guest {} on property {} ({} to {})",
            guest_id,
            property_id,
            check_in,
            check_out
        );

        let property = self
            .properties
            .find_property(property_id)
            .await?
            .ok_or(BookingError::PropertyNotFound)?;

        // Counts beyond i32 can never fit a property
        let guests = i32::try_from(guests).unwrap_or(i32::MAX);
        if guests > property.capacity {
            return Err(BookingError::CapacityExceeded {
                capacity: property.capacity,
            });
        }

        let _guard = self.locks.acquire(property_id).await;

        let conflicts = self
            .availability
            .find_conflicts(property_id, check_in, check_out)
            .await?;
        if !conflicts.is_empty() {
            let ids: Vec<Uuid> = conflicts.iter().map(|b| b.id).collect();
            tracing::warn!(
                "Booking conflict on property {}: overlaps {:?}",
                property_id,
                ids
            );
            return Err(BookingError::AvailabilityConflict);
        }

        let nights = PriceCalculator::compute_nights(check_in, check_out)?;
        let total_price = PriceCalculator::compute_total(nights, property.price);

        let booking = self
            .bookings
            .insert(NewBooking {
                property_id,
                guest_id,
                check_in_date: check_in,
                check_out_date: check_out,
                number_of_guests: guests,
                total_price,
                status: BookingStatus::Pending,
                payment_status: BookingPaymentStatus::Pending,
                guest_message: request.guest_message.filter(|m| !m.trim().is_empty()),
            })
            .await
            .map_err(|err| {
                tracing::warn!("Booking insert rejected for property {}: {}", property_id, err);
                BookingError::from(err)
            })?;

        tracing::info!(
            "Created booking {} for guest {}: {} nights, total {}",
            booking.id,
            guest_id,
            nights,
            total_price
        );
        Ok(booking)
    }

    /// Get a booking with its property; visible to its guest and the property's host
    pub async fn get_booking(&self, booking_id: Uuid, requester_id: Uuid) -> Result<BookingWithProperty, BookingError> {
        let booking = self
            .bookings
            .find_with_property(booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        if booking.booking.guest_id != requester_id {
            let is_host = self
                .properties
                .find_property(booking.booking.property_id)
                .await?
                .map_or(false, |p| p.host_id == requester_id);
            if !is_host {
                tracing::warn!("User {} denied access to booking {}", requester_id, booking_id);
                return Err(BookingError::Forbidden);
            }
        }

        Ok(booking)
    }

    /// All bookings made by a guest, newest first
    pub async fn list_for_guest(&self, guest_id: Uuid) -> Result<Vec<BookingWithProperty>, BookingError> {
        Ok(self.bookings.find_by_guest(guest_id).await?)
    }

    /// All bookings on the host's properties, newest first
    pub async fn list_for_host(&self, host_id: Uuid) -> Result<Vec<BookingWithProperty>, BookingError> {
        Ok(self.bookings.find_by_host(host_id).await?)
    }

    /// Cancel a booking on behalf of its guest
    ///
    /// Cancelling an already cancelled booking succeeds without writing. A
    /// paid booking is marked for refund.
    pub async fn cancel_booking(&self, booking_id: Uuid, requester_id: Uuid) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        if booking.guest_id != requester_id {
            tracing::warn!("User {} attempted to cancel booking {}", requester_id, booking_id);
            return Err(BookingError::Forbidden);
        }

        if booking.status == BookingStatus::Cancelled {
            tracing::debug!("Booking {} already cancelled", booking_id);
            return Ok(booking);
        }

        StatusMachine::transition(booking.status, BookingStatus::Cancelled)
            .map_err(BookingError::InvalidTransition)?;

        // The store derives the payment status from the row it updates, not
        // from the copy read above
        let cancelled = match self.bookings.cancel(booking_id).await {
            Ok(cancelled) => cancelled,
            Err(StoreError::Conflict) => return Err(self.cancel_conflict(booking_id).await),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            "Cancelled booking {} (payment status {})",
            booking_id,
            cancelled.payment_status
        );
        Ok(cancelled)
    }

    /// Explain why a cancel lost to a concurrent status change
    async fn cancel_conflict(&self, booking_id: Uuid) -> BookingError {
        match self.bookings.find_booking(booking_id).await {
            Ok(Some(current)) => BookingError::InvalidTransition(
                StatusMachine::transition(current.status, BookingStatus::Cancelled)
                    .err()
                    .unwrap_or_else(|| format!("Booking {} changed while cancelling.", booking_id)),
            ),
            Ok(None) => BookingError::NotFound,
            Err(err) => err.into(),
        }
    }

    /// Whether the property is free for the requested range
    pub async fn check_availability(
        &self,
        property_id: Uuid,
        check_in: Option<&str>,
        check_out: Option<&str>,
    ) -> Result<bool, BookingError> {
        let (Some(check_in), Some(check_out)) = (non_blank(check_in), non_blank(check_out)) else {
            return Err(BookingError::MissingField);
        };
        let (check_in, check_out) = parse_range(check_in, check_out)?;

        self.properties
            .find_property(property_id)
            .await?
            .ok_or(BookingError::PropertyNotFound)?;

        self.availability.is_available(property_id, check_in, check_out).await
    }
}

fn parse_range(check_in: &str, check_out: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), BookingError> {
    let check_in = parse_booking_date(check_in).ok_or(BookingError::InvalidDate)?;
    let check_out = parse_booking_date(check_out).ok_or(BookingError::InvalidDate)?;
    if check_out <= check_in {
        return Err(BookingError::InvalidRange);
    }
    Ok((check_in, check_out))
}
