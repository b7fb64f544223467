use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::bookings::{Booking, BookingError};
use crate::store::BookingRepository;

/// Half-open interval overlap: `[a1, a2)` and `[b1, b2)` share at least one instant.
///
/// Abutting stays (one checks out the day the next checks in) do not overlap.
pub fn overlaps(a1: DateTime<Utc>, a2: DateTime<Utc>, b1: DateTime<Utc>, b2: DateTime<Utc>) -> bool {
    a1 < b2 && a2 > b1
}

/// Answers whether a property is free for a date range
///
/// Always reads the store; a failed read is returned as an error and never
/// reported as "available".
#[derive(Clone)]
pub struct AvailabilityChecker {
    bookings: Arc<dyn BookingRepository>,
}

impl AvailabilityChecker {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Blocking bookings that overlap the requested range
    pub async fn find_conflicts(
        &self,
        property_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<Vec<Booking>, BookingError> {
        let candidates = self
            .bookings
            .find_blocking_overlaps(property_id, check_in, check_out)
            .await?;

        Ok(candidates
            .into_iter()
            .filter(|b| b.status.is_blocking())
            .filter(|b| overlaps(b.check_in_date, b.check_out_date, check_in, check_out))
            .collect())
    }

    pub async fn is_available(
        &self,
        property_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<bool, BookingError> {
        let conflicts = self.find_conflicts(property_id, check_in, check_out).await?;
        Ok(conflicts.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookings::{BookingPaymentStatus, BookingStatus, NewBooking};
    use crate::store::InMemoryStore;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn june(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_overlap_cases() {
        // contained
        assert!(overlaps(june(1), june(10), june(3), june(5)));
        // partial on either side
        assert!(overlaps(june(1), june(4), june(3), june(6)));
        assert!(overlaps(june(3), june(6), june(1), june(4)));
        // identical
        assert!(overlaps(june(1), june(4), june(1), june(4)));
        // abutting
        assert!(!overlaps(june(1), june(4), june(4), june(6)));
        assert!(!overlaps(june(4), june(6), june(1), june(4)));
        // disjoint
        assert!(!overlaps(june(1), june(2), june(5), june(6)));
    }

    async fn store_with_booking(property_id: Uuid) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert(NewBooking {
                property_id,
                guest_id: Uuid::new_v4(),
                check_in_date: june(1),
                check_out_date: june(4),
                number_of_guests: 2,
                total_price: dec!(150),
                status: BookingStatus::Pending,
                payment_status: BookingPaymentStatus::Pending,
                guest_message: None,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_is_available() {
        let property_id = Uuid::new_v4();
        let store = store_with_booking(property_id).await;
        let checker = AvailabilityChecker::new(store);

        assert!(!checker.is_available(property_id, june(2), june(5)).await.unwrap());
        assert!(checker.is_available(property_id, june(4), june(6)).await.unwrap());
        assert!(checker.is_available(Uuid::new_v4(), june(2), june(5)).await.unwrap());
    }

    #[tokio::test]
    async fn test_query_failure_is_not_available() {
        let property_id = Uuid::new_v4();
        let store = store_with_booking(property_id).await;
        store.faults().set_fail_booking_queries(true);
        let checker = AvailabilityChecker::new(store.clone());

        let result = checker.is_available(property_id, june(10), june(12)).await;
        assert!(matches!(result, Err(BookingError::Store(_))));
    }
}
