use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::bookings::BookingError;

const MILLIS_PER_NIGHT: i64 = 86_400_000;

/// Service for computing stay length and price
pub struct PriceCalculator;

impl PriceCalculator {
    /// Number of nights billed for a stay
    ///
    /// Any part of a day counts as a full night, so 36 hours is 2 nights.
    ///
    /// # Returns
    /// `Err(InvalidRange)` unless `check_out` is strictly after `check_in`
    pub fn compute_nights(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Result<i64, BookingError> {
        let millis = (check_out - check_in).num_milliseconds();
        if millis <= 0 {
            return Err(BookingError::InvalidRange);
        }
        Ok((millis + MILLIS_PER_NIGHT - 1) / MILLIS_PER_NIGHT)
    }

    /// Total price for a stay: `nights * nightly_rate`
    pub fn compute_total(nights: i64, nightly_rate: Decimal) -> Decimal {
        Decimal::from(nights) * nightly_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_whole_days() {
        assert_eq!(PriceCalculator::compute_nights(at(1, 0), at(4, 0)).unwrap(), 3);
    }

    #[test]
    fn test_partial_day_rounds_up() {
        // 36 hours
        assert_eq!(PriceCalculator::compute_nights(at(1, 8), at(2, 20)).unwrap(), 2);
        assert_eq!(PriceCalculator::compute_nights(at(1, 0), at(1, 1)).unwrap(), 1);
    }

    #[test]
    fn test_empty_or_reversed_range_rejected() {
        assert!(matches!(
            PriceCalculator::compute_nights(at(2, 0), at(2, 0)),
            Err(BookingError::InvalidRange)
        ));
        assert!(matches!(
            PriceCalculator::compute_nights(at(3, 0), at(2, 0)),
            Err(BookingError::InvalidRange)
        ));
    }

    #[test]
    fn test_compute_total() {
        assert_eq!(PriceCalculator::compute_total(3, dec!(100)), dec!(300));
        assert_eq!(PriceCalculator::compute_total(3, dec!(50)), dec!(150));
        assert_eq!(PriceCalculator::compute_total(2, dec!(89.99)), dec!(179.98));
    }

    #[test]
    fn test_one_millisecond_is_one_night() {
        let check_in = at(1, 0);
        let check_out = check_in + Duration::milliseconds(1);
        assert_eq!(PriceCalculator::compute_nights(check_in, check_out).unwrap(), 1);
    }
}
