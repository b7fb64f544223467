use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::bookings::models::{
    Booking, BookingPaymentStatus, BookingStatus, BookingWithProperty, NewBooking, Property,
    PropertySummary,
};
use crate::payments::models::{NewPayment, Payment};
use crate::store::{BookingRepository, PaymentRepository, PropertyRepository, StoreError};

/// SQLSTATE raised when an EXCLUDE constraint rejects a row
const EXCLUSION_VIOLATION: &str = "23P01";

const BOOKING_COLUMNS: &str = "id, property_id, guest_id, check_in_date, check_out_date, \
     number_of_guests, total_price, status, payment_status, guest_message, owner_message, \
     created_at, updated_at";

const PAYMENT_COLUMNS: &str =
    "id, booking_id, guest_id, property_id, amount, status, provider_reference, created_at, updated_at";

const BOOKING_WITH_PROPERTY_SELECT: &str = r#"
    SELECT b.id, b.property_id, b.guest_id, b.check_in_date, b.check_out_date,
           b.number_of_guests, b.total_price, b.status, b.payment_status,
           b.guest_message, b.owner_message, b.created_at, b.updated_at,
           p.title AS property_title, p.image_urls AS property_image_urls,
           p.price AS property_price, p.location AS property_location
    FROM bookings b
    JOIN properties p ON p.id = b.property_id
"#;

/// Postgres-backed store for properties, bookings and payments
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct BookingPropertyRow {
    #[sqlx(flatten)]
    booking: Booking,
    property_title: String,
    property_image_urls: Vec<String>,
    property_price: Decimal,
    property_location: Option<String>,
}

impl From<BookingPropertyRow> for BookingWithProperty {
    fn from(row: BookingPropertyRow) -> Self {
        let property = PropertySummary {
            id: row.booking.property_id,
            title: row.property_title,
            image_urls: row.property_image_urls,
            price: row.property_price,
            location: row.property_location,
        };
        Self {
            booking: row.booking,
            property,
        }
    }
}

/// Exclusion-constraint violations surface as booking conflicts
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
            return StoreError::Conflict;
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl PropertyRepository for PgStore {
    async fn find_property(&self, id: Uuid) -> Result<Option<Property>, StoreError> {
        let property = sqlx::query_as::<_, Property>(
            "SELECT id, host_id, title, price, capacity, location, image_urls FROM properties WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(property)
    }
}

#[async_trait]
impl BookingRepository for PgStore {
    async fn find_blocking_overlaps(
        &self,
        property_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE property_id = $1 \
               AND status IN ('pending', 'confirmed') \
               AND check_in_date < $3 \
               AND check_out_date > $2"
        );
        let bookings = sqlx::query_as::<_, Booking>(&query)
            .bind(property_id)
            .bind(check_in)
            .bind(check_out)
            .fetch_all(&self.pool)
            .await?;

        Ok(bookings)
    }

    async fn insert(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let query = format!(
            "INSERT INTO bookings \
                (property_id, guest_id, check_in_date, check_out_date, number_of_guests, \
                 total_price, status, payment_status, guest_message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {BOOKING_COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(booking.property_id)
            .bind(booking.guest_id)
            .bind(booking.check_in_date)
            .bind(booking.check_out_date)
            .bind(booking.number_of_guests)
            .bind(booking.total_price)
            .bind(booking.status)
            .bind(booking.payment_status)
            .bind(booking.guest_message)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let booking = sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn find_with_property(&self, id: Uuid) -> Result<Option<BookingWithProperty>, StoreError> {
        let query = format!("{BOOKING_WITH_PROPERTY_SELECT} WHERE b.id = $1");
        let row = sqlx::query_as::<_, BookingPropertyRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_guest(&self, guest_id: Uuid) -> Result<Vec<BookingWithProperty>, StoreError> {
        let query = format!("{BOOKING_WITH_PROPERTY_SELECT} WHERE b.guest_id = $1 ORDER BY b.created_at DESC");
        let rows = sqlx::query_as::<_, BookingPropertyRow>(&query)
            .bind(guest_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_host(&self, host_id: Uuid) -> Result<Vec<BookingWithProperty>, StoreError> {
        let query = format!("{BOOKING_WITH_PROPERTY_SELECT} WHERE p.host_id = $1 ORDER BY b.created_at DESC");
        let rows = sqlx::query_as::<_, BookingPropertyRow>(&query)
            .bind(host_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: BookingPaymentStatus,
    ) -> Result<Booking, StoreError> {
        let query = format!(
            "UPDATE bookings SET status = $2, payment_status = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(status)
            .bind(payment_status)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or(StoreError::BookingNotFound(id))
    }

    async fn cancel(&self, id: Uuid) -> Result<Booking, StoreError> {
        let query = format!(
            "UPDATE bookings SET status = 'cancelled', \
                payment_status = CASE WHEN payment_status = 'paid' THEN 'refunded' ELSE payment_status END, \
                updated_at = NOW() \
             WHERE id = $1 AND status IN ('pending', 'confirmed') \
             RETURNING {BOOKING_COLUMNS}"
        );
        let cancelled = sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        if let Some(booking) = cancelled {
            return Ok(booking);
        }

        match self.find_booking(id).await? {
            Some(booking) if booking.status == BookingStatus::Cancelled => Ok(booking),
            Some(_) => Err(StoreError::Conflict),
            None => Err(StoreError::BookingNotFound(id)),
        }
    }
}

#[async_trait]
impl PaymentRepository for PgStore {
    async fn upsert_for_booking(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        let query = format!(
            "INSERT INTO payments (booking_id, guest_id, property_id, amount, status, provider_reference) \
             VALUES ($1, $2, $3, $4, 'pending', $5) \
             ON CONFLICT (booking_id) DO UPDATE \
                SET provider_reference = EXCLUDED.provider_reference, \
                    amount = EXCLUDED.amount, \
                    status = 'pending', \
                    updated_at = NOW() \
             RETURNING {PAYMENT_COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(payment.booking_id)
            .bind(payment.guest_id)
            .bind(payment.property_id)
            .bind(payment.amount)
            .bind(payment.provider_reference)
            .fetch_one(&self.pool)
            .await?;

        Ok(payment)
    }

    async fn confirm(&self, booking_id: Uuid, reference: &str) -> Result<(Booking, Payment), StoreError> {
        let mut tx = self.pool.begin().await?;

        let booking_query = format!(
            "UPDATE bookings SET status = 'confirmed', payment_status = 'paid', updated_at = NOW() \
             WHERE id = $1 AND status IN ('pending', 'confirmed') \
             RETURNING {BOOKING_COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&booking_query)
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await?;

        let booking = match booking {
            Some(booking) => booking,
            None => {
                let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM bookings WHERE id = $1")
                    .bind(booking_id)
                    .fetch_optional(&mut *tx)
                    .await?;
                return Err(match exists {
                    Some(_) => StoreError::Conflict,
                    None => StoreError::BookingNotFound(booking_id),
                });
            }
        };

        let payment_query = format!(
            "UPDATE payments SET status = 'success', updated_at = NOW() \
             WHERE booking_id = $1 AND provider_reference = $2 \
             RETURNING {PAYMENT_COLUMNS}"
        );
        // Dropping `tx` on the early return rolls the booking update back
        let payment = sqlx::query_as::<_, Payment>(&payment_query)
            .bind(booking_id)
            .bind(reference)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::PaymentNotFound {
                booking_id,
                reference: reference.to_string(),
            })?;

        tx.commit().await?;
        Ok((booking, payment))
    }

    async fn find_by_booking(&self, booking_id: Uuid) -> Result<Option<Payment>, StoreError> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1");
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }
}
