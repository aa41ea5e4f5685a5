/// Booking ledger
///
/// Owns the booking lifecycle and the invariant that ties bookings to vehicle
/// availability:
///
/// - a vehicle is `booked` exactly while one `active` booking holds it
/// - a booking starts `active` and ends `cancelled` or `returned`, never back
///
/// Every operation that writes both a booking and a vehicle runs inside one
/// transaction. The row being decided on (the vehicle when booking, the
/// booking when cancelling or returning) is read with `FOR UPDATE`, so two
/// concurrent requests for the same vehicle queue on the row lock and the
/// second one sees the first one's committed result. Returning early with `?`
/// drops the transaction, which rolls it back.
///
/// # Example
///
/// ```no_run
/// use chrono::{TimeZone, Utc};
/// use rentflow_shared::ledger::{self, BookingRequest};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), ledger::LedgerError> {
/// let booking = ledger::create_booking(&pool, 7, BookingRequest {
///     vehicle_id: 1,
///     rent_start_date: Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap(),
///     rent_end_date: Utc.with_ymd_and_hms(2099, 1, 4, 0, 0, 0).unwrap(),
/// })
/// .await?;
///
/// ledger::cancel_booking(&pool, booking.id, 7, Utc::now()).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::middleware::AuthContext;
use crate::models::booking::{Booking, BookingStatus, NewBooking, ONE_ACTIVE_PER_VEHICLE};
use crate::models::vehicle::{AvailabilityStatus, Vehicle};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Largest total a booking row can hold (`NUMERIC(12, 2)`)
pub const MAX_TOTAL_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Ways a ledger operation can fail
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Booking or vehicle doesn't exist
    #[error("{0}")]
    NotFound(String),

    /// Vehicle is not available (including losing a race for it)
    #[error("{0}")]
    Conflict(String),

    /// Request is malformed, e.g. an empty or inverted date range
    #[error("{0}")]
    InvalidInput(String),

    /// Caller has no rights over the booking
    #[error("{0}")]
    Forbidden(String),

    /// Booking's lifecycle state doesn't allow the operation
    #[error("{0}")]
    InvalidState(String),

    /// Store failure; not caused by the request
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// What a customer asks for when booking
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub vehicle_id: i32,
    pub rent_start_date: DateTime<Utc>,
    pub rent_end_date: DateTime<Utc>,
}

/// Length of a rental in days, fractions included
///
/// # Errors
///
/// [`LedgerError::InvalidInput`] unless `end` is strictly after `start`.
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> LedgerResult<Decimal> {
    let millis = rental_millis(start, end)?;
    Ok(Decimal::from(millis) / Decimal::from(MILLIS_PER_DAY))
}

/// Total price for renting at `daily_rent_price` from `start` to `end`,
/// rounded to cents (half away from zero)
///
/// # Errors
///
/// [`LedgerError::InvalidInput`] for an empty or inverted range, or when the
/// total exceeds [`MAX_TOTAL_PRICE`].
pub fn quote_total(
    daily_rent_price: Decimal,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> LedgerResult<Decimal> {
    let millis = rental_millis(start, end)?;
    let too_long = || LedgerError::InvalidInput("Rental period is too long".to_string());

    // Multiply before dividing so whole-day rentals stay exact
    let total = daily_rent_price
        .checked_mul(Decimal::from(millis))
        .ok_or_else(too_long)?
        / Decimal::from(MILLIS_PER_DAY);

    let total = total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    if total > MAX_TOTAL_PRICE {
        return Err(too_long());
    }

    Ok(total)
}

fn rental_millis(start: DateTime<Utc>, end: DateTime<Utc>) -> LedgerResult<i64> {
    if end <= start {
        return Err(LedgerError::InvalidInput(
            "Invalid rental date range: end must be after start".to_string(),
        ));
    }

    Ok((end - start).num_milliseconds())
}

/// Books a vehicle for a customer
///
/// Checks the date range first, then, under a row lock on the vehicle, that it
/// exists and is available. Inserts the `active` booking and marks the vehicle
/// `booked` in the same transaction. The price is a snapshot of the vehicle's
/// daily price at this moment.
///
/// # Errors
///
/// - `InvalidInput`: `rent_end_date <= rent_start_date`
/// - `NotFound`: no such vehicle (or the customer account is gone)
/// - `Conflict`: vehicle already booked
pub async fn create_booking(
    pool: &PgPool,
    customer_id: i32,
    request: BookingRequest,
) -> LedgerResult<Booking> {
    rental_millis(request.rent_start_date, request.rent_end_date)?;

    let mut tx = pool.begin().await?;

    let vehicle = Vehicle::lock_for_update(&mut *tx, request.vehicle_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.availability_status != AvailabilityStatus::Available {
        warn!(
            vehicle_id = vehicle.id,
            customer_id,
            "Booking refused: vehicle not available"
        );
        return Err(LedgerError::Conflict("Vehicle not available".to_string()));
    }

    let total_price = quote_total(
        vehicle.daily_rent_price,
        request.rent_start_date,
        request.rent_end_date,
    )?;

    let booking = Booking::insert(
        &mut *tx,
        NewBooking {
            customer_id,
            vehicle_id: vehicle.id,
            rent_start_date: request.rent_start_date,
            rent_end_date: request.rent_end_date,
            total_price,
        },
    )
    .await
    .map_err(classify_insert_error)?;

    Vehicle::set_availability(&mut *tx, vehicle.id, AvailabilityStatus::Booked).await?;

    tx.commit().await?;

    info!(
        booking_id = booking.id,
        vehicle_id = booking.vehicle_id,
        customer_id,
        total_price = %booking.total_price,
        "Booking created"
    );

    Ok(booking)
}

/// Admins see every booking, customers only their own
pub async fn list_bookings(pool: &PgPool, caller: &AuthContext) -> LedgerResult<Vec<Booking>> {
    let bookings = if caller.is_admin() {
        Booking::list_all(pool).await?
    } else {
        Booking::list_by_customer(pool, caller.user_id).await?
    };

    Ok(bookings)
}

/// Cancels a booking on behalf of its owner and frees the vehicle
///
/// Only allowed strictly before the rental starts (`now < rent_start_date`)
/// and only while the booking is `active`.
///
/// # Errors
///
/// - `NotFound`: no such booking
/// - `Forbidden`: `caller_id` doesn't own it
/// - `InvalidState`: rental already started, or booking already terminal
pub async fn cancel_booking(
    pool: &PgPool,
    booking_id: i32,
    caller_id: i32,
    now: DateTime<Utc>,
) -> LedgerResult<Booking> {
    let mut tx = pool.begin().await?;

    let booking = Booking::lock_for_update(&mut *tx, booking_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound("Booking not found".to_string()))?;

    if booking.customer_id != caller_id {
        warn!(booking_id, caller_id, "Cancel refused: caller does not own booking");
        return Err(LedgerError::Forbidden(
            "Unauthorized booking access".to_string(),
        ));
    }

    if now >= booking.rent_start_date {
        return Err(LedgerError::InvalidState(
            "Cannot cancel after rental start".to_string(),
        ));
    }

    let cancelled = finish(&mut *tx, booking, BookingStatus::Cancelled).await?;

    tx.commit().await?;

    info!(
        booking_id,
        vehicle_id = cancelled.vehicle_id,
        "Booking cancelled"
    );

    Ok(cancelled)
}

/// Checks a vehicle back in: booking `returned`, vehicle `available`
///
/// # Errors
///
/// - `Forbidden`: caller is not an admin
/// - `NotFound`: no such booking
/// - `InvalidState`: booking already cancelled or returned
pub async fn return_booking(
    pool: &PgPool,
    booking_id: i32,
    caller: &AuthContext,
) -> LedgerResult<Booking> {
    if !caller.is_admin() {
        warn!(booking_id, caller_id = caller.user_id, "Return refused: caller is not admin");
        return Err(LedgerError::Forbidden(
            "Only admin can return booking".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let booking = Booking::lock_for_update(&mut *tx, booking_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound("Booking not found".to_string()))?;

    let returned = finish(&mut *tx, booking, BookingStatus::Returned).await?;

    tx.commit().await?;

    info!(
        booking_id,
        vehicle_id = returned.vehicle_id,
        admin_id = caller.user_id,
        "Vehicle returned"
    );

    Ok(returned)
}

/// Moves an active booking to a terminal state and frees its vehicle
async fn finish(
    conn: &mut sqlx::PgConnection,
    booking: Booking,
    target: BookingStatus,
) -> LedgerResult<Booking> {
    if !booking.status.can_transition_to(target) {
        return Err(LedgerError::InvalidState(format!(
            "Booking is already {}",
            booking.status.as_str()
        )));
    }

    let updated = Booking::transition(&mut *conn, booking.id, target)
        .await?
        .ok_or_else(|| {
            LedgerError::InvalidState(format!("Booking {} is no longer active", booking.id))
        })?;

    let freed =
        Vehicle::set_availability(&mut *conn, updated.vehicle_id, AvailabilityStatus::Available)
            .await?;

    if !freed {
        return Err(LedgerError::NotFound("Vehicle not found".to_string()));
    }

    Ok(updated)
}

/// Constraint failures on insert are caller errors, not store failures
fn classify_insert_error(err: sqlx::Error) -> LedgerError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(ONE_ACTIVE_PER_VEHICLE) {
            return LedgerError::Conflict("Vehicle not available".to_string());
        }
        if db_err.is_foreign_key_violation() {
            return LedgerError::NotFound("Customer not found".to_string());
        }
    }

    LedgerError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_three_day_rental_price() {
        let total = quote_total(Decimal::new(5000, 2), at(2024, 1, 1), at(2024, 1, 4)).unwrap();
        assert_eq!(total, Decimal::new(15000, 2));
        assert_eq!(total.to_string(), "150.00");
    }

    #[test]
    fn test_fractional_days() {
        let start = at(2024, 1, 1);
        let end = start + Duration::hours(36);

        assert_eq!(rental_days(start, end).unwrap(), Decimal::new(15, 1));
        assert_eq!(
            quote_total(Decimal::new(4000, 2), start, end).unwrap(),
            Decimal::new(6000, 2)
        );
    }

    #[test]
    fn test_price_rounds_to_cents() {
        let start = at(2024, 1, 1);
        let end = start + Duration::hours(8);

        // 10.00 / 3 = 3.333...
        assert_eq!(
            quote_total(Decimal::new(1000, 2), start, end).unwrap(),
            Decimal::new(333, 2)
        );
    }

    #[test]
    fn test_rental_across_leap_day() {
        assert_eq!(rental_days(at(2024, 2, 28), at(2024, 3, 1)).unwrap(), Decimal::from(2));
    }

    #[test]
    fn test_end_equal_to_start_is_invalid() {
        let day = at(2024, 1, 1);
        assert!(matches!(rental_days(day, day), Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn test_end_before_start_is_invalid() {
        let result = quote_total(Decimal::new(5000, 2), at(2024, 1, 4), at(2024, 1, 1));
        assert!(matches!(result, Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn test_max_total_price_matches_column() {
        assert_eq!(MAX_TOTAL_PRICE.to_string(), "9999999999.99");
    }

    #[test]
    fn test_total_beyond_column_is_invalid_input() {
        // 5,000,000.00 a day for six years
        let result = quote_total(Decimal::new(500_000_000, 2), at(2099, 1, 1), at(2105, 1, 1));

        match result {
            Err(LedgerError::InvalidInput(msg)) => assert_eq!(msg, "Rental period is too long"),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_total_at_limit_is_accepted() {
        let start = at(2099, 1, 1);
        let total = quote_total(MAX_TOTAL_PRICE, start, start + Duration::days(1)).unwrap();
        assert_eq!(total, MAX_TOTAL_PRICE);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LedgerError::Conflict("Vehicle not available".to_string()).to_string(),
            "Vehicle not available"
        );
        assert!(LedgerError::Database(sqlx::Error::RowNotFound)
            .to_string()
            .starts_with("Database error"));
    }

    #[test]
    fn test_non_database_insert_error_stays_internal() {
        assert!(matches!(
            classify_insert_error(sqlx::Error::PoolTimedOut),
            LedgerError::Database(_)
        ));
    }
}
