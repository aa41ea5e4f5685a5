/// Booking model and database operations
///
/// # State Machine
///
/// ```text
/// active → cancelled   (owning customer, before the rental starts)
/// active → returned    (admin)
/// ```
///
/// Both `cancelled` and `returned` are terminal. Bookings are never deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE booking_status AS ENUM ('active', 'cancelled', 'returned');
///
/// CREATE TABLE bookings (
///     id SERIAL PRIMARY KEY,
///     customer_id INTEGER NOT NULL REFERENCES users(id),
///     vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
///     rent_start_date TIMESTAMPTZ NOT NULL,
///     rent_end_date TIMESTAMPTZ NOT NULL,
///     total_price NUMERIC(12, 2) NOT NULL,
///     status booking_status NOT NULL DEFAULT 'active'
/// );
///
/// CREATE UNIQUE INDEX bookings_one_active_per_vehicle
///     ON bookings(vehicle_id) WHERE status = 'active';
/// ```
///
/// Writes go through [`crate::ledger`], which wraps them in transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// Name of the partial unique index that allows one active booking per vehicle
pub const ONE_ACTIVE_PER_VEHICLE: &str = "bookings_one_active_per_vehicle";

/// Lifecycle state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Holds the vehicle in `booked` state
    Active,

    /// Cancelled by the customer before the rental started
    Cancelled,

    /// Vehicle handed back and checked in by an admin
    Returned,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Returned => "returned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Returned)
    }

    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        matches!(
            (self, target),
            (BookingStatus::Active, BookingStatus::Cancelled)
                | (BookingStatus::Active, BookingStatus::Returned)
        )
    }
}

/// A rental record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: i32,

    /// Owner of the booking
    pub customer_id: i32,

    pub vehicle_id: i32,

    pub rent_start_date: DateTime<Utc>,

    /// Strictly after `rent_start_date`
    pub rent_end_date: DateTime<Utc>,

    /// Price fixed when the booking was made
    pub total_price: Decimal,

    pub status: BookingStatus,
}

/// Row to insert for a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub rent_start_date: DateTime<Utc>,
    pub rent_end_date: DateTime<Utc>,
    pub total_price: Decimal,
}

const BOOKING_COLUMNS: &str =
    "id, customer_id, vehicle_id, rent_start_date, rent_end_date, total_price, status";

impl Booking {
    /// Inserts an `active` booking inside the caller's transaction
    pub async fn insert(conn: &mut PgConnection, data: NewBooking) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings \
             (customer_id, vehicle_id, rent_start_date, rent_end_date, total_price, status) \
             VALUES ($1, $2, $3, $4, $5, 'active') \
             RETURNING {BOOKING_COLUMNS}"
        );

        sqlx::query_as::<_, Booking>(&query)
            .bind(data.customer_id)
            .bind(data.vehicle_id)
            .bind(data.rent_start_date)
            .bind(data.rent_end_date)
            .bind(data.total_price)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");

        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Reads a booking and row-locks it for the rest of the transaction
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");

        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Moves an active booking to `target`
    ///
    /// The `status = 'active'` guard makes this a no-op (None) on terminal
    /// bookings.
    pub async fn transition(
        conn: &mut PgConnection,
        id: i32,
        target: BookingStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET status = $2 \
             WHERE id = $1 AND status = 'active' \
             RETURNING {BOOKING_COLUMNS}"
        );

        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(target)
            .fetch_optional(conn)
            .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY id");

        sqlx::query_as::<_, Booking>(&query).fetch_all(pool).await
    }

    pub async fn list_by_customer(
        pool: &PgPool,
        customer_id: i32,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE customer_id = $1 ORDER BY id"
        );

        sqlx::query_as::<_, Booking>(&query)
            .bind(customer_id)
            .fetch_all(pool)
            .await
    }

    pub async fn vehicle_has_active(pool: &PgPool, vehicle_id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE vehicle_id = $1 AND status = 'active')",
        )
        .bind(vehicle_id)
        .fetch_one(pool)
        .await
    }

    pub async fn customer_has_active(
        pool: &PgPool,
        customer_id: i32,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE customer_id = $1 AND status = 'active')",
        )
        .bind(customer_id)
        .fetch_one(pool)
        .await
    }
}
