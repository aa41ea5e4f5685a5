/// Database models for Rentflow
///
/// # Models
///
/// - `user`: Accounts with an `admin` or `customer` role
/// - `vehicle`: Rentable vehicles and their availability flag
/// - `booking`: Rental records; written through [`crate::ledger`]
///
/// Pool-level queries take `&PgPool`. Queries that must run inside a booking
/// transaction take `&mut PgConnection` so the caller controls the
/// transaction boundary.

pub mod booking;
pub mod user;
pub mod vehicle;
