/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Banner and health check
/// - `auth`: Signup and signin
/// - `vehicles`: Fleet management
/// - `users`: Account management
/// - `bookings`: Booking lifecycle

pub mod auth;
pub mod bookings;
pub mod health;
pub mod users;
pub mod vehicles;
