//! # Rentflow Shared Library
//!
//! This crate contains the domain types, persistence and booking rules used by
//! the Rentflow API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, vehicles, bookings) and their queries
//! - `ledger`: Booking lifecycle (create, list, cancel, return) and its invariants
//! - `auth`: Password hashing, JWT tokens, request authentication and authorization
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod ledger;
pub mod models;

/// Current version of the Rentflow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
