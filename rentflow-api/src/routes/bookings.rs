/// Booking endpoints
///
/// Thin HTTP layer over [`rentflow_shared::ledger`]; every state change runs
/// in a ledger transaction.
///
/// # Endpoints
///
/// - `POST /bookings`            - Book a vehicle for the caller
/// - `GET  /bookings`            - Admins see all bookings, customers their own
/// - `PUT  /bookings/:id/cancel` - Owner cancels before the rental starts
/// - `PUT  /bookings/:id/return` - Admin checks the vehicle back in

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{AppJson, AppPath},
    response::ApiResponse,
};
use axum::{extract::State, Extension};
use chrono::{DateTime, NaiveDate, Utc};
use rentflow_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    ledger::{self, BookingRequest},
    models::booking::Booking,
};
use serde::{Deserialize, Deserializer};

/// Create booking request
///
/// Dates are either `YYYY-MM-DD` (midnight UTC) or RFC 3339 timestamps.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub vehicle_id: i32,

    #[serde(deserialize_with = "deserialize_rent_date")]
    pub rent_start_date: DateTime<Utc>,

    #[serde(deserialize_with = "deserialize_rent_date")]
    pub rent_end_date: DateTime<Utc>,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(req: CreateBookingRequest) -> Self {
        BookingRequest {
            vehicle_id: req.vehicle_id,
            rent_start_date: req.rent_start_date,
            rent_end_date: req.rent_end_date,
        }
    }
}

fn parse_rent_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

fn deserialize_rent_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    parse_rent_date(raw.trim()).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid date {:?}, expected YYYY-MM-DD or an RFC 3339 timestamp",
            raw
        ))
    })
}

/// Book a vehicle
///
/// # Endpoint
///
/// ```text
/// POST /bookings
/// Authorization: Bearer <token>
///
/// { "vehicle_id": 1, "rent_start_date": "2024-01-01", "rent_end_date": "2024-01-04" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: End date not after start date
/// - `404 Not Found`: No such vehicle
/// - `409 Conflict`: Vehicle not available
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateBookingRequest>,
) -> ApiResult<ApiResponse<Booking>> {
    let booking = ledger::create_booking(&state.db, auth.user_id, req.into()).await?;

    Ok(ApiResponse::created("Booking created successfully", booking))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<ApiResponse<Vec<Booking>>> {
    let bookings = ledger::list_bookings(&state.db, &auth).await?;

    let message = if auth.is_admin() {
        "Bookings retrieved successfully"
    } else {
        "Your bookings retrieved successfully"
    };

    Ok(ApiResponse::ok(message, bookings))
}

/// Cancel a booking
///
/// # Errors
///
/// - `403 Forbidden`: Not the caller's booking
/// - `404 Not Found`: No such booking
/// - `422 Unprocessable Entity`: Rental already started or booking already closed
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(booking_id): AppPath<i32>,
) -> ApiResult<ApiResponse<Booking>> {
    let booking = ledger::cancel_booking(&state.db, booking_id, auth.user_id, Utc::now()).await?;

    Ok(ApiResponse::ok("Booking cancelled successfully", booking))
}

/// Mark a booking returned
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: No such booking
/// - `422 Unprocessable Entity`: Booking already closed
pub async fn return_booking(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(booking_id): AppPath<i32>,
) -> ApiResult<ApiResponse<Booking>> {
    require_admin(&auth)?;

    let booking = ledger::return_booking(&state.db, booking_id, &auth).await?;

    Ok(ApiResponse::ok(
        "Booking marked as returned. Vehicle is now available",
        booking,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_only_is_midnight_utc() {
        assert_eq!(
            parse_rent_date("2024-01-04"),
            Some(Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_rfc3339_keeps_time_and_offset() {
        assert_eq!(
            parse_rent_date("2024-01-01T12:00:00+06:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_garbage_date_is_rejected() {
        assert_eq!(parse_rent_date("next tuesday"), None);
        assert_eq!(parse_rent_date("2024-02-30"), None);
    }

    #[test]
    fn test_request_deserializes_into_ledger_request() {
        let req: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "vehicle_id": 1,
            "rent_start_date": "2024-01-01",
            "rent_end_date": "2024-01-04T00:00:00Z"
        }))
        .unwrap();

        let ledger_req = BookingRequest::from(req);
        assert_eq!(ledger_req.vehicle_id, 1);
        assert_eq!(
            ledger_req.rent_end_date - ledger_req.rent_start_date,
            chrono::Duration::days(3)
        );
    }

    #[test]
    fn test_bad_date_fails_deserialization() {
        let result = serde_json::from_value::<CreateBookingRequest>(serde_json::json!({
            "vehicle_id": 1,
            "rent_start_date": "01/01/2024",
            "rent_end_date": "2024-01-04"
        }));

        assert!(result.is_err());
    }
}
