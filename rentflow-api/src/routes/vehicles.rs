/// Vehicle endpoints
///
/// # Endpoints
///
/// - `GET    /vehicles`     - List the fleet (public)
/// - `GET    /vehicles/:id` - One vehicle (public)
/// - `POST   /vehicles`     - Add a vehicle (admin)
/// - `PUT    /vehicles/:id` - Patch a vehicle (admin)
/// - `DELETE /vehicles/:id` - Remove a vehicle without active bookings (admin)
///
/// Availability is not writable here; only the booking ledger flips it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{AppJson, AppPath},
    response::ApiResponse,
};
use axum::{extract::State, Extension};
use rentflow_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::{
        booking::Booking,
        vehicle::{CreateVehicle, Vehicle, VehiclePatch, VehicleType, MAX_DAILY_RENT_PRICE},
    },
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

/// Create vehicle request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 100, message = "Vehicle name is required"))]
    pub vehicle_name: String,

    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,

    #[validate(length(min = 1, max = 50, message = "Registration number is required"))]
    pub registration_number: String,

    #[validate(custom(function = "valid_price"))]
    pub daily_rent_price: Decimal,
}

/// Update vehicle request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 100, message = "Vehicle name cannot be empty"))]
    pub vehicle_name: Option<String>,

    #[serde(rename = "type")]
    pub vehicle_type: Option<VehicleType>,

    #[validate(length(min = 1, max = 50, message = "Registration number cannot be empty"))]
    pub registration_number: Option<String>,

    pub daily_rent_price: Option<Decimal>,
}

/// Positive, whole cents, and within the column's precision
fn valid_price(price: &Decimal) -> Result<(), ValidationError> {
    let (code, message) = if !price.is_sign_positive() || price.is_zero() {
        ("positive", "Daily rent price must be greater than zero")
    } else if *price > MAX_DAILY_RENT_PRICE {
        ("range", "Daily rent price must be less than 100000000")
    } else if price.normalize().scale() > 2 {
        ("precision", "Daily rent price must have at most 2 decimal places")
    } else {
        return Ok(());
    };

    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    Err(error)
}

impl UpdateVehicleRequest {
    fn into_patch(self) -> ApiResult<VehiclePatch> {
        if let Some(price) = &self.daily_rent_price {
            valid_price(price).map_err(|e| {
                ApiError::ValidationError(vec![ValidationErrorDetail {
                    field: "daily_rent_price".to_string(),
                    message: e
                        .message
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                }])
            })?;
        }

        let patch = VehiclePatch {
            vehicle_name: self.vehicle_name,
            vehicle_type: self.vehicle_type,
            registration_number: self.registration_number,
            daily_rent_price: self.daily_rent_price,
        };

        if patch.is_empty() {
            return Err(ApiError::BadRequest("No fields to update".to_string()));
        }

        Ok(patch)
    }
}

pub async fn list_vehicles(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<Vehicle>>> {
    let vehicles = Vehicle::list(&state.db).await?;

    let message = if vehicles.is_empty() {
        "No vehicles found"
    } else {
        "Vehicles retrieved successfully"
    };

    Ok(ApiResponse::ok(message, vehicles))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    AppPath(vehicle_id): AppPath<i32>,
) -> ApiResult<ApiResponse<Vehicle>> {
    let vehicle = Vehicle::find_by_id(&state.db, vehicle_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vehicle not found".to_string()))?;

    Ok(ApiResponse::ok("Vehicle retrieved successfully", vehicle))
}

/// Add a vehicle to the fleet
///
/// New vehicles start `available`.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `409 Conflict`: Registration number already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreateVehicleRequest>,
) -> ApiResult<ApiResponse<Vehicle>> {
    require_admin(&auth)?;
    req.validate()?;

    let vehicle = Vehicle::create(
        &state.db,
        CreateVehicle {
            vehicle_name: req.vehicle_name,
            vehicle_type: req.vehicle_type,
            registration_number: req.registration_number,
            daily_rent_price: req.daily_rent_price,
        },
    )
    .await?;

    info!(vehicle_id = vehicle.id, admin_id = auth.user_id, "Vehicle created");

    Ok(ApiResponse::created("Vehicle created successfully", vehicle))
}

/// Patch a vehicle
///
/// # Errors
///
/// - `400 Bad Request`: Empty patch
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: No such vehicle
/// - `409 Conflict`: Registration number already exists
pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(vehicle_id): AppPath<i32>,
    AppJson(req): AppJson<UpdateVehicleRequest>,
) -> ApiResult<ApiResponse<Vehicle>> {
    require_admin(&auth)?;
    req.validate()?;

    let patch = req.into_patch()?;

    let vehicle = Vehicle::update(&state.db, vehicle_id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vehicle not found".to_string()))?;

    info!(vehicle_id, admin_id = auth.user_id, "Vehicle updated");

    Ok(ApiResponse::ok("Vehicle updated successfully", vehicle))
}

/// Remove a vehicle
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: No such vehicle
/// - `409 Conflict`: Vehicle has an active booking, or booking history
///   still references it
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(vehicle_id): AppPath<i32>,
) -> ApiResult<ApiResponse<()>> {
    require_admin(&auth)?;

    if Booking::vehicle_has_active(&state.db, vehicle_id).await? {
        warn!(vehicle_id, "Vehicle delete refused: active booking exists");
        return Err(ApiError::Conflict(
            "Cannot delete vehicle with active bookings".to_string(),
        ));
    }

    if !Vehicle::delete(&state.db, vehicle_id).await? {
        return Err(ApiError::NotFound("Vehicle not found".to_string()));
    }

    info!(vehicle_id, admin_id = auth.user_id, "Vehicle deleted");

    Ok(ApiResponse::message("Vehicle deleted successfully"))
}
