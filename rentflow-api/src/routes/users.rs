/// User management endpoints
///
/// # Endpoints
///
/// - `GET    /users`     - List accounts (admin)
/// - `PUT    /users/:id` - Update name, phone or role (self or admin; only admins change roles)
/// - `DELETE /users/:id` - Remove an account without active bookings (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    response::ApiResponse,
};
use axum::{extract::State, Extension};
use rentflow_shared::{
    auth::{
        authorization::{require_admin, require_role_change_allowed, require_self_or_admin},
        middleware::AuthContext,
    },
    models::{
        booking::Booking,
        user::{User, UserPatch, UserRole},
    },
};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

/// Update user request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 32, message = "Phone cannot be empty"))]
    pub phone: Option<String>,

    pub role: Option<UserRole>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(req: UpdateUserRequest) -> Self {
        UserPatch {
            name: req.name,
            phone: req.phone,
            role: req.role,
        }
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<ApiResponse<Vec<User>>> {
    require_admin(&auth)?;

    let users = User::list(&state.db).await?;

    Ok(ApiResponse::ok("Users retrieved successfully", users))
}

/// Update a user
///
/// Customers may edit only their own account and may not send `role`.
///
/// # Errors
///
/// - `400 Bad Request`: Empty patch
/// - `403 Forbidden`: Not your account, or a customer changing a role
/// - `404 Not Found`: No such user
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(user_id): AppPath<i32>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> ApiResult<ApiResponse<User>> {
    require_self_or_admin(&auth, user_id)?;
    require_role_change_allowed(&auth, req.role.is_some())?;
    req.validate()?;

    let patch = UserPatch::from(req);
    if patch.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let user = User::update(&state.db, user_id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id, updated_by = auth.user_id, "User updated");

    Ok(ApiResponse::ok("User updated successfully", user))
}

/// Delete a user
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: No such user
/// - `409 Conflict`: User has an active booking, or booking history still
///   references the account
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppPath(user_id): AppPath<i32>,
) -> ApiResult<ApiResponse<()>> {
    require_admin(&auth)?;

    if Booking::customer_has_active(&state.db, user_id).await? {
        warn!(user_id, "User delete refused: active booking exists");
        return Err(ApiError::Conflict(
            "Cannot delete user with active bookings".to_string(),
        ));
    }

    if !User::delete(&state.db, user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(user_id, admin_id = auth.user_id, "User deleted");

    Ok(ApiResponse::message("User deleted successfully"))
}
