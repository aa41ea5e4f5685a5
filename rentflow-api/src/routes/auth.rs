/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/signup` - Create an account
/// - `POST /auth/signin` - Exchange credentials for a bearer token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
    response::ApiResponse,
};
use axum::extract::State;
use rentflow_shared::{
    auth::{
        jwt::{create_token, Claims},
        password,
    },
    models::user::{CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 32, message = "Phone is required"))]
    pub phone: String,

    /// Defaults to `customer`
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Signin request
#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Signin response
#[derive(Debug, Serialize)]
pub struct SigninResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,

    pub user: User,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/signup
/// Content-Type: application/json
///
/// {
///   "name": "Jane Doe",
///   "email": "jane@example.com",
///   "password": "secret123",
///   "phone": "01700000000"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> ApiResult<ApiResponse<User>> {
    req.validate()?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    // A concurrent signup with the same email still hits the unique index
    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            phone: req.phone,
            role: req.role.unwrap_or_default(),
        },
    )
    .await?;

    info!(user_id = user.id, role = user.role.as_str(), "User registered");

    Ok(ApiResponse::created("User registered successfully", user))
}

/// Sign in with email and password
///
/// # Endpoint
///
/// ```text
/// POST /auth/signin
/// Content-Type: application/json
///
/// { "email": "jane@example.com", "password": "secret123" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (indistinguishable)
pub async fn signin(
    State(state): State<AppState>,
    AppJson(req): AppJson<SigninRequest>,
) -> ApiResult<ApiResponse<SigninResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = match User::find_by_email(&state.db, &req.email).await? {
        Some(user) => user,
        None => {
            warn!("Signin failed: unknown email");
            return Err(invalid());
        }
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "Signin failed: wrong password");
        return Err(invalid());
    }

    let claims = Claims::new(user.id, user.role, state.config.token_lifetime());
    let token = create_token(&claims, state.jwt_secret())?;

    info!(user_id = user.id, "User signed in");

    Ok(ApiResponse::ok(
        "Login successful",
        SigninResponse { token, user },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_role_defaults_to_none() {
        let req: SignupRequest = serde_json::from_value(serde_json::json!({
            "name": "Jane",
            "email": "jane@example.com",
            "password": "secret123",
            "phone": "01700000000"
        }))
        .unwrap();

        assert!(req.role.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_signup_rejects_short_password() {
        let req = SignupRequest {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "abc".to_string(),
            phone: "01700000000".to_string(),
            role: None,
        };

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_signin_rejects_bad_email() {
        let req = SigninRequest {
            email: "jane".to_string(),
            password: "secret123".to_string(),
        };

        assert!(req.validate().is_err());
    }
}
