/// Bearer-token authentication
///
/// [`authenticate`] reads `Authorization: Bearer <jwt>`, validates the token
/// and resolves the caller into an [`AuthContext`]. The API server runs it in
/// a middleware layer and stores the context in the request extensions, so
/// requests without a valid token are rejected before any handler runs.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap};
/// use rentflow_shared::auth::middleware::{authenticate, AuthError};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
///
/// let result = authenticate(&headers, "secret-key-at-least-32-bytes-long!");
/// assert!(matches!(result, Err(AuthError::InvalidFormat(_))));
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use super::jwt::{validate_token, JwtError};
use crate::models::user::UserRole;

/// Identity of the caller, resolved from the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i32,
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: i32, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid token issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

/// Resolves the caller from request headers
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, secret)?;

    Ok(AuthContext::new(claims.sub, claims.role))
}
