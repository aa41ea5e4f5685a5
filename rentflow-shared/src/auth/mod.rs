/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: HS256 token issue and validation
/// - [`middleware`]: Bearer token extraction into an [`middleware::AuthContext`]
/// - [`authorization`]: Admin and ownership checks

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
