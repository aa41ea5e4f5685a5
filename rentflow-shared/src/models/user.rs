/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'customer');
///
/// CREATE TABLE users (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE CHECK (email = LOWER(email)),
///     password_hash VARCHAR(255) NOT NULL,
///     phone VARCHAR(32) NOT NULL,
///     role user_role NOT NULL DEFAULT 'customer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use rentflow_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "Jane@Example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     phone: "+15550100".to_string(),
///     role: UserRole::Customer,
/// })
/// .await?;
///
/// assert_eq!(user.email, "jane@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// What a user may do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Manages vehicles and users, checks in returned vehicles
    Admin,

    /// Books vehicles for themselves
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Customer => "customer",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Customer
    }
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,

    pub name: String,

    /// Lower-case, unique
    pub email: String,

    /// Argon2id PHC string; never leaves the server
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub phone: String,

    pub role: UserRole,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,

    /// Normalized to lower case before insert
    pub email: String,

    /// Argon2id hash, not the plaintext password
    pub password_hash: String,

    pub phone: String,

    pub role: UserRole,
}

/// Partial update of a user
///
/// Email and password are not patchable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.role.is_none()
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, role, created_at";

impl User {
    /// Inserts a user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` if the email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, phone, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.name)
            .bind(data.email.trim().to_lowercase())
            .bind(data.password_hash)
            .bind(data.phone)
            .bind(data.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await
    }

    /// Newest accounts first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");

        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Applies a patch; None if the user doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: i32,
        patch: UserPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        if patch.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if patch.name.is_some() {
            bind_count += 1;
            assignments.push(format!("name = ${}", bind_count));
        }
        if patch.phone.is_some() {
            bind_count += 1;
            assignments.push(format!("phone = ${}", bind_count));
        }
        if patch.role.is_some() {
            bind_count += 1;
            assignments.push(format!("role = ${}", bind_count));
        }

        let query = format!(
            "UPDATE users SET {} WHERE id = $1 RETURNING {USER_COLUMNS}",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = patch.name {
            q = q.bind(name);
        }
        if let Some(phone) = patch.phone {
            q = q.bind(phone);
        }
        if let Some(role) = patch.role {
            q = q.bind(role);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user; returns false if the user didn't exist
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
