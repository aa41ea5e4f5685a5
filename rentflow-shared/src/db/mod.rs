/// Database layer for Rentflow
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with acquire timeouts and a health check
/// - `migrations`: Embedded migration runner
///
/// The pool is created once at startup and handed to request handlers through
/// application state. Nothing in this crate keeps a global pool.
///
/// # Example
///
/// ```no_run
/// use rentflow_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
