/// Embedded database migrations
///
/// The SQL files in the workspace `migrations/` directory are compiled into the
/// binary with `sqlx::migrate!` and applied at startup. Each file runs in its
/// own transaction; a failing migration leaves the schema at the previous
/// version.
///
/// # Example
///
/// ```no_run
/// use rentflow_shared::db::pool::{create_pool, DatabaseConfig};
/// use rentflow_shared::db::migrations::run_migrations;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::{migrate::Migrator, postgres::PgPool};
use tracing::{info, warn};

/// Migrations shipped with this crate
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(
        available = MIGRATOR.iter().count(),
        "Running database migrations"
    );

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}
