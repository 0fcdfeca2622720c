/// Embedded schema migrations
///
/// The SQL files under the workspace `migrations/` directory are compiled
/// into the binary, so a deployed server carries its own schema.
///
/// ```no_run
/// use taskboard_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::migrate::{MigrateDatabase, MigrateError, Migrator};
use sqlx::{postgres::PgPool, Postgres};
use tracing::{debug, error, info};

/// Users, projects and memberships, invitations, tasks with history,
/// notifications
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applies every migration not yet recorded in `_sqlx_migrations`
///
/// A failing migration is rolled back and the error returned; earlier ones
/// stay applied.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let available = MIGRATOR.iter().count();
    info!(available, "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Creates the database named in `database_url` when it is missing
///
/// Local and test setups call this before [`run_migrations`]; a production
/// role without `CREATEDB` only needs the database to exist already.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
        return Ok(());
    }

    info!("Creating missing database");
    Postgres::create_database(database_url).await
}
