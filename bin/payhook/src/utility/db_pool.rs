use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use eyre::{eyre, Report};
use payhook_core::stores::postgres::DbPool;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn create_db_pool() -> Result<DbPool, Report> {
    let db_url = SecretString::new(Box::from(
        env::var("DATABASE_URL").map_err(|_| eyre!("DATABASE_URL must be set"))?,
    ));

    let manager = ConnectionManager::<PgConnection>::new(db_url.expose_secret());

    let pool = Pool::builder()
        .max_size(20)
        .min_idle(Some(2))
        .connection_timeout(Duration::from_secs(8))
        .idle_timeout(Some(Duration::from_secs(300)))
        .max_lifetime(Some(Duration::from_secs(1800))) // 30 minutes
        .test_on_check_out(true)
        .build(manager)?;

    info!("PostgreSQL connection pool created (max_size: 20)");

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Report> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to run migrations: {e}"))?;

    if applied.is_empty() {
        info!("Database schema up to date");
    } else {
        info!("Applied {} pending migrations", applied.len());
    }
    Ok(())
}
