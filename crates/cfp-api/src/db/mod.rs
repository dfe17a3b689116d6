//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx.
//!
//! The database is **optional**. With `DATABASE_URL` set, every mutation
//! is written through and the in-memory stores are hydrated on startup.
//! Without it the service runs in-memory only, which is what the tests use.
//!
//! The schema repeats the uniqueness rules the in-memory layer enforces:
//! one attendee per email, one review per `(paper, reviewer)`, and one
//! current event (a partial unique index).

pub mod attendees;
pub mod events;
pub mod papers;
pub mod reviews;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = connect(&url).await?;
    Ok(Some(pool))
}

/// Connect to `url` and apply the embedded migrations.
pub async fn connect(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Whether `err` is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
