//! # cfp-cli — CFP Portal Operator CLI
//!
//! Operator tooling that works directly against the portal database,
//! for the jobs an operator needs before any organizer can sign in.
//!
//! ## Subcommands
//!
//! - `event` — Show the timeline, advance it, or jump to a milestone
//! - `attendee` — Show an attendee, grant or revoke stored capabilities
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the database work.
//! - Domain rules come from `cfp-state`; persistence from `cfp_api::db`.
//! - A running API server keeps its own in-memory copy; restart it to
//!   pick up changes made here.

pub mod attendee;
pub mod event;

use anyhow::{Context, Result};
use sqlx::PgPool;

/// Connect to `DATABASE_URL` and apply pending migrations.
pub async fn connect() -> Result<PgPool> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    cfp_api::db::connect(&url)
        .await
        .context("failed to connect to the database")
}
