//! Conference timeline persistence on `events` and `event_transitions`.
//!
//! `events` holds the eight seeded milestones with exactly one flagged
//! current. Moving the flag and appending the transition row happen in one
//! transaction: the partial unique index rejects a second current row, so
//! the old flag is cleared first.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cfp_core::{AttendeeId, Timestamp};
use cfp_state::{Milestone, Timeline, TimelineTransitionRecord};

/// Rebuild the [`Timeline`] from the current flag and the transition log.
pub async fn load_timeline(pool: &PgPool) -> Result<Timeline, sqlx::Error> {
    let current: Option<(String,)> =
        sqlx::query_as("SELECT milestone FROM events WHERE is_current")
            .fetch_optional(pool)
            .await?;

    let current = match current {
        Some((raw,)) => raw.parse::<Milestone>().unwrap_or_else(|e| {
            tracing::error!(error = %e, "unknown current milestone in database, using signup");
            Milestone::Signup
        }),
        None => {
            tracing::warn!("no current event row, using signup");
            Milestone::Signup
        }
    };

    let rows = sqlx::query_as::<_, TransitionRow>(
        "SELECT from_milestone, to_milestone, actor, reason, occurred_at
         FROM event_transitions ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let transitions = rows
        .into_iter()
        .filter_map(TransitionRow::into_record)
        .collect();

    Ok(Timeline::restore(current, transitions))
}

/// Move the current flag to `record.to_milestone` and log the move.
pub async fn record_transition(
    pool: &PgPool,
    record: &TimelineTransitionRecord,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE events SET is_current = FALSE WHERE is_current")
        .execute(&mut *tx)
        .await?;

    let moved = sqlx::query("UPDATE events SET is_current = TRUE WHERE milestone = $1")
        .bind(record.to_milestone.as_str())
        .execute(&mut *tx)
        .await?;
    if moved.rows_affected() != 1 {
        tx.rollback().await?;
        return Err(sqlx::Error::RowNotFound);
    }

    sqlx::query(
        "INSERT INTO event_transitions (from_milestone, to_milestone, actor, reason, occurred_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(record.from_milestone.as_str())
    .bind(record.to_milestone.as_str())
    .bind(record.actor.map(|a| a.0))
    .bind(&record.reason)
    .bind(*record.timestamp.as_datetime())
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct TransitionRow {
    from_milestone: String,
    to_milestone: String,
    actor: Option<Uuid>,
    reason: String,
    occurred_at: DateTime<Utc>,
}

impl TransitionRow {
    fn into_record(self) -> Option<TimelineTransitionRecord> {
        let parsed = self
            .from_milestone
            .parse::<Milestone>()
            .and_then(|from| self.to_milestone.parse::<Milestone>().map(|to| (from, to)));
        match parsed {
            Ok((from_milestone, to_milestone)) => Some(TimelineTransitionRecord {
                from_milestone,
                to_milestone,
                timestamp: Timestamp::from_utc(self.occurred_at),
                actor: self.actor.map(AttendeeId::from),
                reason: self.reason,
            }),
            Err(e) => {
                tracing::error!(error = %e, "skipping transition row with unknown milestone");
                None
            }
        }
    }
}
