//! Review persistence operations on the `reviews` table.
//!
//! The `reviews_paper_reviewer_key` constraint backs the one-review-per-pair
//! rule; callers map its violation to a conflict.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cfp_core::{AttendeeId, PaperId, RejectionReason, ReviewDecision, ReviewId, Timestamp};
use cfp_state::Review;

pub async fn insert(pool: &PgPool, record: &Review) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO reviews (id, paper_id, reviewer_id, decision, rejection_reason, comments,
            created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id.0)
    .bind(record.paper_id.0)
    .bind(record.reviewer.0)
    .bind(record.decision.as_str())
    .bind(record.rejection_reason.map(|r| r.as_str()))
    .bind(&record.comments)
    .bind(*record.created_at.as_datetime())
    .bind(*record.updated_at.as_datetime())
    .execute(pool)
    .await?;

    Ok(())
}

/// Write back the reviewer-editable columns.
pub async fn update(pool: &PgPool, record: &Review) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE reviews SET decision = $1, rejection_reason = $2, comments = $3, updated_at = $4
         WHERE id = $5",
    )
    .bind(record.decision.as_str())
    .bind(record.rejection_reason.map(|r| r.as_str()))
    .bind(&record.comments)
    .bind(*record.updated_at.as_datetime())
    .bind(record.id.0)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all reviews from the database on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Review>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, paper_id, reviewer_id, decision, rejection_reason, comments,
            created_at, updated_at
         FROM reviews ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ReviewRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    paper_id: Uuid,
    reviewer_id: Uuid,
    decision: String,
    rejection_reason: Option<String>,
    comments: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_record(self) -> Review {
        let decision = self.decision.parse::<ReviewDecision>().unwrap_or_else(|e| {
            tracing::error!(id = %self.id, error = %e, "unknown review decision in database, using not_reviewed");
            ReviewDecision::NotReviewed
        });
        let rejection_reason = self.rejection_reason.and_then(|raw| {
            raw.parse::<RejectionReason>()
                .map_err(|e| {
                    tracing::error!(id = %self.id, error = %e, "dropping unknown rejection reason");
                })
                .ok()
        });

        Review {
            id: ReviewId::from(self.id),
            paper_id: PaperId::from(self.paper_id),
            reviewer: AttendeeId::from(self.reviewer_id),
            decision,
            rejection_reason,
            comments: self.comments,
            created_at: Timestamp::from_utc(self.created_at),
            updated_at: Timestamp::from_utc(self.updated_at),
        }
    }
}
