//! Attendee persistence operations on the `attendees` table.
//!
//! Only stored capabilities are persisted. Speaker eligibility is derived
//! from papers and has no column.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cfp_core::{AttendeeId, EmailAddress, Organization, TimeZone, Timestamp};
use cfp_state::{Attendee, CapabilitySet};

const SELECT_COLUMNS: &str = "SELECT id, email, name, organization, time_zone, \
     interested_in_volunteering, interested_in_speaking, is_reviewer, is_organizer, \
     speaker_bio, speaker_avatar, registered_at, updated_at FROM attendees";

/// Insert a newly registered attendee.
///
/// A duplicate email surfaces as a unique violation; see
/// [`super::is_unique_violation`].
pub async fn insert(pool: &PgPool, record: &Attendee) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO attendees (id, email, name, organization, time_zone,
            interested_in_volunteering, interested_in_speaking, is_reviewer, is_organizer,
            speaker_bio, speaker_avatar, registered_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(record.id.0)
    .bind(record.email.as_str())
    .bind(&record.name)
    .bind(record.organization.as_str())
    .bind(record.time_zone.label())
    .bind(record.interested_in_volunteering)
    .bind(record.interested_in_speaking)
    .bind(record.capabilities.is_reviewer())
    .bind(record.capabilities.is_organizer())
    .bind(&record.speaker_bio)
    .bind(&record.speaker_avatar)
    .bind(*record.registered_at.as_datetime())
    .bind(*record.updated_at.as_datetime())
    .execute(pool)
    .await?;

    Ok(())
}

/// Write back every mutable column. Returns `false` if the row is gone.
pub async fn update(pool: &PgPool, record: &Attendee) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE attendees SET name = $1, organization = $2, time_zone = $3,
            interested_in_volunteering = $4, interested_in_speaking = $5,
            is_reviewer = $6, is_organizer = $7, speaker_bio = $8, speaker_avatar = $9,
            updated_at = $10
         WHERE id = $11",
    )
    .bind(&record.name)
    .bind(record.organization.as_str())
    .bind(record.time_zone.label())
    .bind(record.interested_in_volunteering)
    .bind(record.interested_in_speaking)
    .bind(record.capabilities.is_reviewer())
    .bind(record.capabilities.is_organizer())
    .bind(&record.speaker_bio)
    .bind(&record.speaker_avatar)
    .bind(*record.updated_at.as_datetime())
    .bind(record.id.0)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Fetch an attendee by email.
pub async fn find_by_email(
    pool: &PgPool,
    email: &EmailAddress,
) -> Result<Option<Attendee>, sqlx::Error> {
    let row = sqlx::query_as::<_, AttendeeRow>(&format!("{SELECT_COLUMNS} WHERE email = $1"))
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(AttendeeRow::into_record))
}

/// Load all attendees from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Attendee>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AttendeeRow>(&format!("{SELECT_COLUMNS} ORDER BY registered_at"))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().filter_map(AttendeeRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct AttendeeRow {
    id: Uuid,
    email: String,
    name: String,
    organization: String,
    time_zone: String,
    interested_in_volunteering: bool,
    interested_in_speaking: bool,
    is_reviewer: bool,
    is_organizer: bool,
    speaker_bio: String,
    speaker_avatar: Option<String>,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AttendeeRow {
    /// Rows with an unparseable email are skipped. Unknown catalog values
    /// fall back to defaults so one bad column does not hide the attendee.
    fn into_record(self) -> Option<Attendee> {
        let email = match EmailAddress::parse(&self.email) {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(id = %self.id, error = %e, "skipping attendee row with invalid email");
                return None;
            }
        };
        let organization = self.organization.parse::<Organization>().unwrap_or_else(|e| {
            tracing::error!(id = %self.id, error = %e, "unknown organization in database, using external");
            Organization::External
        });
        let time_zone = self.time_zone.parse::<TimeZone>().unwrap_or_else(|e| {
            tracing::error!(id = %self.id, error = %e, "unknown time zone in database, using UTC");
            TimeZone::UTC
        });

        Some(Attendee {
            id: AttendeeId::from(self.id),
            email,
            name: self.name,
            organization,
            time_zone,
            interested_in_volunteering: self.interested_in_volunteering,
            interested_in_speaking: self.interested_in_speaking,
            capabilities: CapabilitySet::from_flags(self.is_reviewer, self.is_organizer),
            speaker_bio: self.speaker_bio,
            speaker_avatar: self.speaker_avatar,
            registered_at: Timestamp::from_utc(self.registered_at),
            updated_at: Timestamp::from_utc(self.updated_at),
        })
    }
}
