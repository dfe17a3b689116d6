//! Paper persistence operations.
//!
//! A paper spans three tables: `papers`, `paper_themes` and
//! `paper_co_authors`. Writes touch all three inside one transaction.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use cfp_core::{AttendeeId, PaperId, PaperTheme, PaperType, Timestamp};
use cfp_state::{AcceptanceDetails, Paper, PresentationLinks};

/// Insert a new paper with its themes and co-authors.
pub async fn insert(pool: &PgPool, record: &Paper) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO papers (id, paper_type, title, abstract, keywords, primary_author,
            submitted_at, is_accepted, accepted_at, long_form_requested, ssrn_paper_consent,
            ssrn_presentation_consent, scheduled_at, slides, video, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(record.id.0)
    .bind(record.paper_type.as_str())
    .bind(&record.title)
    .bind(&record.abstract_text)
    .bind(&record.keywords)
    .bind(record.primary_author.0)
    .bind(*record.submitted_at.as_datetime())
    .bind(record.is_accepted)
    .bind(record.accepted_at.map(|t| *t.as_datetime()))
    .bind(record.acceptance.long_form_requested)
    .bind(record.acceptance.ssrn_paper_consent)
    .bind(record.acceptance.ssrn_presentation_consent)
    .bind(record.acceptance.scheduled_at.map(|t| *t.as_datetime()))
    .bind(&record.presentation.slides)
    .bind(&record.presentation.video)
    .bind(*record.updated_at.as_datetime())
    .execute(&mut *tx)
    .await?;

    write_associations(&mut tx, record).await?;
    tx.commit().await
}

/// Write back every mutable column and replace the associations.
///
/// Returns `false` if the paper row no longer exists.
pub async fn update(pool: &PgPool, record: &Paper) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE papers SET paper_type = $1, title = $2, abstract = $3, keywords = $4,
            is_accepted = $5, accepted_at = $6, long_form_requested = $7,
            ssrn_paper_consent = $8, ssrn_presentation_consent = $9, scheduled_at = $10,
            slides = $11, video = $12, updated_at = $13
         WHERE id = $14",
    )
    .bind(record.paper_type.as_str())
    .bind(&record.title)
    .bind(&record.abstract_text)
    .bind(&record.keywords)
    .bind(record.is_accepted)
    .bind(record.accepted_at.map(|t| *t.as_datetime()))
    .bind(record.acceptance.long_form_requested)
    .bind(record.acceptance.ssrn_paper_consent)
    .bind(record.acceptance.ssrn_presentation_consent)
    .bind(record.acceptance.scheduled_at.map(|t| *t.as_datetime()))
    .bind(&record.presentation.slides)
    .bind(&record.presentation.video)
    .bind(*record.updated_at.as_datetime())
    .bind(record.id.0)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("DELETE FROM paper_themes WHERE paper_id = $1")
        .bind(record.id.0)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM paper_co_authors WHERE paper_id = $1")
        .bind(record.id.0)
        .execute(&mut *tx)
        .await?;
    write_associations(&mut tx, record).await?;

    tx.commit().await?;
    Ok(true)
}

/// Delete a paper. Themes, co-authors and reviews cascade.
pub async fn delete(pool: &PgPool, id: PaperId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM papers WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all papers from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Paper>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PaperRow>(
        "SELECT id, paper_type, title, abstract, keywords, primary_author, submitted_at,
            is_accepted, accepted_at, long_form_requested, ssrn_paper_consent,
            ssrn_presentation_consent, scheduled_at, slides, video, updated_at
         FROM papers ORDER BY submitted_at",
    )
    .fetch_all(pool)
    .await?;

    let theme_rows: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT paper_id, theme FROM paper_themes")
            .fetch_all(pool)
            .await?;
    let co_author_rows: Vec<(Uuid, Uuid)> =
        sqlx::query_as("SELECT paper_id, attendee_id FROM paper_co_authors")
            .fetch_all(pool)
            .await?;

    let mut themes: HashMap<Uuid, BTreeSet<PaperTheme>> = HashMap::new();
    for (paper_id, theme) in theme_rows {
        match theme.parse::<PaperTheme>() {
            Ok(theme) => {
                themes.entry(paper_id).or_default().insert(theme);
            }
            Err(e) => {
                tracing::error!(paper_id = %paper_id, error = %e, "skipping unknown paper theme");
            }
        }
    }

    let mut co_authors: HashMap<Uuid, BTreeSet<AttendeeId>> = HashMap::new();
    for (paper_id, attendee_id) in co_author_rows {
        co_authors
            .entry(paper_id)
            .or_default()
            .insert(AttendeeId::from(attendee_id));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let paper_themes = themes.remove(&row.id).unwrap_or_default();
            let paper_co_authors = co_authors.remove(&row.id).unwrap_or_default();
            row.into_record(paper_themes, paper_co_authors)
        })
        .collect())
}

async fn write_associations(
    tx: &mut Transaction<'_, Postgres>,
    record: &Paper,
) -> Result<(), sqlx::Error> {
    for theme in &record.themes {
        sqlx::query("INSERT INTO paper_themes (paper_id, theme) VALUES ($1, $2)")
            .bind(record.id.0)
            .bind(theme.as_str())
            .execute(&mut **tx)
            .await?;
    }
    for co_author in &record.co_authors {
        sqlx::query("INSERT INTO paper_co_authors (paper_id, attendee_id) VALUES ($1, $2)")
            .bind(record.id.0)
            .bind(co_author.0)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct PaperRow {
    id: Uuid,
    paper_type: String,
    title: String,
    #[sqlx(rename = "abstract")]
    abstract_text: String,
    keywords: String,
    primary_author: Uuid,
    submitted_at: DateTime<Utc>,
    is_accepted: bool,
    accepted_at: Option<DateTime<Utc>>,
    long_form_requested: bool,
    ssrn_paper_consent: bool,
    ssrn_presentation_consent: bool,
    scheduled_at: Option<DateTime<Utc>>,
    slides: Option<String>,
    video: Option<String>,
    updated_at: DateTime<Utc>,
}

impl PaperRow {
    fn into_record(
        self,
        themes: BTreeSet<PaperTheme>,
        co_authors: BTreeSet<AttendeeId>,
    ) -> Paper {
        let paper_type = self.paper_type.parse::<PaperType>().unwrap_or_else(|e| {
            tracing::error!(id = %self.id, error = %e, "unknown paper type in database, using default");
            PaperType::default()
        });

        Paper {
            id: PaperId::from(self.id),
            paper_type,
            title: self.title,
            abstract_text: self.abstract_text,
            keywords: self.keywords,
            themes,
            primary_author: AttendeeId::from(self.primary_author),
            co_authors,
            submitted_at: Timestamp::from_utc(self.submitted_at),
            is_accepted: self.is_accepted,
            accepted_at: self.accepted_at.map(Timestamp::from_utc),
            acceptance: AcceptanceDetails {
                long_form_requested: self.long_form_requested,
                ssrn_paper_consent: self.ssrn_paper_consent,
                ssrn_presentation_consent: self.ssrn_presentation_consent,
                scheduled_at: self.scheduled_at.map(Timestamp::from_utc),
            },
            presentation: PresentationLinks {
                slides: self.slides,
                video: self.video,
            },
            updated_at: Timestamp::from_utc(self.updated_at),
        }
    }
}
