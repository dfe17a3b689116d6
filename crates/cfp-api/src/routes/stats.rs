//! # Statistics
//!
//! Organizer-only aggregates: review progress and score distribution,
//! attendance headcounts, the cumulative submissions curve, and attendees
//! registered under a single name.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cfp_state::stats::{
    attendance_stats, cfp_opened_on, review_stats, single_name_attendees, submissions_over_time,
};
use cfp_state::{AttendanceStats, Attendee, Paper, ReviewStats, SubmissionPoint};

use crate::auth::{require_actor, require_organizer, Caller};
use crate::error::AppError;
use crate::presentation::AttendeeView;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    /// Date the call for papers opened (`YYYY-MM-DD`). Defaults to the
    /// timeline's move into `call_for_papers`.
    pub cfp_open: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsView {
    #[schema(value_type = Object)]
    pub reviews: ReviewStats,
    #[schema(value_type = Object)]
    pub attendance: AttendanceStats,
    pub cfp_opened_on: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub submissions_over_time: Vec<SubmissionPoint>,
    pub single_name_attendees: Vec<AttendeeView>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/stats", get(get_stats))
}

/// GET /v1/stats — Organizer statistics.
#[utoipa::path(
    get,
    path = "/v1/stats",
    params(("cfp_open" = Option<String>, Query, description = "CFP opening date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Statistics", body = StatsView),
        (status = 303, description = "Caller is not an organizer"),
        (status = 422, description = "Invalid cfp_open date", body = crate::error::ErrorBody),
    ),
    tag = "stats"
)]
async fn get_stats(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsView>, AppError> {
    let actor = require_actor(&state, &caller)?;
    require_organizer(&actor)?;

    let explicit_open = query
        .cfp_open
        .as_deref()
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| AppError::Validation(format!("invalid cfp_open date {raw:?}: {e}")))
        })
        .transpose()?;

    let attendees = state.attendees.list();
    let papers = state.papers.list();
    let attendee_refs: Vec<&Attendee> = attendees.iter().collect();
    let paper_refs: Vec<&Paper> = papers.iter().collect();

    let cfp_open = match explicit_open {
        Some(date) => Some(date),
        None => cfp_opened_on(&state.timeline.read(), papers.iter()),
    };
    let curve = cfp_open
        .map(|open| submissions_over_time(papers.iter(), open))
        .unwrap_or_default();

    let reviews = {
        let registry = state.reviews.read();
        review_stats(papers.iter(), registry.iter())
    };

    let single_names = single_name_attendees(attendees.iter())
        .into_iter()
        .map(|a| AttendeeView::new(a, &a.effective_capabilities(papers.iter()), true))
        .collect();

    Ok(Json(StatsView {
        reviews,
        attendance: attendance_stats(&attendee_refs, &paper_refs),
        cfp_opened_on: cfp_open.map(|d| d.format("%Y-%m-%d").to_string()),
        submissions_over_time: curve,
        single_name_attendees: single_names,
    }))
}
