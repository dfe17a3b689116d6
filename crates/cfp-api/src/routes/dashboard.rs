//! # Dashboard
//!
//! The landing page every denial redirects to. It shows the current
//! milestone, the sections open at that milestone, and for signed-in
//! callers their own papers and reviews.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cfp_state::{open_sections, Paper, Review};

use crate::auth::{resolve_actor, Caller};
use crate::error::AppError;
use crate::presentation::{paper_summary, AttendeeView, PaperSummary, ReviewView};
use crate::routes::events::{milestone_views, MilestoneView};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardView {
    pub current_milestone: String,
    pub current_label: String,
    pub events: Vec<MilestoneView>,
    /// Dashboard sections shown at the current milestone.
    pub open_sections: Vec<String>,
    /// `None` for anonymous callers.
    pub attendee: Option<AttendeeView>,
    pub my_papers: Vec<PaperSummary>,
    pub my_reviews: Vec<ReviewView>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/dashboard", get(dashboard))
}

/// GET /v1/dashboard — Caller's landing page.
#[utoipa::path(
    get,
    path = "/v1/dashboard",
    responses((status = 200, description = "Dashboard", body = DashboardView)),
    tag = "dashboard"
)]
async fn dashboard(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<DashboardView>, AppError> {
    let viewer = resolve_actor(&state, &caller)?;
    let (current, events) = {
        let timeline = state.timeline.read();
        (timeline.current(), milestone_views(&timeline))
    };

    let mut view = DashboardView {
        current_milestone: current.as_str().to_string(),
        current_label: current.label().to_string(),
        events,
        open_sections: open_sections(current)
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
        attendee: None,
        my_papers: Vec::new(),
        my_reviews: Vec::new(),
    };

    let Some(actor) = viewer else {
        return Ok(Json(view));
    };

    if let Some(attendee) = state.attendees.get(&actor.id) {
        view.attendee = Some(AttendeeView::new(&attendee, &actor.capabilities, true));
    }

    let mut papers: Vec<Paper> = state
        .papers
        .list()
        .into_iter()
        .filter(|p| p.is_author(actor.id))
        .collect();
    papers.sort_by_key(|p| (p.submitted_at, p.id));
    view.my_papers = papers.iter().map(|p| paper_summary(&state, p)).collect();

    let registry = state.reviews.read();
    let mut reviews: Vec<&Review> = registry
        .iter()
        .filter(|r| r.reviewer == actor.id)
        .collect();
    reviews.sort_by_key(|r| (r.created_at, r.id));
    view.my_reviews = reviews.into_iter().map(ReviewView::from).collect();

    Ok(Json(view))
}
