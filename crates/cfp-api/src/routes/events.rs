//! # Timeline Routes
//!
//! `GET /v1/events` is public. Moving the current milestone is an organizer
//! action: `advance` steps forward by one, `current` jumps to a named
//! milestone and needs `allow_rewind` to go backwards.
//!
//! The move is applied in memory under the timeline lock, the lock is
//! released, and the transition is then written through. A failed write
//! restores the previous timeline.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cfp_core::AttendeeId;
use cfp_state::{Milestone, Timeline, TimelineError, TimelineTransitionEvidence, TimelineTransitionRecord};

use crate::auth::{require_actor, require_organizer, resolve_actor, Caller};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

// -- DTOs ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MilestoneView {
    pub milestone: String,
    pub sequence: i32,
    pub label: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransitionView {
    pub from: String,
    pub to: String,
    pub timestamp: String,
    #[schema(value_type = Option<String>)]
    pub actor: Option<AttendeeId>,
    pub reason: String,
}

impl From<&TimelineTransitionRecord> for TransitionView {
    fn from(record: &TimelineTransitionRecord) -> Self {
        Self {
            from: record.from_milestone.as_str().to_string(),
            to: record.to_milestone.as_str().to_string(),
            timestamp: record.timestamp.to_iso8601(),
            actor: record.actor,
            reason: record.reason.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimelineView {
    pub current: String,
    pub events: Vec<MilestoneView>,
    /// Transition log; included for organizers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Vec<TransitionView>>,
}

impl TimelineView {
    pub fn new(timeline: &Timeline, include_transitions: bool) -> Self {
        Self {
            current: timeline.current().as_str().to_string(),
            events: milestone_views(timeline),
            transitions: include_transitions
                .then(|| timeline.transitions().iter().map(TransitionView::from).collect()),
        }
    }
}

pub fn milestone_views(timeline: &Timeline) -> Vec<MilestoneView> {
    timeline
        .entries()
        .into_iter()
        .map(|e| MilestoneView {
            milestone: e.milestone.as_str().to_string(),
            sequence: e.sequence,
            label: e.label,
            is_current: e.is_current,
        })
        .collect()
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct AdvanceRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetCurrentRequest {
    /// Milestone key, e.g. `review_papers`.
    pub milestone: String,
    #[serde(default)]
    pub allow_rewind: bool,
    #[serde(default)]
    pub reason: String,
}

impl Validate for SetCurrentRequest {
    fn validate(&self) -> Result<(), String> {
        self.milestone
            .parse::<Milestone>()
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

// -- Router -------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/events", get(list_events))
        .route("/v1/events/advance", post(advance_event))
        .route("/v1/events/current", put(set_current_event))
}

// -- Handlers -----------------------------------------------------------------

/// GET /v1/events — The timeline with its current milestone.
#[utoipa::path(
    get,
    path = "/v1/events",
    responses((status = 200, description = "Timeline", body = TimelineView)),
    tag = "events"
)]
async fn list_events(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<TimelineView>, AppError> {
    let is_organizer = resolve_actor(&state, &caller)?.is_some_and(|a| a.is_organizer());
    let timeline = state.timeline.read();
    Ok(Json(TimelineView::new(&timeline, is_organizer)))
}

/// POST /v1/events/advance — Move to the next milestone (organizer).
#[utoipa::path(
    post,
    path = "/v1/events/advance",
    request_body = AdvanceRequest,
    responses(
        (status = 200, description = "Timeline advanced", body = TimelineView),
        (status = 303, description = "Caller is not an organizer"),
        (status = 409, description = "Already at the final milestone", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
async fn advance_event(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<AdvanceRequest>, JsonRejection>,
) -> Result<Json<TimelineView>, AppError> {
    let actor = require_actor(&state, &caller)?;
    require_organizer(&actor)?;
    let req = extract_json(body)?;
    let evidence = TimelineTransitionEvidence {
        reason: req.reason,
        actor: Some(actor.id),
    };

    move_timeline(&state, |t| t.advance(evidence).cloned()).await
}

/// PUT /v1/events/current — Jump to a named milestone (organizer).
#[utoipa::path(
    put,
    path = "/v1/events/current",
    request_body = SetCurrentRequest,
    responses(
        (status = 200, description = "Current milestone moved", body = TimelineView),
        (status = 303, description = "Caller is not an organizer"),
        (status = 409, description = "Rewind not allowed or already current", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown milestone", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
async fn set_current_event(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<SetCurrentRequest>, JsonRejection>,
) -> Result<Json<TimelineView>, AppError> {
    let actor = require_actor(&state, &caller)?;
    require_organizer(&actor)?;
    let req = extract_validated_json(body)?;
    let target: Milestone = req.milestone.parse()?;
    let evidence = TimelineTransitionEvidence {
        reason: req.reason,
        actor: Some(actor.id),
    };

    move_timeline(&state, |t| {
        t.set_current(target, req.allow_rewind, evidence).cloned()
    })
    .await
}

/// Apply one move and record it. Moves are serialized through
/// `timeline_moves`, so on a failed write `previous` is exactly what this
/// move replaced.
async fn move_timeline(
    state: &AppState,
    f: impl FnOnce(&mut Timeline) -> Result<TimelineTransitionRecord, TimelineError>,
) -> Result<Json<TimelineView>, AppError> {
    let _moving = state.timeline_moves.lock().await;
    let (previous, record) = {
        let mut timeline = state.timeline.write();
        let previous = timeline.clone();
        let record = f(&mut *timeline)?;
        (previous, record)
    };

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::events::record_transition(pool, &record).await {
            *state.timeline.write() = previous;
            tracing::error!(
                to = %record.to_milestone,
                error = %e,
                "failed to persist timeline transition"
            );
            return Err(AppError::Internal("database persist failed".into()));
        }
    }

    tracing::info!(
        from = %record.from_milestone,
        to = %record.to_milestone,
        actor = ?record.actor,
        reason = %record.reason,
        "timeline moved"
    );
    let timeline = state.timeline.read();
    Ok(Json(TimelineView::new(&timeline, true)))
}
