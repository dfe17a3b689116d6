//! # Attendee Routes
//!
//! Profiles are edited by the attendee themself, stored capabilities by
//! organizers. The speaker capability is derived from accepted papers on
//! every request, so the speaker page and bio form open the moment a paper
//! is accepted and close again if it is deleted.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;

use cfp_core::{AttendeeId, Organization, TimeZone};
use cfp_state::attendee::listed;
use cfp_state::{
    is_speaker, Attendee, AttendeeError, Capability, Paper, ProfileUpdate, SpeakerProfileUpdate,
};

use crate::auth::{require_actor, resolve_actor, Caller};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::presentation::{paper_summary, AttendeeView, SpeakerView};
use crate::state::AppState;

// -- Request DTOs -------------------------------------------------------------

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub organization: Option<Organization>,
    #[schema(value_type = Option<String>)]
    pub time_zone: Option<TimeZone>,
    pub interested_in_volunteering: Option<bool>,
    pub interested_in_speaking: Option<bool>,
}

/// Grant or revoke one stored capability.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RoleChangeRequest {
    /// `reviewer` or `organizer`.
    pub capability: String,
    pub enabled: bool,
}

impl Validate for RoleChangeRequest {
    fn validate(&self) -> Result<(), String> {
        let capability: Capability = self.capability.parse().map_err(|e| format!("{e}"))?;
        if !capability.is_grantable() {
            return Err(format!("{capability} is derived and cannot be set"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SpeakerBioRequest {
    pub speaker_bio: Option<String>,
    /// External storage location. An empty string clears it.
    pub speaker_avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpeakerBioView {
    pub speaker_bio: String,
    pub speaker_avatar: Option<String>,
}

// -- Router -------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/attendees", get(list_attendees))
        .route("/v1/attendees/:id", get(get_attendee).put(update_attendee))
        .route("/v1/attendees/:id/roles", put(update_roles))
        .route("/v1/attendees/:id/speaker", get(get_speaker))
        .route("/v1/speaker/bio", get(get_speaker_bio).put(update_speaker_bio))
}

// -- Handlers -----------------------------------------------------------------

/// GET /v1/attendees — Named attendees in registration order.
#[utoipa::path(
    get,
    path = "/v1/attendees",
    responses((status = 200, description = "Attendee list", body = Vec<AttendeeView>)),
    tag = "attendees"
)]
async fn list_attendees(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<AttendeeView>>, AppError> {
    let viewer = resolve_actor(&state, &caller)?;
    let attendees = state.attendees.list();
    let papers = state.papers.list();

    let views = listed(attendees.iter())
        .into_iter()
        .map(|a| {
            let show_email = viewer
                .as_ref()
                .is_some_and(|v| v.id == a.id || v.is_organizer());
            AttendeeView::new(a, &a.effective_capabilities(papers.iter()), show_email)
        })
        .collect();
    Ok(Json(views))
}

/// GET /v1/attendees/:id — Attendee profile.
#[utoipa::path(
    get,
    path = "/v1/attendees/{id}",
    params(("id" = Uuid, Path, description = "Attendee ID")),
    responses(
        (status = 200, description = "Attendee found", body = AttendeeView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "attendees"
)]
async fn get_attendee(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendeeView>, AppError> {
    let id = AttendeeId::from(id);
    let viewer = resolve_actor(&state, &caller)?;
    let attendee = find_attendee(&state, id)?;
    let papers = state.papers.list();
    let show_email = viewer
        .as_ref()
        .is_some_and(|v| v.id == id || v.is_organizer());
    Ok(Json(AttendeeView::new(
        &attendee,
        &attendee.effective_capabilities(papers.iter()),
        show_email,
    )))
}

/// PUT /v1/attendees/:id — Edit one's own profile.
#[utoipa::path(
    put,
    path = "/v1/attendees/{id}",
    params(("id" = Uuid, Path, description = "Attendee ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AttendeeView),
        (status = 303, description = "Not the caller's profile"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "attendees"
)]
async fn update_attendee(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<AttendeeView>, AppError> {
    let id = AttendeeId::from(id);
    let actor = require_actor(&state, &caller)?;
    let req = extract_json(body)?;

    let update = ProfileUpdate {
        name: req.name,
        organization: req.organization,
        time_zone: req.time_zone,
        interested_in_volunteering: req.interested_in_volunteering,
        interested_in_speaking: req.interested_in_speaking,
    };
    let (before, after) = modify_attendee(&state, id, |a| a.update_profile(actor.id, update))?;
    persist_attendee(&state, before, &after).await?;

    tracing::info!(attendee_id = %id, "profile updated");
    let papers = state.papers.list();
    Ok(Json(AttendeeView::new(
        &after,
        &after.effective_capabilities(papers.iter()),
        true,
    )))
}

/// PUT /v1/attendees/:id/roles — Grant or revoke a stored capability.
#[utoipa::path(
    put,
    path = "/v1/attendees/{id}/roles",
    params(("id" = Uuid, Path, description = "Attendee ID")),
    request_body = RoleChangeRequest,
    responses(
        (status = 200, description = "Capabilities updated", body = AttendeeView),
        (status = 303, description = "Caller is not an organizer"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown or derived capability", body = crate::error::ErrorBody),
    ),
    tag = "attendees"
)]
async fn update_roles(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<RoleChangeRequest>, JsonRejection>,
) -> Result<Json<AttendeeView>, AppError> {
    let id = AttendeeId::from(id);
    let actor = require_actor(&state, &caller)?;
    let req = extract_validated_json(body)?;
    let capability: Capability = req.capability.parse()?;

    let (before, after) = modify_attendee(&state, id, |a| {
        a.set_capability(actor.id, &actor.capabilities, capability, req.enabled)
            .map(|_| ())
    })?;
    persist_attendee(&state, before, &after).await?;

    tracing::info!(
        attendee_id = %id,
        organizer = %actor.id,
        capability = %capability,
        enabled = req.enabled,
        "capability changed"
    );
    let papers = state.papers.list();
    Ok(Json(AttendeeView::new(
        &after,
        &after.effective_capabilities(papers.iter()),
        true,
    )))
}

/// GET /v1/attendees/:id/speaker — Public speaker page.
#[utoipa::path(
    get,
    path = "/v1/attendees/{id}/speaker",
    params(("id" = Uuid, Path, description = "Attendee ID")),
    responses(
        (status = 200, description = "Speaker page", body = SpeakerView),
        (status = 404, description = "No such speaker", body = crate::error::ErrorBody),
    ),
    tag = "attendees"
)]
async fn get_speaker(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SpeakerView>, AppError> {
    let id = AttendeeId::from(id);
    let attendee = find_attendee(&state, id)?;
    let papers = state.papers.list();
    if !is_speaker(id, papers.iter()) {
        return Err(AppError::NotFound(format!("speaker {id} not found")));
    }

    let mut accepted: Vec<&Paper> = papers
        .iter()
        .filter(|p| p.is_accepted && p.is_author(id))
        .collect();
    accepted.sort_by_key(|p| (p.submitted_at, p.id));

    Ok(Json(SpeakerView {
        id,
        display_name: attendee.display_name(),
        speaker_bio: attendee.speaker_bio.clone(),
        speaker_avatar: attendee.speaker_avatar.clone(),
        papers: accepted.into_iter().map(|p| paper_summary(&state, p)).collect(),
    }))
}

/// GET /v1/speaker/bio — The caller's speaker bio form.
#[utoipa::path(
    get,
    path = "/v1/speaker/bio",
    responses(
        (status = 200, description = "Current bio", body = SpeakerBioView),
        (status = 303, description = "Caller is not a speaker"),
    ),
    tag = "attendees"
)]
async fn get_speaker_bio(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<SpeakerBioView>, AppError> {
    let actor = require_actor(&state, &caller)?;
    if !actor.is_speaker() {
        return Err(AttendeeError::NotSpeaker(actor.id).into());
    }
    let attendee = find_attendee(&state, actor.id)?;
    Ok(Json(SpeakerBioView {
        speaker_bio: attendee.speaker_bio,
        speaker_avatar: attendee.speaker_avatar,
    }))
}

/// PUT /v1/speaker/bio — Update the caller's speaker bio and avatar.
#[utoipa::path(
    put,
    path = "/v1/speaker/bio",
    request_body = SpeakerBioRequest,
    responses(
        (status = 200, description = "Bio updated", body = SpeakerBioView),
        (status = 303, description = "Caller is not a speaker"),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "attendees"
)]
async fn update_speaker_bio(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<SpeakerBioRequest>, JsonRejection>,
) -> Result<Json<SpeakerBioView>, AppError> {
    let actor = require_actor(&state, &caller)?;
    let req = extract_json(body)?;
    let update = SpeakerProfileUpdate {
        speaker_bio: req.speaker_bio,
        speaker_avatar: req.speaker_avatar.map(Some),
    };

    let papers = state.papers.list();
    let (before, after) = modify_attendee(&state, actor.id, |a| {
        a.update_speaker_profile(actor.id, papers.iter(), update)
    })?;
    persist_attendee(&state, before, &after).await?;

    tracing::info!(attendee_id = %actor.id, "speaker bio updated");
    Ok(Json(SpeakerBioView {
        speaker_bio: after.speaker_bio,
        speaker_avatar: after.speaker_avatar,
    }))
}

// -- Helpers ------------------------------------------------------------------

fn find_attendee(state: &AppState, id: AttendeeId) -> Result<Attendee, AppError> {
    state
        .attendees
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("attendee {id} not found")))
}

/// Apply `f` under the store lock, returning the record before and after.
fn modify_attendee(
    state: &AppState,
    id: AttendeeId,
    f: impl FnOnce(&mut Attendee) -> Result<(), AttendeeError>,
) -> Result<(Attendee, Attendee), AppError> {
    state
        .attendees
        .try_update(&id, |a| {
            let before = a.clone();
            f(a)?;
            Ok::<_, AttendeeError>((before, a.clone()))
        })
        .ok_or_else(|| AppError::NotFound(format!("attendee {id} not found")))?
        .map_err(AppError::from)
}

/// Write `after` through to the database. If the write fails, `before` is
/// restored unless another request has changed the attendee since.
async fn persist_attendee(state: &AppState, before: Attendee, after: &Attendee) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::attendees::update(pool, after).await {
            let restored = state.attendees.restore_if_unchanged(&after.id, after, before);
            tracing::error!(attendee_id = %after.id, restored, error = %e, "failed to persist attendee update");
            return Err(AppError::Internal("database persist failed".into()));
        }
    }
    Ok(())
}
