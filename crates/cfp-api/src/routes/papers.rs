//! # Paper Routes
//!
//! Every read goes through the visibility predicate: a paper that is not
//! visible to the caller redirects to the dashboard instead of erroring.
//! A paper id that does not exist at all is a plain 404.
//!
//! Deleting a paper removes its reviews with it.

use std::collections::BTreeSet;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use cfp_core::{AttendeeId, PaperId, PaperTheme, PaperType, Timestamp};
use cfp_state::{AcceptanceDetails, Paper, PaperDraft, PaperError, PresentationLinks};

use crate::auth::{require_actor, resolve_actor, Caller};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::presentation::{paper_view, PaperView};
use crate::state::AppState;

// -- Request DTOs -------------------------------------------------------------

/// Author-editable submission fields.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PaperRequest {
    #[serde(default)]
    #[schema(value_type = String)]
    pub paper_type: PaperType,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub keywords: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub themes: BTreeSet<PaperTheme>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub co_authors: BTreeSet<AttendeeId>,
}

impl Validate for PaperRequest {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".into());
        }
        Ok(())
    }
}

impl From<PaperRequest> for PaperDraft {
    fn from(req: PaperRequest) -> Self {
        PaperDraft {
            paper_type: req.paper_type,
            title: req.title,
            abstract_text: req.abstract_text,
            keywords: req.keywords,
            themes: req.themes,
            co_authors: req.co_authors,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct AcceptanceRequest {
    #[serde(default)]
    pub long_form_requested: bool,
    #[serde(default)]
    pub ssrn_paper_consent: bool,
    #[serde(default)]
    pub ssrn_presentation_consent: bool,
    /// RFC 3339 timestamp of the scheduled slot.
    pub scheduled_at: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PresentationRequest {
    pub slides: Option<String>,
    pub video: Option<String>,
}

// -- Router -------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/papers", get(list_papers).post(submit_paper))
        .route(
            "/v1/papers/:id",
            get(get_paper).put(update_paper).delete(delete_paper),
        )
        .route("/v1/papers/:id/accept", post(accept_paper))
        .route("/v1/papers/:id/acceptance", put(update_acceptance))
        .route("/v1/papers/:id/presentation", put(update_presentation))
}

// -- Handlers -----------------------------------------------------------------

/// POST /v1/papers — Submit a paper. The caller becomes primary author.
#[utoipa::path(
    post,
    path = "/v1/papers",
    request_body = PaperRequest,
    responses(
        (status = 201, description = "Paper submitted", body = PaperView),
        (status = 303, description = "Sign-in required"),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "papers"
)]
async fn submit_paper(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<PaperRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaperView>), AppError> {
    let actor = require_actor(&state, &caller)?;
    let req = extract_validated_json(body)?;
    check_co_authors(&state, &req.co_authors)?;

    let paper = Paper::submit(actor.id, req.into())?;
    let id = paper.id;
    state.papers.insert(id, paper.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::papers::insert(pool, &paper).await {
            state.papers.remove(&id);
            tracing::error!(paper_id = %id, error = %e, "failed to persist paper to database");
            return Err(AppError::Internal("database persist failed".into()));
        }
    }

    tracing::info!(paper_id = %id, author = %actor.id, "paper submitted");
    Ok((StatusCode::CREATED, Json(paper_view(&state, &paper))))
}

/// GET /v1/papers — Papers visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/papers",
    responses((status = 200, description = "Visible papers", body = Vec<PaperView>)),
    tag = "papers"
)]
async fn list_papers(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<PaperView>>, AppError> {
    let viewer = resolve_actor(&state, &caller)?;
    let mut papers: Vec<Paper> = state
        .papers
        .list()
        .into_iter()
        .filter(|p| p.visible_to(viewer.as_ref()))
        .collect();
    papers.sort_by_key(|p| (p.submitted_at, p.id));
    Ok(Json(papers.iter().map(|p| paper_view(&state, p)).collect()))
}

/// GET /v1/papers/:id — Paper detail, gated by visibility.
#[utoipa::path(
    get,
    path = "/v1/papers/{id}",
    params(("id" = Uuid, Path, description = "Paper ID")),
    responses(
        (status = 200, description = "Paper found", body = PaperView),
        (status = 303, description = "Paper not visible to the caller"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "papers"
)]
async fn get_paper(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<PaperView>, AppError> {
    let viewer = resolve_actor(&state, &caller)?;
    let paper = find_paper(&state, PaperId::from(id))?;
    paper.require_visible(viewer.as_ref())?;
    Ok(Json(paper_view(&state, &paper)))
}

/// PUT /v1/papers/:id — Edit the submission (primary author, before acceptance).
#[utoipa::path(
    put,
    path = "/v1/papers/{id}",
    params(("id" = Uuid, Path, description = "Paper ID")),
    request_body = PaperRequest,
    responses(
        (status = 200, description = "Paper updated", body = PaperView),
        (status = 303, description = "Caller is not the primary author"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Paper already accepted", body = crate::error::ErrorBody),
    ),
    tag = "papers"
)]
async fn update_paper(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<PaperRequest>, JsonRejection>,
) -> Result<Json<PaperView>, AppError> {
    let id = PaperId::from(id);
    let actor = require_actor(&state, &caller)?;
    let req = extract_validated_json(body)?;
    check_co_authors(&state, &req.co_authors)?;
    let draft: PaperDraft = req.into();

    let (before, after) = modify_paper(&state, id, |p| p.update_submission(&actor, draft))?;
    persist_paper(&state, before, &after).await?;

    tracing::info!(paper_id = %id, "paper updated");
    Ok(Json(paper_view(&state, &after)))
}

/// DELETE /v1/papers/:id — Withdraw a paper.
#[utoipa::path(
    delete,
    path = "/v1/papers/{id}",
    params(("id" = Uuid, Path, description = "Paper ID")),
    responses(
        (status = 204, description = "Paper deleted"),
        (status = 303, description = "Caller may not delete this paper"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Paper already accepted", body = crate::error::ErrorBody),
    ),
    tag = "papers"
)]
async fn delete_paper(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let id = PaperId::from(id);
    let actor = require_actor(&state, &caller)?;
    let paper = state
        .papers
        .remove_if(&id, |p| p.authorize_delete(&actor))
        .ok_or_else(|| AppError::NotFound(format!("paper {id} not found")))??;
    // After the paper is gone no new review can attach to it.
    let reviews = state.reviews.write().take_for_paper(id);
    let removed_reviews = reviews.len();

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::papers::delete(pool, id).await {
            state.papers.insert(id, paper);
            let mut registry = state.reviews.write();
            for review in reviews {
                if let Err(re) = registry.insert(review) {
                    tracing::error!(paper_id = %id, error = %re, "failed to restore review");
                }
            }
            tracing::error!(paper_id = %id, error = %e, "failed to delete paper from database");
            return Err(AppError::Internal("database delete failed".into()));
        }
    }

    tracing::info!(paper_id = %id, actor = %actor.id, removed_reviews, "paper deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/papers/:id/accept — Accept a paper (organizer).
#[utoipa::path(
    post,
    path = "/v1/papers/{id}/accept",
    params(("id" = Uuid, Path, description = "Paper ID")),
    responses(
        (status = 200, description = "Paper accepted", body = PaperView),
        (status = 303, description = "Caller is not an organizer"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already accepted", body = crate::error::ErrorBody),
    ),
    tag = "papers"
)]
async fn accept_paper(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<PaperView>, AppError> {
    let id = PaperId::from(id);
    let actor = require_actor(&state, &caller)?;

    let (before, after) = modify_paper(&state, id, |p| p.accept(&actor))?;
    persist_paper(&state, before, &after).await?;

    tracing::info!(paper_id = %id, organizer = %actor.id, "paper accepted");
    Ok(Json(paper_view(&state, &after)))
}

/// PUT /v1/papers/:id/acceptance — Edit post-acceptance fields (organizer).
#[utoipa::path(
    put,
    path = "/v1/papers/{id}/acceptance",
    params(("id" = Uuid, Path, description = "Paper ID")),
    request_body = AcceptanceRequest,
    responses(
        (status = 200, description = "Acceptance fields updated", body = PaperView),
        (status = 303, description = "Caller is not an organizer"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Paper not accepted", body = crate::error::ErrorBody),
    ),
    tag = "papers"
)]
async fn update_acceptance(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<AcceptanceRequest>, JsonRejection>,
) -> Result<Json<PaperView>, AppError> {
    let id = PaperId::from(id);
    let actor = require_actor(&state, &caller)?;
    let req = extract_json(body)?;
    let scheduled_at = req
        .scheduled_at
        .as_deref()
        .map(Timestamp::parse)
        .transpose()?;
    let details = AcceptanceDetails {
        long_form_requested: req.long_form_requested,
        ssrn_paper_consent: req.ssrn_paper_consent,
        ssrn_presentation_consent: req.ssrn_presentation_consent,
        scheduled_at,
    };

    let (before, after) = modify_paper(&state, id, |p| p.update_acceptance(&actor, details))?;
    persist_paper(&state, before, &after).await?;

    tracing::info!(paper_id = %id, "acceptance fields updated");
    Ok(Json(paper_view(&state, &after)))
}

/// PUT /v1/papers/:id/presentation — Attach slides and video links.
#[utoipa::path(
    put,
    path = "/v1/papers/{id}/presentation",
    params(("id" = Uuid, Path, description = "Paper ID")),
    request_body = PresentationRequest,
    responses(
        (status = 200, description = "Presentation links updated", body = PaperView),
        (status = 303, description = "Caller is not an author or organizer"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Paper not accepted", body = crate::error::ErrorBody),
    ),
    tag = "papers"
)]
async fn update_presentation(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<PresentationRequest>, JsonRejection>,
) -> Result<Json<PaperView>, AppError> {
    let id = PaperId::from(id);
    let actor = require_actor(&state, &caller)?;
    let req = extract_json(body)?;
    let links = PresentationLinks {
        slides: req.slides,
        video: req.video,
    };

    let (before, after) = modify_paper(&state, id, |p| p.update_presentation(&actor, links))?;
    persist_paper(&state, before, &after).await?;

    tracing::info!(paper_id = %id, "presentation links updated");
    Ok(Json(paper_view(&state, &after)))
}

// -- Helpers ------------------------------------------------------------------

fn find_paper(state: &AppState, id: PaperId) -> Result<Paper, AppError> {
    state
        .papers
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("paper {id} not found")))
}

/// Co-authors must be registered attendees.
fn check_co_authors(state: &AppState, co_authors: &BTreeSet<AttendeeId>) -> Result<(), AppError> {
    match co_authors.iter().find(|id| !state.attendees.contains(id)) {
        Some(missing) => Err(AppError::Validation(format!(
            "co-author {missing} is not a registered attendee"
        ))),
        None => Ok(()),
    }
}

/// Apply `f` under the store lock, returning the record before and after.
fn modify_paper(
    state: &AppState,
    id: PaperId,
    f: impl FnOnce(&mut Paper) -> Result<(), PaperError>,
) -> Result<(Paper, Paper), AppError> {
    state
        .papers
        .try_update(&id, |p| {
            let before = p.clone();
            f(p)?;
            Ok::<_, PaperError>((before, p.clone()))
        })
        .ok_or_else(|| AppError::NotFound(format!("paper {id} not found")))?
        .map_err(AppError::from)
}

/// Write `after` through to the database. If the write fails, `before` is
/// restored unless another request has changed the paper since.
async fn persist_paper(state: &AppState, before: Paper, after: &Paper) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::papers::update(pool, after).await {
            let restored = state.papers.restore_if_unchanged(&after.id, after, before);
            tracing::error!(paper_id = %after.id, restored, error = %e, "failed to persist paper update");
            return Err(AppError::Internal("database persist failed".into()));
        }
    }
    Ok(())
}
