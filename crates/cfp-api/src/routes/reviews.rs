//! # Review Routes
//!
//! Reviewers review papers by id. Holding the reviewer capability does not
//! make a paper visible; the review endpoints only need the paper to exist.
//!
//! The `(paper, reviewer)` uniqueness check, the paper existence check and
//! the insert happen under the registry's write lock; with a database the
//! unique constraint backs it.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use cfp_core::{PaperId, RejectionReason, ReviewDecision, ReviewId};
use cfp_state::{Review, ReviewDraft, ReviewError};

use crate::auth::{require_actor, Caller};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::presentation::ReviewView;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ReviewRequest {
    #[serde(default)]
    #[schema(value_type = String)]
    pub decision: ReviewDecision,
    #[schema(value_type = Option<String>)]
    pub rejection_reason: Option<RejectionReason>,
    #[serde(default)]
    pub comments: String,
}

impl Validate for ReviewRequest {
    fn validate(&self) -> Result<(), String> {
        self.draft().validate().map_err(|e| e.to_string())
    }
}

impl ReviewRequest {
    fn draft(&self) -> ReviewDraft {
        ReviewDraft {
            decision: self.decision,
            rejection_reason: self.rejection_reason,
            comments: self.comments.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewFilter {
    /// Only reviews of this paper.
    pub paper_id: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/papers/:id/reviews", post(create_review))
        .route("/v1/reviews", get(list_reviews))
        .route("/v1/reviews/:id", get(get_review).put(update_review))
}

/// POST /v1/papers/:id/reviews — Review a paper (reviewer).
#[utoipa::path(
    post,
    path = "/v1/papers/{id}/reviews",
    params(("id" = Uuid, Path, description = "Paper ID")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewView),
        (status = 303, description = "Caller is not a reviewer"),
        (status = 404, description = "Paper not found", body = crate::error::ErrorBody),
        (status = 409, description = "Caller already reviewed this paper", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "reviews"
)]
async fn create_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(paper_id): Path<Uuid>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReviewView>), AppError> {
    let paper_id = PaperId::from(paper_id);
    let actor = require_actor(&state, &caller)?;
    if !state.papers.contains(&paper_id) {
        return Err(AppError::NotFound(format!("paper {paper_id} not found")));
    }
    let req = extract_validated_json(body)?;

    let review = Review::create(&actor, paper_id, req.draft())?;
    let id = review.id;
    {
        // Paper deletion purges reviews under this lock after removing the paper.
        let mut registry = state.reviews.write();
        if !state.papers.contains(&paper_id) {
            return Err(AppError::NotFound(format!("paper {paper_id} not found")));
        }
        registry.insert(review.clone())?;
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::reviews::insert(pool, &review).await {
            state.reviews.write().remove(&id);
            if crate::db::is_unique_violation(&e) {
                return Err(ReviewError::Duplicate {
                    paper: paper_id,
                    reviewer: actor.id,
                }
                .into());
            }
            tracing::error!(review_id = %id, error = %e, "failed to persist review to database");
            return Err(AppError::Internal("database persist failed".into()));
        }
    }

    tracing::info!(review_id = %id, paper_id = %paper_id, reviewer = %actor.id, "review created");
    Ok((StatusCode::CREATED, Json(ReviewView::from(&review))))
}

/// GET /v1/reviews — All reviews for organizers, own reviews otherwise.
#[utoipa::path(
    get,
    path = "/v1/reviews",
    params(("paper_id" = Option<Uuid>, Query, description = "Only reviews of this paper")),
    responses(
        (status = 200, description = "Visible reviews", body = Vec<ReviewView>),
        (status = 303, description = "Sign-in required"),
    ),
    tag = "reviews"
)]
async fn list_reviews(
    State(state): State<AppState>,
    caller: Caller,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<ReviewView>>, AppError> {
    let actor = require_actor(&state, &caller)?;
    let paper_filter = filter.paper_id.map(PaperId::from);

    let registry = state.reviews.read();
    let mut reviews: Vec<&Review> = registry
        .visible_to(&actor)
        .filter(|r| paper_filter.map_or(true, |p| r.paper_id == p))
        .collect();
    reviews.sort_by_key(|r| (r.created_at, r.id));
    Ok(Json(reviews.into_iter().map(ReviewView::from).collect()))
}

/// GET /v1/reviews/:id — One review (own reviewer or organizer).
#[utoipa::path(
    get,
    path = "/v1/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review found", body = ReviewView),
        (status = 303, description = "Review not visible to the caller"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "reviews"
)]
async fn get_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewView>, AppError> {
    let id = ReviewId::from(id);
    let actor = require_actor(&state, &caller)?;
    let review = state
        .reviews
        .read()
        .get(&id)
        .cloned()
        .ok_or(ReviewError::NotFound(id))?;
    review.require_visible(&actor)?;
    Ok(Json(ReviewView::from(&review)))
}

/// PUT /v1/reviews/:id — Revise one's own review.
#[utoipa::path(
    put,
    path = "/v1/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewView),
        (status = 303, description = "Review belongs to another reviewer"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "reviews"
)]
async fn update_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<ReviewView>, AppError> {
    let id = ReviewId::from(id);
    let actor = require_actor(&state, &caller)?;
    let req = extract_validated_json(body)?;

    let (before, after) = {
        let mut registry = state.reviews.write();
        let before = registry.get(&id).cloned().ok_or(ReviewError::NotFound(id))?;
        let after = registry.update(&id, |r| r.update(&actor, req.draft()))?;
        (before, after)
    };

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::reviews::update(pool, &after).await {
            let restored = state.reviews.write().restore_if_unchanged(&after, before);
            tracing::error!(review_id = %id, restored, error = %e, "failed to persist review update");
            return Err(AppError::Internal("database persist failed".into()));
        }
    }

    tracing::info!(review_id = %id, decision = %after.decision.as_str(), "review updated");
    Ok(Json(ReviewView::from(&after)))
}
