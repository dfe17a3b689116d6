//! # Signup
//!
//! Creating an account creates its attendee. Email addresses are unique
//! across attendees; a second signup with the same address is a 409.
//!
//! Addresses listed in `ORGANIZER_EMAILS` receive the organizer capability
//! at signup, which is how the first organizer comes to exist.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cfp_core::{EmailAddress, Organization, TimeZone};
use cfp_state::{Attendee, AttendeeError, Capability, Registration};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::presentation::AttendeeView;
use crate::state::AppState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    /// May be left blank and filled in later from the profile.
    #[serde(default)]
    pub name: String,
    #[schema(value_type = String)]
    pub organization: Organization,
    #[serde(default)]
    #[schema(value_type = String)]
    pub time_zone: TimeZone,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), String> {
        EmailAddress::parse(&self.email)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/signup", post(signup))
}

/// POST /v1/signup — Register an account and its attendee.
#[utoipa::path(
    post,
    path = "/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Attendee registered", body = AttendeeView),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "attendees"
)]
async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AttendeeView>), AppError> {
    let req = extract_validated_json(body)?;
    let email = EmailAddress::parse(&req.email)?;

    let mut attendee = Attendee::register(Registration {
        email: email.clone(),
        name: req.name,
        organization: req.organization,
        time_zone: req.time_zone,
    })?;
    if state.is_bootstrap_organizer(&email) {
        attendee.capabilities.grant(Capability::Organizer)?;
        tracing::info!(email = %email, "granting organizer capability from ORGANIZER_EMAILS");
    }

    let id = attendee.id;
    if !state
        .attendees
        .insert_unless(id, attendee.clone(), |existing| existing.email == email)
    {
        return Err(AttendeeError::DuplicateEmail(email.to_string()).into());
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::attendees::insert(pool, &attendee).await {
            state.attendees.remove(&id);
            if crate::db::is_unique_violation(&e) {
                return Err(AttendeeError::DuplicateEmail(email.to_string()).into());
            }
            tracing::error!(attendee_id = %id, error = %e, "failed to persist attendee to database");
            return Err(AppError::Internal("database persist failed".into()));
        }
    }

    tracing::info!(attendee_id = %id, "attendee registered");
    let view = AttendeeView::new(&attendee, &attendee.capabilities, true);
    Ok((StatusCode::CREATED, Json(view)))
}
