//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CFP Portal API",
        version = "0.1.0",
        description = "Conference call-for-papers portal: signup, attendee profiles, paper submission and acceptance, peer review, conference timeline, dashboard and statistics.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Signup & attendees
        crate::routes::signup::signup,
        crate::routes::attendees::list_attendees,
        crate::routes::attendees::get_attendee,
        crate::routes::attendees::update_attendee,
        crate::routes::attendees::update_roles,
        crate::routes::attendees::get_speaker,
        crate::routes::attendees::get_speaker_bio,
        crate::routes::attendees::update_speaker_bio,
        // Papers
        crate::routes::papers::submit_paper,
        crate::routes::papers::list_papers,
        crate::routes::papers::get_paper,
        crate::routes::papers::update_paper,
        crate::routes::papers::delete_paper,
        crate::routes::papers::accept_paper,
        crate::routes::papers::update_acceptance,
        crate::routes::papers::update_presentation,
        // Reviews
        crate::routes::reviews::create_review,
        crate::routes::reviews::list_reviews,
        crate::routes::reviews::get_review,
        crate::routes::reviews::update_review,
        // Timeline
        crate::routes::events::list_events,
        crate::routes::events::advance_event,
        crate::routes::events::set_current_event,
        // Dashboard & statistics
        crate::routes::dashboard::dashboard,
        crate::routes::stats::get_stats,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Views
        crate::presentation::StarRating,
        crate::presentation::AttendeeView,
        crate::presentation::SpeakerView,
        crate::presentation::PaperSummary,
        crate::presentation::PaperView,
        crate::presentation::ReviewView,
        // Attendee DTOs
        crate::routes::signup::SignupRequest,
        crate::routes::attendees::UpdateProfileRequest,
        crate::routes::attendees::RoleChangeRequest,
        crate::routes::attendees::SpeakerBioRequest,
        crate::routes::attendees::SpeakerBioView,
        // Paper DTOs
        crate::routes::papers::PaperRequest,
        crate::routes::papers::AcceptanceRequest,
        crate::routes::papers::PresentationRequest,
        // Review DTOs
        crate::routes::reviews::ReviewRequest,
        // Timeline DTOs
        crate::routes::events::MilestoneView,
        crate::routes::events::TransitionView,
        crate::routes::events::TimelineView,
        crate::routes::events::AdvanceRequest,
        crate::routes::events::SetCurrentRequest,
        // Dashboard & statistics
        crate::routes::dashboard::DashboardView,
        crate::routes::stats::StatsView,
    )),
    tags(
        (name = "attendees", description = "Signup, profiles, roles and speaker pages"),
        (name = "papers", description = "Paper submission and acceptance"),
        (name = "reviews", description = "Peer review"),
        (name = "events", description = "Conference timeline"),
        (name = "dashboard", description = "Per-caller landing page"),
        (name = "stats", description = "Organizer statistics"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/v1/signup",
            "/v1/papers/{id}",
            "/v1/papers/{id}/reviews",
            "/v1/events/current",
            "/v1/dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
