//! # cfp-api — Axum API Service for the CFP Portal
//!
//! HTTP surface over the domain rules in `cfp-state`.
//!
//! ## API Surface
//!
//! | Prefix              | Module                  | Domain                     |
//! |---------------------|-------------------------|----------------------------|
//! | `/v1/signup`        | [`routes::signup`]      | Account + attendee creation |
//! | `/v1/attendees/*`   | [`routes::attendees`]   | Profiles, roles, speakers  |
//! | `/v1/speaker/bio`   | [`routes::attendees`]   | Speaker bio form           |
//! | `/v1/papers/*`      | [`routes::papers`]      | Papers and acceptance      |
//! | `/v1/papers/*/reviews`, `/v1/reviews/*` | [`routes::reviews`] | Peer review |
//! | `/v1/events/*`      | [`routes::events`]      | Conference timeline        |
//! | `/v1/dashboard`     | [`routes::dashboard`]   | Landing page               |
//! | `/v1/stats`         | [`routes::stats`]       | Organizer statistics       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! Requests without credentials pass through as anonymous callers; each
//! handler decides what an anonymous caller may see. Denied page requests
//! answer `303 See Other` pointing at `/v1/dashboard`.
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros and served at `/openapi.json`.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod presentation;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware so
/// they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::signup::router())
        .merge(routes::attendees::router())
        .merge(routes::papers::router())
        .merge(routes::reviews::router())
        .merge(routes::events::router())
        .merge(routes::dashboard::router())
        .merge(routes::stats::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
