//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from cfp-state and cfp-core to HTTP status codes.
//!
//! Authorization denials on gated pages are not errors from the caller's
//! point of view: they become `303 See Other` to the dashboard. Internal
//! error details are never exposed in responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use cfp_state::{AttendeeError, CapabilityError, PaperError, ReviewError, TimelineError};

/// Where denied requests are sent.
pub const DEFAULT_REDIRECT: &str = "/v1/dashboard";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Redirect target, present only for 303 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions on a non-page resource (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Access to a gated page was denied (303 to the dashboard).
    #[error("redirected: {0}")]
    Redirect(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Redirect(_) => (StatusCode::SEE_OTHER, "REDIRECT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            // The denial reason stays server-side; the caller only learns
            // where to go.
            Self::Redirect(_) => "redirected".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Redirect(reason) => tracing::debug!(reason = %reason, "request redirected"),
            _ => {}
        }

        let location = matches!(self, Self::Redirect(_)).then(|| DEFAULT_REDIRECT.to_string());
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                location: location.clone(),
            },
        };

        match location {
            Some(to) => (status, [(header::LOCATION, to)], Json(body)).into_response(),
            None => (status, Json(body)).into_response(),
        }
    }
}

impl From<cfp_core::ValidationError> for AppError {
    fn from(err: cfp_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<cfp_core::CfpError> for AppError {
    fn from(err: cfp_core::CfpError) -> Self {
        match err {
            cfp_core::CfpError::Serialization(_) => Self::Internal(err.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<PaperError> for AppError {
    fn from(err: PaperError) -> Self {
        match &err {
            PaperError::Validation(_) => Self::Validation(err.to_string()),
            PaperError::AlreadyAccepted(_) | PaperError::NotAccepted(_) => {
                Self::Conflict(err.to_string())
            }
            _ if err.is_denial() => Self::Redirect(err.to_string()),
            _ => Self::Conflict(err.to_string()),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match &err {
            ReviewError::Duplicate { .. } => Self::Conflict(err.to_string()),
            ReviewError::NotFound(_) => Self::NotFound(err.to_string()),
            ReviewError::Validation(_) => Self::Validation(err.to_string()),
            _ if err.is_denial() => Self::Redirect(err.to_string()),
            _ => Self::Conflict(err.to_string()),
        }
    }
}

impl From<AttendeeError> for AppError {
    fn from(err: AttendeeError) -> Self {
        match &err {
            AttendeeError::DuplicateEmail(_) => Self::Conflict(err.to_string()),
            AttendeeError::NotSelf { .. }
            | AttendeeError::NotSpeaker(_)
            | AttendeeError::NotOrganizer(_) => Self::Redirect(err.to_string()),
            AttendeeError::Capability(_) | AttendeeError::Validation(_) => {
                Self::Validation(err.to_string())
            }
        }
    }
}

impl From<CapabilityError> for AppError {
    fn from(err: CapabilityError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TimelineError> for AppError {
    fn from(err: TimelineError) -> Self {
        match &err {
            TimelineError::UnknownMilestone(_) => Self::Validation(err.to_string()),
            TimelineError::AtFinalMilestone(_)
            | TimelineError::RewindNotAllowed { .. }
            | TimelineError::AlreadyCurrent(_) => Self::Conflict(err.to_string()),
        }
    }
}
