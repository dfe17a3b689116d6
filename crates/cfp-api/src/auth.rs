//! # Caller Authentication
//!
//! Credential storage lives outside this service. Upstream hands us a
//! bearer token naming the attendee:
//!
//! ```text
//! Bearer {attendee_id}:{secret}   — AUTH_TOKEN configured
//! Bearer {attendee_id}            — AUTH_TOKEN unset (development)
//! ```
//!
//! The middleware turns the header into a [`Caller`] in request
//! extensions. A missing header is an anonymous caller, not an error:
//! anonymous callers may sign up, list attendees and read accepted papers.
//!
//! Capabilities are never carried in the token. [`require_actor`] looks
//! the attendee up on every request, so a revoked role takes effect
//! immediately and speaker eligibility is always current.

use axum::extract::Request;
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use cfp_core::AttendeeId;
use cfp_state::Actor;

use crate::error::AppError;
use crate::state::AppState;

// ── Caller ──────────────────────────────────────────────────────────────────

/// Who is making the request, as far as the token says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub attendee_id: Option<AttendeeId>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self { attendee_id: None }
    }

    pub fn attendee(id: AttendeeId) -> Self {
        Self {
            attendee_id: Some(id),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.attendee_id.is_none()
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller in request context".into()))
    }
}

/// Resolve the caller to an [`Actor`], or `None` when anonymous.
///
/// A token naming an attendee that does not exist is rejected with 401.
pub fn resolve_actor(state: &AppState, caller: &Caller) -> Result<Option<Actor>, AppError> {
    match caller.attendee_id {
        None => Ok(None),
        Some(id) => state
            .actor(id)
            .map(Some)
            .ok_or_else(|| AppError::Unauthorized(format!("unknown attendee {id}"))),
    }
}

/// Resolve the caller to an [`Actor`]; anonymous callers are redirected.
pub fn require_actor(state: &AppState, caller: &Caller) -> Result<Actor, AppError> {
    resolve_actor(state, caller)?.ok_or_else(|| AppError::Redirect("sign-in required".into()))
}

/// Require the organizer capability; others are redirected.
pub fn require_organizer(actor: &Actor) -> Result<(), AppError> {
    if actor.is_organizer() {
        Ok(())
    } else {
        Err(AppError::Redirect(format!(
            "organizer capability required, {} does not hold it",
            actor.id
        )))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of secrets.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token into the attendee it names.
///
/// With `expected_secret` set the token must be `{attendee_id}:{secret}`.
/// Without it the secret part is optional and ignored.
pub fn parse_bearer_token(provided: &str, expected_secret: Option<&str>) -> Result<AttendeeId, String> {
    let (id_part, secret) = match provided.split_once(':') {
        Some((id, secret)) => (id, Some(secret)),
        None => (provided, None),
    };

    if let Some(expected) = expected_secret {
        let ok = secret.is_some_and(|s| constant_time_token_eq(s, expected));
        if !ok {
            return Err("invalid bearer token".into());
        }
    }

    id_part
        .parse::<Uuid>()
        .map(AttendeeId::from)
        .map_err(|e| format!("invalid attendee id in token: {e}"))
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Turn the `Authorization` header into a [`Caller`] extension.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let header_value = match request.headers().get(header::AUTHORIZATION) {
        None => {
            request.extensions_mut().insert(Caller::anonymous());
            return next.run(request).await;
        }
        Some(value) => value.to_str().map(str::to_owned),
    };

    let token = match header_value {
        Ok(value) => match value.strip_prefix("Bearer ") {
            Some(token) => token.trim().to_string(),
            None => {
                return AppError::Unauthorized("expected a Bearer token".into()).into_response();
            }
        },
        Err(_) => {
            return AppError::Unauthorized("authorization header is not valid UTF-8".into())
                .into_response();
        }
    };

    match parse_bearer_token(&token, expected.as_deref()) {
        Ok(id) => {
            request.extensions_mut().insert(Caller::attendee(id));
            next.run(request).await
        }
        Err(reason) => {
            tracing::debug!(reason = %reason, "rejected bearer token");
            AppError::Unauthorized(reason).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfp_core::{EmailAddress, Organization, TimeZone};
    use cfp_state::{Attendee, CapabilitySet, Registration};

    const ID: &str = "6f1c2a3e-8a5b-4a7b-9a77-1d2b0f0e4c11";

    #[test]
    fn token_with_secret() {
        let id = parse_bearer_token(&format!("{ID}:s3cret"), Some("s3cret")).unwrap();
        assert_eq!(id.to_string(), format!("attendee:{ID}"));
    }

    #[test]
    fn wrong_or_missing_secret_is_rejected() {
        assert!(parse_bearer_token(&format!("{ID}:nope"), Some("s3cret")).is_err());
        assert!(parse_bearer_token(ID, Some("s3cret")).is_err());
        assert!(parse_bearer_token(&format!("{ID}:s3cret2"), Some("s3cret")).is_err());
    }

    #[test]
    fn development_mode_accepts_bare_id() {
        assert!(parse_bearer_token(ID, None).is_ok());
        assert!(parse_bearer_token(&format!("{ID}:anything"), None).is_ok());
        assert!(parse_bearer_token("not-a-uuid", None).is_err());
    }

    #[test]
    fn constant_time_eq_behaviour() {
        assert!(constant_time_token_eq("abc", "abc"));
        assert!(!constant_time_token_eq("abc", "abd"));
        assert!(!constant_time_token_eq("abc", "abcd"));
    }

    #[test]
    fn auth_config_debug_redacts() {
        let cfg = AuthConfig {
            token: Some("s3cret".into()),
        };
        assert!(!format!("{cfg:?}").contains("s3cret"));
    }

    #[test]
    fn actors_resolve_from_the_store() {
        let state = AppState::new();
        assert!(resolve_actor(&state, &Caller::anonymous()).unwrap().is_none());
        assert!(matches!(
            require_actor(&state, &Caller::anonymous()),
            Err(AppError::Redirect(_))
        ));
        assert!(matches!(
            resolve_actor(&state, &Caller::attendee(AttendeeId::new())),
            Err(AppError::Unauthorized(_))
        ));

        let mut attendee = Attendee::register(Registration {
            email: EmailAddress::parse("olga@conf.org").unwrap(),
            name: "Olga".into(),
            organization: Organization::Relx,
            time_zone: TimeZone::UTC,
        })
        .unwrap();
        attendee.capabilities = CapabilitySet::from_flags(false, true);
        let id = attendee.id;
        state.attendees.insert(id, attendee);

        let actor = require_actor(&state, &Caller::attendee(id)).unwrap();
        assert!(require_organizer(&actor).is_ok());
    }
}
