//! # Request Body Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` so that malformed bodies
//! produce our `ErrorBody` shape instead of axum's plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Business-rule checks on a request DTO beyond what serde enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Unwrap a JSON body and run its [`Validate`] checks (422 on failure).
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reason(String);

    impl Validate for Reason {
        fn validate(&self) -> Result<(), String> {
            if self.0.len() > 8 {
                return Err("reason too long".into());
            }
            Ok(())
        }
    }

    #[test]
    fn validated_json_passes_good_values() {
        let out = extract_validated_json(Ok(Json(Reason("ok".into())))).unwrap();
        assert_eq!(out.0, "ok");
    }

    #[test]
    fn validated_json_maps_rule_failures_to_validation() {
        let err = extract_validated_json(Ok(Json(Reason("much too long".into())))).err();
        assert!(matches!(err, Some(AppError::Validation(m)) if m.contains("too long")));
    }
}
