//! `AppError` and the JSON body it renders to

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned by every route handler.
///
/// The code decides the HTTP status; `details` carries field-level
/// validation failures or context such as the seats still left on a trip.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Error envelope: `{"code": 4001, "message": "...", "details": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

impl ErrorBody {
    /// Status the body was (or would be) sent with
    pub fn http_status(&self) -> StatusCode {
        ErrorCode::try_from(self.code)
            .map(|c| c.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Validation failures become `ValidationFailed` with one detail per field
/// path (`catches[0].species`) listing the failed rule codes.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        flatten_validation("", &errors, &mut fields);

        fields
            .into_iter()
            .fold(Self::new(ErrorCode::ValidationFailed), |err, (path, codes)| {
                err.with_detail(path, codes)
            })
    }
}

fn flatten_validation(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<(String, Vec<String>)>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.push((path, list.iter().map(|e| e.code.to_string()).collect()));
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_validation(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "System error");
        }
        (self.http_status(), axum::Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_message_comes_from_code() {
        let err = AppError::new(ErrorCode::TripNotFound);
        assert_eq!(err.message, "Trip not found");
        assert!(err.details.is_none());
        assert_eq!(err.to_string(), "Trip not found");
    }

    #[test]
    fn details_accumulate() {
        let err = AppError::new(ErrorCode::TripFull)
            .with_detail("seats_left", 2)
            .with_detail("requested", 3);
        let details = err.details.unwrap();
        assert_eq!(details["seats_left"], 2);
        assert_eq!(details["requested"], 3);
    }

    #[test]
    fn statuses() {
        assert_eq!(
            AppError::new(ErrorCode::PaymentNotFound).http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::not_authenticated().http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::token_expired().http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::permission_denied("Admin only").http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn body_shape() {
        let err = AppError::with_message(ErrorCode::PaymentNotFound, "No such payment")
            .with_detail("id", 123);
        let body = ErrorBody::from(&err);
        assert_eq!(body.http_status(), StatusCode::NOT_FOUND);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], 5001);
        assert_eq!(json["message"], "No such payment");
        assert_eq!(json["details"]["id"], 123);

        let bare = serde_json::to_string(&ErrorBody::from(&AppError::internal("boom"))).unwrap();
        assert!(!bare.contains("details"));
    }

    #[test]
    fn validation_errors_flatten_to_details() {
        use validator::Validate;

        #[derive(Validate)]
        struct Line {
            #[validate(length(min = 1))]
            species: String,
        }

        #[derive(Validate)]
        struct Entry {
            #[validate(range(min = 1, max = 5))]
            rating: i32,
            #[validate(nested)]
            lines: Vec<Line>,
        }

        let entry = Entry {
            rating: 9,
            lines: vec![Line {
                species: String::new(),
            }],
        };
        let err: AppError = entry.validate().unwrap_err().into();
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        let details = err.details.unwrap();
        assert_eq!(details["rating"], serde_json::json!(["range"]));
        assert_eq!(details["lines[0].species"], serde_json::json!(["length"]));
    }
}
