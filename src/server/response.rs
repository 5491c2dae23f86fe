// src/server/response.rs
//! JSON error and notice bodies
//!
//! Errors render as `{status, message, messages}`; `messages` carries the
//! per-field validation list and is empty otherwise. Admin actions answer
//! with a `{type, message}` notice.

use crate::error::Error;
use crate::validation::{FieldMessage, ValidationErrors};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Error as returned to HTTP clients
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    messages: Vec<FieldMessage>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    message: &'a str,
    messages: &'a [FieldMessage],
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            messages: Vec::new(),
        }
    }

    /// 400 with a caller-facing summary in place of the generic one
    pub fn validation(message: impl Into<String>, errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            messages: errors.messages().to_vec(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidRecipeId(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::InvalidCredentials | Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::InvalidRegistrationKey => StatusCode::FORBIDDEN,
            Error::LockedOut(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::Upstream(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        }

        match err {
            Error::Validation(errors) => Self {
                status,
                message: "Validation failed".to_string(),
                messages: errors.messages().to_vec(),
            },
            // Internal details stay in the log
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                Self::new(status, "Internal server error")
            }
            other => Self::new(status, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            message: &self.message,
            messages: &self.messages,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Outcome kind shown to the admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// `{type, message}` acknowledgement for admin actions
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    #[serde(rename = "type")]
    pub kind: NoticeKind,
    pub message: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            status: StatusCode::OK,
        }
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            status,
        }
    }
}

impl IntoResponse for Notice {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Rule;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::InvalidRecipeId("a.b".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("Recipe".into()), StatusCode::NOT_FOUND),
            (Error::AlreadyExists("Recipe".into()), StatusCode::CONFLICT),
            (Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (Error::Unauthorized, StatusCode::UNAUTHORIZED),
            (Error::InvalidRegistrationKey, StatusCode::FORBIDDEN),
            (Error::LockedOut("admin".into()), StatusCode::TOO_MANY_REQUESTS),
            (Error::Upstream("down".into()), StatusCode::BAD_GATEWAY),
            (Error::Task("panicked".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_validation_keeps_messages() {
        let err = ApiError::from(Error::Validation(ValidationErrors::single(
            "id",
            Rule::Unique,
            "taken",
        )));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.messages.len(), 1);
        assert_eq!(err.messages[0].field, "id");
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let err = ApiError::from(Error::InitError("secret path /etc/x".into()));
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn test_notice_shape() {
        let notice = Notice::success("Recipe published successfully");
        assert_eq!(
            serde_json::to_value(&notice).unwrap(),
            serde_json::json!({"type": "success", "message": "Recipe published successfully"})
        );
    }
}
