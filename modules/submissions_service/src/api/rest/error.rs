//! HTTP error mapping to RFC-9457 Problem Details

use crate::contract::SubmissionsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// RFC-9457 Problem Details for HTTP API errors
#[derive(Debug, Serialize)]
pub struct Problem {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Problem {
    /// Create a new Problem Details response
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
        }
    }

    /// Add detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Map domain errors to HTTP Problem Details
pub fn map_domain_error(error: SubmissionsError) -> Problem {
    let detail = error.to_string();
    match error {
        SubmissionsError::FormNotFound { .. } => {
            Problem::new(StatusCode::NOT_FOUND, "Form Not Found").with_detail(detail)
        }

        SubmissionsError::NotFound { resource, .. } => {
            Problem::new(StatusCode::NOT_FOUND, format!("{} Not Found", resource)).with_detail(detail)
        }

        SubmissionsError::FormIncomplete { .. } => {
            Problem::new(StatusCode::CONFLICT, "Form Incomplete").with_detail(detail)
        }

        SubmissionsError::FormInactive { .. } => {
            Problem::new(StatusCode::FORBIDDEN, "Form Inactive").with_detail(detail)
        }

        SubmissionsError::NoRedirectUrl { .. } | SubmissionsError::NoReturnUrl { .. } => {
            Problem::new(StatusCode::UNPROCESSABLE_ENTITY, "Form Misconfigured").with_detail(detail)
        }

        SubmissionsError::InvalidInput { message } => {
            Problem::new(StatusCode::BAD_REQUEST, "Invalid Input").with_detail(message)
        }

        SubmissionsError::Storage { operation, message } => {
            tracing::error!(operation = %operation, "Storage failure: {}", message);
            internal_error()
        }

        SubmissionsError::Internal => internal_error(),
    }
}

fn internal_error() -> Problem {
    Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        .with_detail("An unexpected error occurred")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_details_are_not_leaked() {
        let problem = map_domain_error(SubmissionsError::storage(
            "search_submissions",
            "no such table: form_9",
        ));
        assert_eq!(problem.status, 500);
        assert_eq!(problem.detail.as_deref(), Some("An unexpected error occurred"));
    }

    #[test]
    fn test_internal_error_is_generic() {
        let problem = map_domain_error(SubmissionsError::Internal);
        assert_eq!(problem.status, 500);
        assert_eq!(problem.title, "Internal Server Error");
    }

    #[test]
    fn test_missing_form_is_not_found() {
        assert_eq!(map_domain_error(SubmissionsError::FormNotFound { form_id: 3 }).status, 404);
    }
}
