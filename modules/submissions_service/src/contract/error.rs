//! Contract error types for submissions service
//!
//! These errors are transport-agnostic and used for inter-module communication.

use super::model::FormId;

/// Submissions service domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionsError {
    /// No form is registered under this id
    #[error("form not found: {form_id}")]
    FormNotFound { form_id: FormId },

    /// Form setup has not been completed
    #[error("form {form_id} has not been fully set up")]
    FormIncomplete { form_id: FormId },

    /// Form is disabled and has no inactive redirect
    #[error("form {form_id} is not accepting submissions")]
    FormInactive { form_id: FormId },

    /// Neither the form nor the request names a redirect target
    #[error("no redirect URL configured for form {form_id}")]
    NoRedirectUrl { form_id: FormId },

    /// Verification failed and there is no page to send the submitter back to
    #[error("no form URL to return to after failed verification of form {form_id}")]
    NoReturnUrl { form_id: FormId },

    /// The row store or a schema lookup failed
    #[error("Storage failure during {operation}: {message}")]
    Storage { operation: String, message: String },

    /// Requested resource does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Malformed request data
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The service itself is misconfigured or broken
    #[error("Internal error")]
    Internal,
}

impl SubmissionsError {
    pub fn storage(operation: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: error.to_string(),
        }
    }

    /// Configuration, storage and internal errors end the request; the rest are reported back
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FormNotFound { .. }
                | Self::FormIncomplete { .. }
                | Self::FormInactive { .. }
                | Self::NoRedirectUrl { .. }
                | Self::NoReturnUrl { .. }
                | Self::Storage { .. }
                | Self::Internal
        )
    }
}
