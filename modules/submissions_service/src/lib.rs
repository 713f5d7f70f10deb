//! Submissions Service Module
//!
//! Storage, search and lifecycle of form submissions. Every form owns a
//! dynamically shaped table; reads are composed at runtime from the form's
//! fields, the view's filters and the caller's search.

// Public exports
pub mod contract;
pub use contract::{
    client::SubmissionsApi, error::SubmissionsError, Field, Form, FormPayload, RequestContext,
    SearchRequest, SearchSpec, Submission, SubmissionValue, View,
};

pub mod module;
pub use module::{init_tracing, SubmissionsModule};

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
