//! REST DTOs with serde derives for HTTP API

use crate::contract::{
    FieldId, FormPayload, SearchSpec, SubmissionId, SubmissionValue, ViewId,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ===== Search DTOs =====

/// Query parameters of a submission search.
///
/// List-valued parameters are comma separated.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub view_id: ViewId,

    /// 1-based page, defaults to the first
    #[serde(default = "default_page")]
    pub page: u64,

    /// Rows per page; omitted or zero returns every row
    pub per_page: Option<u64>,

    /// `<column>-<ASC|DESC>`
    #[serde(default)]
    pub order: String,

    /// Columns to return; omitted returns every column
    pub columns: Option<String>,

    /// Columns the keyword is matched against
    pub searchable_columns: Option<String>,

    /// Restrict results to these ids
    pub submission_ids: Option<String>,

    pub search_field: Option<String>,
    pub search_date: Option<String>,
    pub search_keyword: Option<String>,
}

fn default_page() -> u64 {
    1
}

/// One stored row, column name to value
pub type SubmissionRow = IndexMap<String, SubmissionValue>;

/// Search results response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub rows: Vec<SubmissionRow>,
    pub search_num_results: u64,
    pub view_num_results: u64,
}

// ===== Single submission DTOs =====

/// Query parameters of a single-submission read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetSubmissionQuery {
    /// Shape the result through this view
    pub view_id: Option<ViewId>,
}

/// A field of a submission with its stored value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionFieldDto {
    pub field_id: FieldId,
    pub field_name: String,
    pub column_name: String,
    pub title: String,
    pub content: Option<SubmissionValue>,
}

/// Submission response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionDto {
    pub submission_id: SubmissionId,
    pub fields: Vec<SubmissionFieldDto>,
}

/// Blank submission request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubmissionRequest {
    /// View whose new-submission defaults are applied
    pub view_id: ViewId,

    #[serde(default)]
    pub finalized: bool,
}

/// Created submission response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSubmissionDto {
    pub submission_id: SubmissionId,
}

/// Submission update request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubmissionRequest {
    /// Fields present on the editing page
    pub field_ids: Vec<FieldId>,

    /// Fields the caller may change
    pub editable_field_ids: Vec<FieldId>,

    /// Incoming values keyed by field name
    #[serde(default)]
    pub payload: FormPayload,
}

/// Submission update response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSubmissionResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

// ===== Delete DTOs =====

/// Query parameters of a single delete
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSubmissionQuery {
    pub view_id: ViewId,
}

/// Bulk delete request.
///
/// Either an explicit id list, or `all` with an optional omit list and the
/// search the caller is looking at.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeleteRequest {
    pub view_id: ViewId,

    #[serde(default)]
    pub submission_ids: Vec<SubmissionId>,

    #[serde(default)]
    pub all: bool,

    #[serde(default)]
    pub omit: Vec<SubmissionId>,

    #[serde(default)]
    pub search: SearchSpec,
}

/// Delete response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted_ids: Vec<SubmissionId>,
}

// ===== Ingestion DTOs =====

/// Returned when bot verification fails, so the origin page can re-render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailedDto {
    pub location: String,
    pub form_data: FormPayload,
    pub error_codes: Vec<String>,
}
