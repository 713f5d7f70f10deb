//! Contract models for submissions service
//!
//! These models are transport-agnostic and used for inter-module communication.
//! Serde derives are present so the extension dispatcher can snapshot and patch
//! request state as JSON.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type FormId = i64;
pub type FieldId = i64;
pub type FieldTypeId = i64;
pub type ViewId = i64;
pub type SubmissionId = i64;

// ===== System columns =====

pub const SUBMISSION_ID: &str = "submission_id";
pub const SUBMISSION_DATE: &str = "submission_date";
pub const LAST_MODIFIED_DATE: &str = "last_modified_date";
pub const IP_ADDRESS: &str = "ip_address";
pub const IS_FINALIZED: &str = "is_finalized";

/// Columns every form table carries, in table order
pub const SYSTEM_COLUMNS: [&str; 5] = [
    SUBMISSION_ID,
    SUBMISSION_DATE,
    LAST_MODIFIED_DATE,
    IP_ADDRESS,
    IS_FINALIZED,
];

pub fn is_system_column(column: &str) -> bool {
    SYSTEM_COLUMNS.contains(&column)
}

/// Native DATETIME system columns
pub fn is_system_date_column(column: &str) -> bool {
    column == SUBMISSION_DATE || column == LAST_MODIFIED_DATE
}

// ===== Forms and fields =====

/// A defined submission target with its own storage table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub form_id: FormId,
    pub form_name: String,
    /// Whether form setup has been completed
    pub is_complete: bool,
    /// Whether the form accepts submissions
    pub is_active: bool,
    /// Where to send the submitter after a successful submission
    pub redirect_url: Option<String>,
    /// Strip HTML tags from incoming values
    pub strip_tags_on_submit: bool,
    /// Delete uploaded files together with their submission
    pub auto_delete_files_on_submission_delete: bool,
}

/// Storage-level data type of a field column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldDataType {
    #[default]
    String,
    Number,
    Date,
}

/// One named, typed column of a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub field_id: FieldId,
    pub form_id: FormId,
    /// Key the field is submitted under
    pub field_name: String,
    /// Column in the form table
    pub column_name: String,
    pub field_title: String,
    pub field_type_id: FieldTypeId,
    pub field_size: String,
    pub data_type: FieldDataType,
    pub list_order: u32,
    pub is_system_field: bool,
    pub is_file_field: bool,
    pub is_date_field: bool,
    pub include_on_redirect: bool,
    /// Per-field overrides of the field type's settings
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

// ===== Views =====

/// A reusable filtered/ordered subset of a form's fields and rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub view_id: ViewId,
    pub form_id: FormId,
    pub view_name: String,
}

/// View-specific display settings for a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewField {
    pub view_id: ViewId,
    pub field_id: FieldId,
    pub list_order: u32,
    pub is_editable: bool,
    pub is_searchable: bool,
    pub is_sortable: bool,
    /// Overrides the field title when displayed through this view
    pub title_override: Option<String>,
}

/// Default value assigned to a field when a submission is created through a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubmissionDefault {
    pub field_id: FieldId,
    pub default_value: String,
}

/// Comparison applied by a view filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Like,
    NotLike,
    Before,
    After,
}

/// Storage-level row filter configured on a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
    pub column_name: String,
    pub operator: FilterOperator,
    /// Several values are OR-combined
    pub values: Vec<String>,
    /// Compare the column as a date
    #[serde(default)]
    pub is_date: bool,
}

// ===== Submissions =====

/// Typed scalar stored in one column of a submission row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmissionValue {
    Null,
    Flag(bool),
    Integer(i64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl SubmissionValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Value rendered as stored text; `None` for NULL
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Flag(flag) => Some(if *flag { "yes" } else { "no" }.to_string()),
            Self::Integer(value) => Some(value.to_string()),
            Self::DateTime(value) => Some(value.format("%Y-%m-%d %H:%M:%S").to_string()),
            Self::Text(value) => Some(value.clone()),
        }
    }

    /// NULL or an empty string
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(value) => value.is_empty(),
            _ => false,
        }
    }

    /// Split a multi-valued column back into its items, preserving order
    pub fn split_multi(&self, delimiter: &str) -> Vec<String> {
        match self.as_text() {
            Some(text) if !text.is_empty() => {
                text.split(delimiter).map(str::to_string).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// One stored row, as an ordered mapping of column name to value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Submission {
    pub values: IndexMap<String, SubmissionValue>,
}

impl Submission {
    pub fn id(&self) -> Option<SubmissionId> {
        match self.values.get(SUBMISSION_ID) {
            Some(SubmissionValue::Integer(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn get(&self, column: &str) -> Option<&SubmissionValue> {
        self.values.get(column)
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.values.get(IS_FINALIZED), Some(SubmissionValue::Flag(true)))
    }
}

/// A form field merged with its stored value (and view settings, if any)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionField {
    pub field: Field,
    pub content: Option<SubmissionValue>,
    pub view_field: Option<ViewField>,
}

impl SubmissionField {
    /// Title as displayed, honouring a view override
    pub fn display_title(&self) -> &str {
        self.view_field
            .as_ref()
            .and_then(|vf| vf.title_override.as_deref())
            .unwrap_or(&self.field.field_title)
    }
}

// ===== Incoming data =====

/// Raw value received for one key of a submission payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedValue {
    Single(String),
    Multiple(Vec<String>),
}

impl SubmittedValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(value) => value.is_empty(),
            Self::Multiple(values) => values.is_empty(),
        }
    }

    /// Scalar as-is, arrays joined with `delimiter`
    pub fn joined(&self, delimiter: &str) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::Multiple(values) => values.join(delimiter),
        }
    }
}

impl From<&str> for SubmittedValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<&str>> for SubmittedValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Incoming key/value map of a submission request
pub type FormPayload = IndexMap<String, SubmittedValue>;

/// Who is making the request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: String,
    pub referer: Option<String>,
    /// Logged-in account details, handed to value transforms
    pub account: Option<serde_json::Value>,
}

impl RequestContext {
    pub fn from_ip(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            ..Self::default()
        }
    }
}

// ===== Search =====

/// Free-text/date search parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchSpec {
    /// `all`, a column name, or `<column>|date`
    pub search_field: Option<String>,
    /// Single date or a `start - end` range
    pub search_date: Option<String>,
    pub search_keyword: Option<String>,
}

impl SearchSpec {
    pub fn is_empty(&self) -> bool {
        self.search_field.is_none() && self.search_date.is_none() && self.search_keyword.is_none()
    }
}

/// Either every column or an explicit column list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSet {
    #[default]
    All,
    Only(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    Unbounded,
    Limit(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number
    pub page: u64,
    pub per_page: PageSize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PageSize::Unbounded,
        }
    }
}

/// Everything a search over a form needs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub pagination: Pagination,
    /// `<column>-<ASC|DESC>`; empty sorts by submission id
    pub order: String,
    pub columns: ColumnSet,
    pub search: SearchSpec,
    /// Restrict results to these ids; empty means no restriction
    pub submission_ids: Vec<SubmissionId>,
    /// Columns the keyword is matched against; defaults to `columns`
    pub searchable_columns: Option<ColumnSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The requested page of rows
    pub rows: Vec<Submission>,
    /// Rows matching the search across all pages
    pub search_num_results: u64,
    /// Rows in the view regardless of the search
    pub view_num_results: u64,
}

/// Option built from another form's column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedOption {
    pub value: SubmissionId,
    pub name: String,
}

// ===== Mutations =====

/// Which rows a delete acts on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteTarget {
    Single(SubmissionId),
    Ids(Vec<SubmissionId>),
    /// Every row matching the current search, minus `omit`
    All { omit: Vec<SubmissionId> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// False only when one or more files could not be removed
    pub success: bool,
    pub message: String,
    pub deleted_ids: Vec<SubmissionId>,
}

/// Update request for a single submission
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionUpdate {
    /// Fields present on the editing page
    pub field_ids: Vec<FieldId>,
    /// Fields the caller may change
    pub editable_field_ids: Vec<FieldId>,
    pub payload: FormPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Updated { message: String },
    /// Row committed but deferred file handling reported a failure
    FilesRejected { message: String },
    /// Validation failed; nothing written
    Rejected { errors: Vec<String> },
    /// The row store refused the update
    NotUpdated { message: String },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Result of an existence probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Existence {
    Exists,
    Missing,
    /// The probe itself failed
    Indeterminate,
}

/// Where ingestion sends the submitter next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestionOutcome {
    Redirect {
        location: String,
        submission_id: Option<SubmissionId>,
    },
    /// Bot check failed; input and error codes go back to the origin page
    VerificationFailed {
        location: String,
        form_data: FormPayload,
        error_codes: Vec<String>,
    },
}

// ===== Files and stats =====

/// An uploaded file attached to a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub submission_id: SubmissionId,
    pub field_id: FieldId,
    pub field_type_id: FieldTypeId,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProblem {
    pub filename: String,
    pub error: String,
}

/// File field whose value is handled by the uploader rather than written directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredFileField {
    pub field: Field,
    pub settings: BTreeMap<String, String>,
}

/// Cached aggregate stats for a form or view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionStats {
    pub submission_count: u64,
    pub first_submission_date: Option<NaiveDateTime>,
}
