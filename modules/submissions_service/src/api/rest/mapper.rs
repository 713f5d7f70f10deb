//! Mapper implementations for converting between DTOs and contract models
//!
//! This module contains the From/TryFrom conversions between REST DTOs and
//! transport-agnostic contract models, plus request-shape helpers.

use super::dto::*;
use crate::contract::{
    self, ColumnSet, DeleteTarget, FormPayload, PageSize, Pagination, RequestContext,
    SearchRequest, SearchSpec, SubmissionId, SubmissionsError, SubmittedValue,
};
use axum::http::{header, HeaderMap};

/// Suffix marking a multi-valued key in an urlencoded form post
const ARRAY_KEY_SUFFIX: &str = "[]";

// ===== Search conversions =====

impl TryFrom<SearchQuery> for SearchRequest {
    type Error = SubmissionsError;

    fn try_from(query: SearchQuery) -> Result<Self, Self::Error> {
        let submission_ids = split_list(query.submission_ids.as_deref())
            .into_iter()
            .map(|id| {
                id.parse::<SubmissionId>().map_err(|_| SubmissionsError::InvalidInput {
                    message: format!("'{id}' is not a submission id"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            pagination: Pagination {
                page: query.page.max(1),
                per_page: match query.per_page {
                    Some(limit) if limit > 0 => PageSize::Limit(limit),
                    _ => PageSize::Unbounded,
                },
            },
            order: query.order,
            columns: column_set(query.columns.as_deref()),
            search: SearchSpec {
                search_field: query.search_field,
                search_date: query.search_date,
                search_keyword: query.search_keyword,
            },
            submission_ids,
            searchable_columns: query
                .searchable_columns
                .as_deref()
                .map(|columns| column_set(Some(columns))),
        })
    }
}

impl From<contract::SearchResults> for SearchResponse {
    fn from(results: contract::SearchResults) -> Self {
        Self {
            rows: results.rows.into_iter().map(|row| row.values).collect(),
            search_num_results: results.search_num_results,
            view_num_results: results.view_num_results,
        }
    }
}

fn split_list(list: Option<&str>) -> Vec<String> {
    list.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn column_set(columns: Option<&str>) -> ColumnSet {
    let columns = split_list(columns);
    if columns.is_empty() {
        ColumnSet::All
    } else {
        ColumnSet::Only(columns)
    }
}

// ===== Submission conversions =====

impl From<contract::SubmissionField> for SubmissionFieldDto {
    fn from(field: contract::SubmissionField) -> Self {
        Self {
            title: field.display_title().to_string(),
            field_id: field.field.field_id,
            field_name: field.field.field_name,
            column_name: field.field.column_name,
            content: field.content,
        }
    }
}

impl From<UpdateSubmissionRequest> for contract::SubmissionUpdate {
    fn from(req: UpdateSubmissionRequest) -> Self {
        Self {
            field_ids: req.field_ids,
            editable_field_ids: req.editable_field_ids,
            payload: req.payload,
        }
    }
}

impl From<contract::UpdateOutcome> for UpdateSubmissionResponse {
    fn from(outcome: contract::UpdateOutcome) -> Self {
        use contract::UpdateOutcome::*;

        match outcome {
            Updated { message } => Self {
                success: true,
                message: Some(message),
                errors: Vec::new(),
            },
            FilesRejected { message } | NotUpdated { message } => Self {
                success: false,
                message: Some(message),
                errors: Vec::new(),
            },
            Rejected { errors } => Self {
                success: false,
                message: None,
                errors,
            },
        }
    }
}

// ===== Delete conversions =====

impl TryFrom<&BulkDeleteRequest> for DeleteTarget {
    type Error = SubmissionsError;

    fn try_from(req: &BulkDeleteRequest) -> Result<Self, Self::Error> {
        if req.all {
            return Ok(Self::All {
                omit: req.omit.clone(),
            });
        }
        if req.submission_ids.is_empty() {
            return Err(SubmissionsError::InvalidInput {
                message: "either submission_ids or all must be given".to_string(),
            });
        }
        Ok(Self::Ids(req.submission_ids.clone()))
    }
}

impl From<contract::DeleteOutcome> for DeleteResponse {
    fn from(outcome: contract::DeleteOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
            deleted_ids: outcome.deleted_ids,
        }
    }
}

// ===== Ingestion helpers =====

/// Group urlencoded pairs into a payload. Keys ending in `[]` or repeated
/// keys become multi-valued, in arrival order.
pub fn payload_from_pairs(pairs: Vec<(String, String)>) -> FormPayload {
    let mut payload = FormPayload::new();
    for (key, value) in pairs {
        let (key, is_array) = match key.strip_suffix(ARRAY_KEY_SUFFIX).map(str::to_string) {
            Some(stripped) => (stripped, true),
            None => (key, false),
        };
        if let Some(existing) = payload.get_mut(&key) {
            let mut values = match std::mem::replace(existing, SubmittedValue::Multiple(Vec::new())) {
                SubmittedValue::Single(first) => vec![first],
                SubmittedValue::Multiple(values) => values,
            };
            values.push(value);
            *existing = SubmittedValue::Multiple(values);
        } else if is_array {
            payload.insert(key, SubmittedValue::Multiple(vec![value]));
        } else {
            payload.insert(key, SubmittedValue::Single(value));
        }
    }
    payload
}

/// Requester details from proxy and browser headers
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    RequestContext {
        ip_address,
        referer,
        account: None,
    }
}
