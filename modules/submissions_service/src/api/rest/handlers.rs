//! HTTP request handlers - thin layer that delegates to domain service

use super::{
    dto::*,
    error::{map_domain_error, Problem},
    mapper::{payload_from_pairs, request_context},
};
use crate::contract::{
    DeleteTarget, FormId, IngestionOutcome, SearchRequest, SubmissionId, SubmissionsError,
};
use crate::domain::ingestion::FORM_ID_KEY;
use crate::domain::Service;
use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use std::sync::Arc;

// ===== Ingestion =====

/// Public form post; answers with a redirect
pub async fn process_form(
    service: Arc<Service>,
    Path(form_id): Path<FormId>,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, Problem> {
    let mut payload = payload_from_pairs(pairs);
    // The route names the form; a conflicting body value is ignored
    payload.insert(FORM_ID_KEY.to_string(), form_id.to_string().as_str().into());

    let outcome = service
        .process_form_submission(payload, &request_context(&headers))
        .await
        .map_err(map_domain_error)?;

    Ok(match outcome {
        IngestionOutcome::Redirect { location, .. } => {
            (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response()
        }
        IngestionOutcome::VerificationFailed {
            location,
            form_data,
            error_codes,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(VerificationFailedDto {
                location,
                form_data,
                error_codes,
            }),
        )
            .into_response(),
    })
}

// ===== Search =====

/// One page of a view's submissions
pub async fn search_submissions(
    service: Arc<Service>,
    Path(form_id): Path<FormId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, Problem> {
    let view_id = query.view_id;
    let request = SearchRequest::try_from(query).map_err(map_domain_error)?;
    let results = service
        .search_submissions(form_id, view_id, &request)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(results.into()))
}

// ===== Single submission =====

/// Get a submission with field metadata
pub async fn get_submission(
    service: Arc<Service>,
    Path((form_id, submission_id)): Path<(FormId, SubmissionId)>,
    Query(query): Query<GetSubmissionQuery>,
) -> Result<Json<SubmissionDto>, Problem> {
    let fields = service
        .get_submission(form_id, submission_id, query.view_id)
        .await
        .map_err(map_domain_error)?;
    if fields.is_empty() {
        return Err(map_domain_error(submission_not_found(submission_id)));
    }

    Ok(Json(SubmissionDto {
        submission_id,
        fields: fields.into_iter().map(Into::into).collect(),
    }))
}

/// Create an empty submission
pub async fn create_submission(
    service: Arc<Service>,
    Path(form_id): Path<FormId>,
    headers: HeaderMap,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<CreatedSubmissionDto>), Problem> {
    let submission_id = service
        .create_blank_submission(form_id, req.view_id, req.finalized, &request_context(&headers))
        .await
        .map_err(map_domain_error)?
        .ok_or_else(|| map_domain_error(SubmissionsError::FormNotFound { form_id }))?;

    Ok((StatusCode::CREATED, Json(CreatedSubmissionDto { submission_id })))
}

/// Update a submission's editable fields
pub async fn update_submission(
    service: Arc<Service>,
    Path((form_id, submission_id)): Path<(FormId, SubmissionId)>,
    headers: HeaderMap,
    Json(req): Json<UpdateSubmissionRequest>,
) -> Result<(StatusCode, Json<UpdateSubmissionResponse>), Problem> {
    let outcome = service
        .update_submission(form_id, submission_id, req.into(), &request_context(&headers))
        .await
        .map_err(map_domain_error)?;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(outcome.into())))
}

/// Finalize a submission
pub async fn finalize_submission(
    service: Arc<Service>,
    Path((form_id, submission_id)): Path<(FormId, SubmissionId)>,
) -> Result<StatusCode, Problem> {
    let finalized = service
        .finalize_submission(form_id, submission_id)
        .await
        .map_err(map_domain_error)?;
    if !finalized {
        return Err(map_domain_error(SubmissionsError::FormNotFound { form_id }));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ===== Delete =====

/// Delete one submission
pub async fn delete_submission(
    service: Arc<Service>,
    Path((form_id, submission_id)): Path<(FormId, SubmissionId)>,
    Query(query): Query<DeleteSubmissionQuery>,
) -> Result<Json<DeleteResponse>, Problem> {
    let outcome = service
        .delete_submission(form_id, query.view_id, submission_id)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(outcome.into()))
}

/// Delete an id list, or everything the caller's search matches
pub async fn delete_submissions(
    service: Arc<Service>,
    Path(form_id): Path<FormId>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<DeleteResponse>, Problem> {
    let target = DeleteTarget::try_from(&req).map_err(map_domain_error)?;
    let outcome = service
        .delete_submissions(form_id, req.view_id, target, &req.search)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(outcome.into()))
}

fn submission_not_found(submission_id: SubmissionId) -> SubmissionsError {
    SubmissionsError::NotFound {
        resource: "Submission".to_string(),
        id: submission_id.to_string(),
    }
}
