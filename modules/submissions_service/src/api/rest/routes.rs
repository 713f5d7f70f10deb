//! Route registration

use super::{dto::*, error::Problem, handlers};
use crate::contract::{FormId, SubmissionId};
use crate::domain::Service;
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use std::sync::Arc;

/// Register all REST routes
pub fn register_routes(router: Router, service: Arc<Service>) -> anyhow::Result<Router> {
    let router = router
        // Ingestion
        .route("/forms/{form_id}/process", post(process_form_handler))
        // Submissions
        .route(
            "/forms/{form_id}/submissions",
            get(search_submissions_handler).post(create_submission_handler),
        )
        .route(
            "/forms/{form_id}/submissions/delete",
            post(delete_submissions_handler),
        )
        .route(
            "/forms/{form_id}/submissions/{submission_id}",
            get(get_submission_handler)
                .put(update_submission_handler)
                .delete(delete_submission_handler),
        )
        .route(
            "/forms/{form_id}/submissions/{submission_id}/finalize",
            post(finalize_submission_handler),
        )
        // Add service as extension for handlers
        .layer(Extension(service));

    Ok(router)
}

// ===== Handler wrappers that extract service from Extension =====

async fn process_form_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<FormId>,
    headers: HeaderMap,
    form: Form<Vec<(String, String)>>,
) -> Result<Response, Problem> {
    handlers::process_form(service, path, headers, form).await
}

async fn search_submissions_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<FormId>,
    query: Query<SearchQuery>,
) -> Result<Json<SearchResponse>, Problem> {
    handlers::search_submissions(service, path, query).await
}

async fn create_submission_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<FormId>,
    headers: HeaderMap,
    json: Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<CreatedSubmissionDto>), Problem> {
    handlers::create_submission(service, path, headers, json).await
}

async fn get_submission_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<(FormId, SubmissionId)>,
    query: Query<GetSubmissionQuery>,
) -> Result<Json<SubmissionDto>, Problem> {
    handlers::get_submission(service, path, query).await
}

async fn update_submission_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<(FormId, SubmissionId)>,
    headers: HeaderMap,
    json: Json<UpdateSubmissionRequest>,
) -> Result<(StatusCode, Json<UpdateSubmissionResponse>), Problem> {
    handlers::update_submission(service, path, headers, json).await
}

async fn finalize_submission_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<(FormId, SubmissionId)>,
) -> Result<StatusCode, Problem> {
    handlers::finalize_submission(service, path).await
}

async fn delete_submission_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<(FormId, SubmissionId)>,
    query: Query<DeleteSubmissionQuery>,
) -> Result<Json<DeleteResponse>, Problem> {
    handlers::delete_submission(service, path, query).await
}

async fn delete_submissions_handler(
    Extension(service): Extension<Arc<Service>>,
    path: Path<FormId>,
    json: Json<BulkDeleteRequest>,
) -> Result<Json<DeleteResponse>, Problem> {
    handlers::delete_submissions(service, path, json).await
}
