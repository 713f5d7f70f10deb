//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    ColumnSet, DeleteOutcome, DeleteTarget, Existence, FieldId, FormId, FormPayload,
    IngestionOutcome, MappedOption, RequestContext, SearchRequest, SearchResults, SearchSpec,
    Submission, SubmissionField, SubmissionId, SubmissionUpdate, SubmissionsApi,
    SubmissionsError, UpdateOutcome, ViewId,
};
use crate::domain::Service;
use async_trait::async_trait;
use std::sync::Arc;

/// Native client implementation that directly calls the domain service
///
/// This client is used for in-process communication without HTTP overhead.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl SubmissionsApi for NativeClient {
    async fn get_submission(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        view_id: Option<ViewId>,
    ) -> Result<Vec<SubmissionField>, SubmissionsError> {
        self.service
            .get_submission(form_id, submission_id, view_id)
            .await
    }

    async fn get_submission_info(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
    ) -> Result<Option<Submission>, SubmissionsError> {
        self.service
            .get_submission_info(form_id, submission_id)
            .await
    }

    async fn create_blank_submission(
        &self,
        form_id: FormId,
        view_id: ViewId,
        finalized: bool,
        context: &RequestContext,
    ) -> Result<Option<SubmissionId>, SubmissionsError> {
        self.service
            .create_blank_submission(form_id, view_id, finalized, context)
            .await
    }

    async fn update_submission(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        update: SubmissionUpdate,
        context: &RequestContext,
    ) -> Result<UpdateOutcome, SubmissionsError> {
        self.service
            .update_submission(form_id, submission_id, update, context)
            .await
    }

    async fn finalize_submission(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
    ) -> Result<bool, SubmissionsError> {
        self.service
            .finalize_submission(form_id, submission_id)
            .await
    }

    async fn submission_exists(&self, form_id: FormId, submission_id: SubmissionId) -> Existence {
        self.service.submission_exists(form_id, submission_id).await
    }

    async fn submission_finalized(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
    ) -> Result<bool, SubmissionsError> {
        self.service
            .submission_finalized(form_id, submission_id)
            .await
    }

    async fn search_submissions(
        &self,
        form_id: FormId,
        view_id: ViewId,
        request: &SearchRequest,
    ) -> Result<SearchResults, SubmissionsError> {
        self.service
            .search_submissions(form_id, view_id, request)
            .await
    }

    async fn get_search_submission_ids(
        &self,
        form_id: FormId,
        view_id: ViewId,
        order: &str,
        search: &SearchSpec,
        searchable_columns: &ColumnSet,
    ) -> Result<Vec<SubmissionId>, SubmissionsError> {
        self.service
            .get_search_submission_ids(form_id, view_id, order, search, searchable_columns)
            .await
    }

    async fn get_submission_count(
        &self,
        form_id: FormId,
        view_id: Option<ViewId>,
    ) -> Result<u64, SubmissionsError> {
        self.service.get_submission_count(form_id, view_id).await
    }

    async fn check_view_contains_submission(
        &self,
        form_id: FormId,
        view_id: ViewId,
        submission_id: SubmissionId,
    ) -> bool {
        self.service
            .check_view_contains_submission(form_id, view_id, submission_id)
            .await
    }

    async fn get_mapped_field_options(
        &self,
        form_id: FormId,
        field_id: FieldId,
        order: &str,
    ) -> Result<Vec<MappedOption>, SubmissionsError> {
        self.service
            .get_mapped_field_options(form_id, field_id, order)
            .await
    }

    async fn delete_submission(
        &self,
        form_id: FormId,
        view_id: ViewId,
        submission_id: SubmissionId,
    ) -> Result<DeleteOutcome, SubmissionsError> {
        self.service
            .delete_submission(form_id, view_id, submission_id)
            .await
    }

    async fn delete_submissions(
        &self,
        form_id: FormId,
        view_id: ViewId,
        target: DeleteTarget,
        search: &SearchSpec,
    ) -> Result<DeleteOutcome, SubmissionsError> {
        self.service
            .delete_submissions(form_id, view_id, target, search)
            .await
    }

    async fn process_form_submission(
        &self,
        payload: FormPayload,
        request: &RequestContext,
    ) -> Result<IngestionOutcome, SubmissionsError> {
        self.service.process_form_submission(payload, request).await
    }
}
