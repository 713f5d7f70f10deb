//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to interact with the submissions service.
//! NO HTTP - direct function calls for performance.

use super::{
    error::SubmissionsError,
    model::{
        ColumnSet, DeleteOutcome, DeleteTarget, Existence, FieldId, FormId, FormPayload,
        IngestionOutcome, MappedOption, RequestContext, SearchRequest, SearchResults, SearchSpec,
        Submission, SubmissionField, SubmissionId, SubmissionUpdate, UpdateOutcome, ViewId,
    },
};
use async_trait::async_trait;

/// Submissions service API for inter-module communication
#[async_trait]
pub trait SubmissionsApi: Send + Sync {
    // ===== Single submission =====

    /// Stored values merged with field metadata, optionally shaped by a view.
    /// Empty when the row does not exist.
    async fn get_submission(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        view_id: Option<ViewId>,
    ) -> Result<Vec<SubmissionField>, SubmissionsError>;

    /// Raw row without metadata
    async fn get_submission_info(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
    ) -> Result<Option<Submission>, SubmissionsError>;

    /// Insert a row holding only system values and the view's defaults.
    /// `None` when the form does not exist.
    async fn create_blank_submission(
        &self,
        form_id: FormId,
        view_id: ViewId,
        finalized: bool,
        context: &RequestContext,
    ) -> Result<Option<SubmissionId>, SubmissionsError>;

    async fn update_submission(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        update: SubmissionUpdate,
        context: &RequestContext,
    ) -> Result<UpdateOutcome, SubmissionsError>;

    /// Mark a submission finalized; `false` when the form does not exist
    async fn finalize_submission(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
    ) -> Result<bool, SubmissionsError>;

    async fn submission_exists(&self, form_id: FormId, submission_id: SubmissionId) -> Existence;

    async fn submission_finalized(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
    ) -> Result<bool, SubmissionsError>;

    // ===== Search =====

    async fn search_submissions(
        &self,
        form_id: FormId,
        view_id: ViewId,
        request: &SearchRequest,
    ) -> Result<SearchResults, SubmissionsError>;

    /// Ids of every finalized row matching the search, in `order`
    async fn get_search_submission_ids(
        &self,
        form_id: FormId,
        view_id: ViewId,
        order: &str,
        search: &SearchSpec,
        searchable_columns: &ColumnSet,
    ) -> Result<Vec<SubmissionId>, SubmissionsError>;

    async fn get_submission_count(
        &self,
        form_id: FormId,
        view_id: Option<ViewId>,
    ) -> Result<u64, SubmissionsError>;

    async fn check_view_contains_submission(
        &self,
        form_id: FormId,
        view_id: ViewId,
        submission_id: SubmissionId,
    ) -> bool;

    async fn get_mapped_field_options(
        &self,
        form_id: FormId,
        field_id: FieldId,
        order: &str,
    ) -> Result<Vec<MappedOption>, SubmissionsError>;

    // ===== Deletion =====

    async fn delete_submission(
        &self,
        form_id: FormId,
        view_id: ViewId,
        submission_id: SubmissionId,
    ) -> Result<DeleteOutcome, SubmissionsError>;

    /// `search` is the caller's current search, used to resolve `DeleteTarget::All`
    async fn delete_submissions(
        &self,
        form_id: FormId,
        view_id: ViewId,
        target: DeleteTarget,
        search: &SearchSpec,
    ) -> Result<DeleteOutcome, SubmissionsError>;

    // ===== Ingestion =====

    /// Handle a public form post end to end
    async fn process_form_submission(
        &self,
        payload: FormPayload,
        context: &RequestContext,
    ) -> Result<IngestionOutcome, SubmissionsError>;
}
