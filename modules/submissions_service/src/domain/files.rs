//! File collaborators: storage cleanup and upload handling

use crate::contract::{DeferredFileField, FileProblem, FileRef, FormId, FormPayload, SubmissionId};
use anyhow::Result;
use async_trait::async_trait;

/// Removes files that belonged to deleted submissions
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Delete a batch of files; returns one problem per file that could not be removed
    async fn delete_files(&self, form_id: FormId, files: &[FileRef]) -> Result<Vec<FileProblem>>;
}

/// Result of handing deferred file fields to the uploader
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadOutcome {
    pub success: bool,
    pub message: String,
    /// Extra `(key, value)` pairs for the post-submission redirect
    pub redirect_query_params: Vec<(String, String)>,
}

impl UploadOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }
}

/// Stores uploaded files for file fields and records them on the submission
#[async_trait]
pub trait FileUploader: Send + Sync {
    async fn upload(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        fields: &[DeferredFileField],
        payload: &FormPayload,
    ) -> Result<UploadOutcome>;
}

/// No-op file storage for when files are managed elsewhere
#[derive(Clone, Default)]
pub struct NoOpFileStorage;

#[async_trait]
impl FileStorage for NoOpFileStorage {
    async fn delete_files(&self, _form_id: FormId, _files: &[FileRef]) -> Result<Vec<FileProblem>> {
        Ok(Vec::new())
    }
}

/// No-op uploader: accepts every file field without storing anything
#[derive(Clone, Default)]
pub struct NoOpFileUploader;

#[async_trait]
impl FileUploader for NoOpFileUploader {
    async fn upload(
        &self,
        _form_id: FormId,
        _submission_id: SubmissionId,
        _fields: &[DeferredFileField],
        _payload: &FormPayload,
    ) -> Result<UploadOutcome> {
        Ok(UploadOutcome::ok())
    }
}
