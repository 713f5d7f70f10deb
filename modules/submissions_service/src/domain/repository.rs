//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs

use super::query::{Predicate, SubmissionQuery};
use crate::contract::{FormId, Submission, SubmissionId, SubmissionValue};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use indexmap::IndexMap;

/// Column name to value, in write order
pub type ColumnValues = IndexMap<String, SubmissionValue>;

/// Repository for the rows of per-form submission tables
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Run a composed read against the form's table.
    /// Rows carry exactly the query's columns.
    async fn select(&self, form_id: FormId, query: &SubmissionQuery) -> Result<Vec<Submission>>;

    /// Count rows matching a predicate
    async fn count(&self, form_id: FormId, predicate: &Predicate) -> Result<u64>;

    /// Oldest `submission_date` among rows matching a predicate
    async fn earliest_submission_date(
        &self,
        form_id: FormId,
        predicate: &Predicate,
    ) -> Result<Option<NaiveDateTime>>;

    /// Insert a row and return its generated id
    async fn insert(&self, form_id: FormId, values: &ColumnValues) -> Result<SubmissionId>;

    /// Update the given columns of one row
    async fn update(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        values: &ColumnValues,
    ) -> Result<()>;

    /// Delete every listed row in a single statement
    async fn delete(&self, form_id: FormId, submission_ids: &[SubmissionId]) -> Result<u64>;

    /// Check whether a row exists
    async fn exists(&self, form_id: FormId, submission_id: SubmissionId) -> Result<bool>;
}
