//! Single and bulk submission deletion
//!
//! File cleanup is best-effort: problems are reported in the outcome but rows
//! are deleted regardless, and a committed row delete is never rolled back.

use super::events::SubmissionEvent;
use super::hooks::{take_patched, to_context_value, HookContext, HookPhase, HookPoint};
use super::messages;
use super::query::{self, SubmissionQuery};
use super::service::Service;
use crate::contract::{
    ColumnSet, DeleteOutcome, DeleteTarget, Field, FileProblem, FileRef, FormId, SearchSpec,
    SubmissionId, SubmissionsError, ViewId, SUBMISSION_ID,
};
use serde_json::Value;
use tracing::{info, warn};

/// Order used when re-resolving an "all" target
const RESOLVE_ORDER: &str = "submission_id-ASC";

impl Service {
    /// Delete one submission, its files (when the form says so), and refresh stats
    pub async fn delete_submission(
        &self,
        form_id: FormId,
        view_id: ViewId,
        submission_id: SubmissionId,
    ) -> Result<DeleteOutcome, SubmissionsError> {
        let form = self.require_form(form_id).await?;

        let mut context = HookContext::new();
        context.insert("form_id".into(), Value::from(form_id));
        context.insert("view_id".into(), Value::from(view_id));
        context.insert("submission_id".into(), Value::from(submission_id));
        self.collaborators.hooks.dispatch(
            HookPoint::DeleteSubmission,
            HookPhase::Start,
            &mut context,
            &[],
        );

        let fields = self.form_fields(form_id).await?;

        self.notify(SubmissionEvent::OnDelete, form_id, submission_id)
            .await;

        let (files, problems) = if form.auto_delete_files_on_submission_delete {
            let files = self.collect_files(form_id, &fields, &[submission_id]).await?;
            let problems = self.delete_files(form_id, &files).await;
            (files, problems)
        } else {
            (Vec::new(), Vec::new())
        };

        self.repo
            .delete(form_id, &[submission_id])
            .await
            .map_err(|e| SubmissionsError::storage("delete_submission", e))?;

        let (success, message) = delete_message(
            1,
            form.auto_delete_files_on_submission_delete && !files.is_empty(),
            &problems,
        );

        self.refresh_stats(form_id, Some(view_id)).await;

        context.insert("success".into(), Value::Bool(success));
        context.insert("message".into(), Value::String(message.clone()));
        self.collaborators.hooks.dispatch(
            HookPoint::DeleteSubmission,
            HookPhase::End,
            &mut context,
            &["success", "message"],
        );
        let success = take_patched(&mut context, "success", success);
        let message = take_patched(&mut context, "message", message);

        self.collaborators.selection.deselect(form_id, submission_id);

        info!(form_id, submission_id, files = files.len(), problems = problems.len(), "Deleted submission");
        Ok(DeleteOutcome {
            success,
            message,
            deleted_ids: vec![submission_id],
        })
    }

    /// Delete a set of submissions.
    ///
    /// `DeleteTarget::All` is resolved now, from the view's filters and the
    /// caller's current `search`, minus the omit list. An empty resolved set
    /// changes nothing and reports `success = false` with no message.
    pub async fn delete_submissions(
        &self,
        form_id: FormId,
        view_id: ViewId,
        target: DeleteTarget,
        search: &SearchSpec,
    ) -> Result<DeleteOutcome, SubmissionsError> {
        let form = self.require_form(form_id).await?;
        let fields = self.form_fields(form_id).await?;

        let mut submission_ids = match target {
            DeleteTarget::Single(submission_id) => vec![submission_id],
            DeleteTarget::Ids(ids) => ids,
            DeleteTarget::All { omit } => {
                let searchable = self.view_searchable_columns(view_id, &fields).await?;
                self.get_search_submission_ids(form_id, view_id, RESOLVE_ORDER, search, &searchable)
                    .await?
                    .into_iter()
                    .filter(|id| !omit.contains(id))
                    .collect()
            }
        };
        dedupe(&mut submission_ids);

        if submission_ids.is_empty() {
            return Ok(nothing_deleted());
        }

        let mut context = HookContext::new();
        context.insert("form_id".into(), Value::from(form_id));
        context.insert("view_id".into(), Value::from(view_id));
        context.insert("search".into(), to_context_value(search));
        context.insert("submission_ids".into(), to_context_value(&submission_ids));
        self.collaborators.hooks.dispatch(
            HookPoint::DeleteSubmissions,
            HookPhase::Start,
            &mut context,
            &["submission_ids"],
        );
        submission_ids = take_patched(&mut context, "submission_ids", submission_ids);
        dedupe(&mut submission_ids);
        if submission_ids.is_empty() {
            return Ok(nothing_deleted());
        }

        let has_file_field = fields.iter().any(|f| self.is_file_field(f));
        let (files, problems) = if form.auto_delete_files_on_submission_delete {
            let files = self.collect_files(form_id, &fields, &submission_ids).await?;
            let problems = self.delete_files(form_id, &files).await;
            (files, problems)
        } else {
            (Vec::new(), Vec::new())
        };

        let deleted = self
            .repo
            .delete(form_id, &submission_ids)
            .await
            .map_err(|e| SubmissionsError::storage("delete_submissions", e))?;

        let (success, message) = delete_message(
            submission_ids.len(),
            form.auto_delete_files_on_submission_delete && has_file_field,
            &problems,
        );

        self.refresh_stats(form_id, Some(view_id)).await;
        self.collaborators.selection.clear(form_id);

        for submission_id in &submission_ids {
            self.notify(SubmissionEvent::OnDelete, form_id, *submission_id)
                .await;
        }

        context.insert("submission_ids".into(), to_context_value(&submission_ids));
        context.insert("success".into(), Value::Bool(success));
        context.insert("message".into(), Value::String(message.clone()));
        self.collaborators.hooks.dispatch(
            HookPoint::DeleteSubmissions,
            HookPhase::End,
            &mut context,
            &["success", "message"],
        );
        let success = take_patched(&mut context, "success", success);
        let message = take_patched(&mut context, "message", message);

        info!(
            form_id,
            view_id,
            requested = submission_ids.len(),
            deleted,
            files = files.len(),
            problems = problems.len(),
            "Deleted submissions"
        );
        Ok(DeleteOutcome {
            success,
            message,
            deleted_ids: submission_ids,
        })
    }

    /// Non-empty stored filenames of every file field of the given rows
    async fn collect_files(
        &self,
        form_id: FormId,
        fields: &[Field],
        submission_ids: &[SubmissionId],
    ) -> Result<Vec<FileRef>, SubmissionsError> {
        let file_fields: Vec<&Field> = fields.iter().filter(|f| self.is_file_field(f)).collect();
        let Some(predicate) = query::submission_id_allowlist(submission_ids) else {
            return Ok(Vec::new());
        };
        if file_fields.is_empty() {
            return Ok(Vec::new());
        }

        let columns = query::select_columns(
            &ColumnSet::Only(file_fields.iter().map(|f| f.column_name.clone()).collect()),
            &[],
        );
        let rows = self
            .repo
            .select(
                form_id,
                &SubmissionQuery {
                    columns,
                    predicate,
                    order: query::order_by(fields, SUBMISSION_ID),
                    window: None,
                },
            )
            .await
            .map_err(|e| SubmissionsError::storage("collect_submission_files", e))?;

        let mut files = Vec::new();
        for row in &rows {
            let Some(submission_id) = row.id() else {
                continue;
            };
            for field in &file_fields {
                let Some(filename) = row.get(&field.column_name).and_then(|v| v.as_text()) else {
                    continue;
                };
                if filename.is_empty() {
                    continue;
                }
                files.push(FileRef {
                    submission_id,
                    field_id: field.field_id,
                    field_type_id: field.field_type_id,
                    filename,
                });
            }
        }
        Ok(files)
    }

    /// Hand files to storage; a failing collaborator is a problem for every file
    async fn delete_files(&self, form_id: FormId, files: &[FileRef]) -> Vec<FileProblem> {
        if files.is_empty() {
            return Vec::new();
        }
        match self.collaborators.file_storage.delete_files(form_id, files).await {
            Ok(problems) => {
                if !problems.is_empty() {
                    warn!(form_id, problems = problems.len(), "Some submission files could not be deleted");
                }
                problems
            }
            Err(e) => {
                warn!(form_id, files = files.len(), "File storage failed: {}", e);
                files
                    .iter()
                    .map(|file| FileProblem {
                        filename: file.filename.clone(),
                        error: e.to_string(),
                    })
                    .collect()
            }
        }
    }

    /// Columns the view lets users search. A view without any makes keyword
    /// searches match nothing extra, so only the date range and filters apply.
    async fn view_searchable_columns(
        &self,
        view_id: ViewId,
        fields: &[Field],
    ) -> Result<ColumnSet, SubmissionsError> {
        let field_ids = self
            .catalog
            .get_searchable_fields(view_id)
            .await
            .map_err(|e| SubmissionsError::storage("get_searchable_fields", e))?;
        Ok(ColumnSet::Only(
            fields
                .iter()
                .filter(|f| field_ids.contains(&f.field_id))
                .map(|f| f.column_name.clone())
                .collect(),
        ))
    }
}

fn nothing_deleted() -> DeleteOutcome {
    DeleteOutcome {
        success: false,
        message: String::new(),
        deleted_ids: Vec::new(),
    }
}

fn dedupe(ids: &mut Vec<SubmissionId>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

/// Success flag and message for a completed delete of `count` rows
fn delete_message(count: usize, files_deleted: bool, problems: &[FileProblem]) -> (bool, String) {
    let plural = count > 1;
    if problems.is_empty() {
        let message = match (plural, files_deleted) {
            (false, false) => messages::SUBMISSION_DELETED,
            (false, true) => messages::SUBMISSION_AND_FILES_DELETED,
            (true, false) => messages::SUBMISSIONS_DELETED,
            (true, true) => messages::SUBMISSIONS_AND_FILES_DELETED,
        };
        return (true, message.to_string());
    }

    let mut lines = vec![if plural {
        messages::SUBMISSIONS_DELETED_WITH_PROBLEMS.to_string()
    } else {
        messages::SUBMISSION_DELETED_WITH_PROBLEMS.to_string()
    }];
    lines.extend(
        problems
            .iter()
            .map(|p| messages::file_problem_line(&p.filename, &p.error)),
    );
    (false, lines.join("\n"))
}
