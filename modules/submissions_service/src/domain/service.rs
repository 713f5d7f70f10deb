//! Domain service - business logic orchestration
//!
//! Single-submission operations live here; search, deletion and ingestion are
//! split into sibling modules that extend the same `Service`.

use super::catalog::FormCatalog;
use super::events::{NoOpNotifier, Notifier, SubmissionEvent, SubmissionNotification};
use super::field_types::{FieldTypeRegistry, TransformInput};
use super::files::{FileStorage, FileUploader, NoOpFileStorage, NoOpFileUploader, UploadOutcome};
use super::hooks::{take_patched, to_context_value, HookContext, HookPhase, HookPoint, HookRegistry};
use super::messages;
use super::query::{Predicate, SubmissionQuery};
use super::repository::{ColumnValues, SubmissionRepository};
use super::stats::{InMemoryStatsCache, NoOpSelectionStore, SelectionStore, StatsCache};
use super::validation::{NoOpValidator, SubmissionValidator};
use super::verification::BotCheck;
use crate::config::Config;
use crate::contract::{
    is_system_column, is_system_date_column, DeferredFileField, Existence, Field, Form, FormId,
    RequestContext, Submission, SubmissionField, SubmissionId, SubmissionUpdate, SubmissionValue,
    SubmissionsError, SubmittedValue, UpdateOutcome, ViewId, IP_ADDRESS, IS_FINALIZED,
    LAST_MODIFIED_DATE, SUBMISSION_DATE, SUBMISSION_ID, SYSTEM_COLUMNS,
};
use chrono::{NaiveDateTime, Timelike, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Collaborators the service drives besides storage and form metadata
#[derive(Clone)]
pub struct Collaborators {
    pub field_types: Arc<FieldTypeRegistry>,
    pub validator: Arc<dyn SubmissionValidator>,
    pub file_storage: Arc<dyn FileStorage>,
    pub uploader: Arc<dyn FileUploader>,
    pub notifier: Arc<dyn Notifier>,
    pub stats: Arc<dyn StatsCache>,
    pub selection: Arc<dyn SelectionStore>,
    /// Verification is skipped entirely when unset
    pub bot_check: Option<Arc<dyn BotCheck>>,
    pub hooks: HookRegistry,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            field_types: Arc::new(FieldTypeRegistry::new()),
            validator: Arc::new(NoOpValidator),
            file_storage: Arc::new(NoOpFileStorage),
            uploader: Arc::new(NoOpFileUploader),
            notifier: Arc::new(NoOpNotifier),
            stats: Arc::new(InMemoryStatsCache::new()),
            selection: Arc::new(NoOpSelectionStore),
            bot_check: None,
            hooks: HookRegistry::new(),
        }
    }
}

/// Domain service for form submissions
pub struct Service {
    pub(super) config: Config,
    pub(super) repo: Arc<dyn SubmissionRepository>,
    pub(super) catalog: Arc<dyn FormCatalog>,
    pub(super) collaborators: Collaborators,
}

impl Service {
    /// Create a new service instance
    pub fn new(
        config: Config,
        repo: Arc<dyn SubmissionRepository>,
        catalog: Arc<dyn FormCatalog>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            config,
            repo,
            catalog,
            collaborators,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ===== Single submission =====

    /// Stored values merged with field metadata.
    ///
    /// With a view, only the view's fields are returned, in the view's order and
    /// carrying its display overrides. An empty result means no such row.
    pub async fn get_submission(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        view_id: Option<ViewId>,
    ) -> Result<Vec<SubmissionField>, SubmissionsError> {
        let fields = self.form_fields(form_id).await?;
        let Some(row) = self
            .fetch_row(form_id, form_columns(&fields), submission_id, "get_submission")
            .await?
        else {
            return Ok(Vec::new());
        };

        let merged: Vec<SubmissionField> = match view_id {
            Some(view_id) => {
                let view_fields = self
                    .catalog
                    .get_view_fields(view_id)
                    .await
                    .map_err(|e| SubmissionsError::storage("get_view_fields", e))?;
                view_fields
                    .into_iter()
                    .filter_map(|view_field| {
                        let field = fields.iter().find(|f| f.field_id == view_field.field_id)?;
                        Some(SubmissionField {
                            field: field.clone(),
                            content: row.get(&field.column_name).cloned(),
                            view_field: Some(view_field),
                        })
                    })
                    .collect()
            }
            None => fields
                .iter()
                .map(|field| SubmissionField {
                    field: field.clone(),
                    content: row.get(&field.column_name).cloned(),
                    view_field: None,
                })
                .collect(),
        };

        if self.collaborators.hooks.is_empty() {
            return Ok(merged);
        }

        let mut context = HookContext::new();
        context.insert("form_id".into(), Value::from(form_id));
        context.insert("submission_id".into(), Value::from(submission_id));
        context.insert("view_id".into(), to_context_value(&view_id));
        context.insert("fields".into(), to_context_value(&merged));
        let written = self.collaborators.hooks.dispatch(
            HookPoint::GetSubmission,
            HookPhase::End,
            &mut context,
            &["fields"],
        );
        // Untouched rows keep their typed values instead of a JSON round trip
        if written.iter().any(|key| key == "fields") {
            Ok(take_patched(&mut context, "fields", merged))
        } else {
            Ok(merged)
        }
    }

    /// Raw row, no metadata
    pub async fn get_submission_info(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
    ) -> Result<Option<Submission>, SubmissionsError> {
        let fields = self.form_fields(form_id).await?;
        self.fetch_row(form_id, form_columns(&fields), submission_id, "get_submission_info")
            .await
    }

    /// Insert a row holding the system values plus the view's declared defaults.
    /// Returns `None` when the form does not exist.
    pub async fn create_blank_submission(
        &self,
        form_id: FormId,
        view_id: ViewId,
        finalized: bool,
        context: &RequestContext,
    ) -> Result<Option<SubmissionId>, SubmissionsError> {
        if !self.form_exists(form_id).await? {
            debug!(form_id, "Blank submission requested for unknown form");
            return Ok(None);
        }

        let now = current_datetime();
        let mut values = ColumnValues::new();
        values.insert(SUBMISSION_DATE.into(), SubmissionValue::DateTime(now));
        values.insert(LAST_MODIFIED_DATE.into(), SubmissionValue::DateTime(now));
        values.insert(IP_ADDRESS.into(), SubmissionValue::text(&context.ip_address));
        values.insert(IS_FINALIZED.into(), SubmissionValue::Flag(finalized));

        let defaults = self
            .catalog
            .get_new_submission_defaults(view_id)
            .await
            .map_err(|e| SubmissionsError::storage("get_new_submission_defaults", e))?;
        if !defaults.is_empty() {
            let fields = self.form_fields(form_id).await?;
            for default in defaults {
                let Some(field) = fields.iter().find(|f| f.field_id == default.field_id) else {
                    continue;
                };
                if is_system_column(&field.column_name) {
                    continue;
                }
                values.insert(
                    field.column_name.clone(),
                    SubmissionValue::Text(default.default_value),
                );
            }
        }

        let submission_id = self
            .repo
            .insert(form_id, &values)
            .await
            .map_err(|e| SubmissionsError::storage("create_blank_submission", e))?;

        let mut hook_context = HookContext::new();
        hook_context.insert("form_id".into(), Value::from(form_id));
        hook_context.insert("view_id".into(), Value::from(view_id));
        hook_context.insert("submission_id".into(), Value::from(submission_id));
        self.collaborators.hooks.dispatch(
            HookPoint::CreateSubmission,
            HookPhase::End,
            &mut hook_context,
            &[],
        );

        info!(form_id, submission_id, finalized, "Created blank submission");
        Ok(Some(submission_id))
    }

    /// Validate and apply an edit.
    ///
    /// Only fields both shown (`field_ids`) and editable (`editable_field_ids`)
    /// are written. A storage failure is reported as `NotUpdated` and skips file
    /// handling, notifications and end hooks.
    pub async fn update_submission(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        update: SubmissionUpdate,
        context: &RequestContext,
    ) -> Result<UpdateOutcome, SubmissionsError> {
        self.require_form(form_id).await?;
        let SubmissionUpdate {
            field_ids,
            editable_field_ids,
            mut payload,
        } = update;

        if !self.collaborators.hooks.is_empty() {
            let mut hook_context = HookContext::new();
            hook_context.insert("form_id".into(), Value::from(form_id));
            hook_context.insert("submission_id".into(), Value::from(submission_id));
            hook_context.insert("payload".into(), to_context_value(&payload));
            self.collaborators.hooks.dispatch(
                HookPoint::UpdateSubmission,
                HookPhase::Start,
                &mut hook_context,
                &["payload"],
            );
            payload = take_patched(&mut hook_context, "payload", payload);
        }

        let fields = self.form_fields(form_id).await?;
        let errors = self
            .collaborators
            .validator
            .validate(&fields, &editable_field_ids, &payload);
        if !errors.is_empty() {
            debug!(form_id, submission_id, errors = errors.len(), "Update rejected by validation");
            return Ok(UpdateOutcome::Rejected { errors });
        }

        let delimiter = self.config.multi_value_delimiter.as_str();
        let settings = self
            .collaborators
            .field_types
            .resolved_settings_for(&field_ids, &fields);

        let mut values = ColumnValues::new();
        values.insert(
            LAST_MODIFIED_DATE.into(),
            SubmissionValue::DateTime(current_datetime()),
        );
        let mut deferred = Vec::new();

        for field in fields
            .iter()
            .filter(|f| field_ids.contains(&f.field_id) && editable_field_ids.contains(&f.field_id))
        {
            let incoming = payload.get(&field.field_name);

            if is_system_column(&field.column_name) {
                if let Some(value) = system_column_value(field, incoming, delimiter) {
                    values.insert(field.column_name.clone(), value);
                }
                continue;
            }

            let info = self
                .collaborators
                .field_types
                .processing_info_for(field.field_type_id);
            let field_settings = settings.get(&field.field_id).cloned().unwrap_or_default();

            let value = match info.transform {
                Some(transform) => transform.transform(&TransformInput {
                    field,
                    value: incoming,
                    settings: &field_settings,
                    context,
                    multi_value_delimiter: delimiter,
                }),
                None if info.is_file_field || field.is_file_field => {
                    deferred.push(DeferredFileField {
                        field: field.clone(),
                        settings: field_settings,
                    });
                    continue;
                }
                None => SubmissionValue::Text(
                    incoming
                        .map(|value| value.joined(delimiter))
                        .unwrap_or_default(),
                ),
            };
            values.insert(field.column_name.clone(), value);
        }

        if let Err(e) = self.repo.update(form_id, submission_id, &values).await {
            warn!(form_id, submission_id, "Submission update failed: {}", e);
            return Ok(UpdateOutcome::NotUpdated {
                message: messages::SUBMISSION_NOT_UPDATED.to_string(),
            });
        }

        let upload = self
            .upload_files(form_id, submission_id, &deferred, &payload)
            .await;
        let mut hook_context = HookContext::new();
        hook_context.insert("form_id".into(), Value::from(form_id));
        hook_context.insert("submission_id".into(), Value::from(submission_id));
        hook_context.insert("file_fields".into(), to_context_value(&deferred));
        hook_context.insert("success".into(), Value::Bool(upload.success));
        hook_context.insert(
            "message".into(),
            Value::String(if upload.success {
                messages::SUBMISSION_UPDATED.to_string()
            } else {
                upload.message
            }),
        );
        self.collaborators.hooks.dispatch(
            HookPoint::UpdateSubmission,
            HookPhase::ManageFiles,
            &mut hook_context,
            &["success", "message"],
        );

        self.notify(SubmissionEvent::OnEdit, form_id, submission_id).await;

        hook_context.insert("payload".into(), to_context_value(&payload));
        self.collaborators.hooks.dispatch(
            HookPoint::UpdateSubmission,
            HookPhase::End,
            &mut hook_context,
            &["success", "message"],
        );

        let success = take_patched(&mut hook_context, "success", true);
        let message = take_patched(
            &mut hook_context,
            "message",
            messages::SUBMISSION_UPDATED.to_string(),
        );

        info!(form_id, submission_id, columns = values.len(), success, "Updated submission");
        Ok(if success {
            UpdateOutcome::Updated { message }
        } else {
            UpdateOutcome::FilesRejected { message }
        })
    }

    /// Mark a submission finalized. Returns `false` if the form does not exist.
    pub async fn finalize_submission(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
    ) -> Result<bool, SubmissionsError> {
        if !self.form_exists(form_id).await? {
            return Ok(false);
        }

        let mut values = ColumnValues::new();
        values.insert(IS_FINALIZED.into(), SubmissionValue::Flag(true));
        self.repo
            .update(form_id, submission_id, &values)
            .await
            .map_err(|e| SubmissionsError::storage("finalize_submission", e))?;

        self.notify(SubmissionEvent::OnSubmission, form_id, submission_id)
            .await;
        info!(form_id, submission_id, "Finalized submission");
        Ok(true)
    }

    /// Tri-state existence probe; a failing probe is `Indeterminate`
    pub async fn submission_exists(&self, form_id: FormId, submission_id: SubmissionId) -> Existence {
        match self.repo.exists(form_id, submission_id).await {
            Ok(true) => Existence::Exists,
            Ok(false) => Existence::Missing,
            Err(e) => {
                warn!(form_id, submission_id, "Existence probe failed: {}", e);
                Existence::Indeterminate
            }
        }
    }

    /// Whether the row is finalized; a missing row reads as not finalized
    pub async fn submission_finalized(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
    ) -> Result<bool, SubmissionsError> {
        let columns = vec![SUBMISSION_ID.to_string(), IS_FINALIZED.to_string()];
        Ok(self
            .fetch_row(form_id, columns, submission_id, "submission_finalized")
            .await?
            .is_some_and(|row| row.is_finalized()))
    }

    // ===== Shared helpers =====

    async fn fetch_row(
        &self,
        form_id: FormId,
        columns: Vec<String>,
        submission_id: SubmissionId,
        operation: &str,
    ) -> Result<Option<Submission>, SubmissionsError> {
        let query = SubmissionQuery {
            columns,
            predicate: Predicate::IdEquals(submission_id),
            order: Vec::new(),
            window: None,
        };
        let rows = self
            .repo
            .select(form_id, &query)
            .await
            .map_err(|e| SubmissionsError::storage(operation, e))?;
        Ok(rows.into_iter().next())
    }

    pub(super) async fn form_exists(&self, form_id: FormId) -> Result<bool, SubmissionsError> {
        self.catalog
            .form_exists(form_id)
            .await
            .map_err(|e| SubmissionsError::storage("form_exists", e))
    }

    pub(super) async fn require_form(&self, form_id: FormId) -> Result<Form, SubmissionsError> {
        self.catalog
            .get_form(form_id)
            .await
            .map_err(|e| SubmissionsError::storage("get_form", e))?
            .ok_or(SubmissionsError::FormNotFound { form_id })
    }

    pub(super) async fn form_fields(&self, form_id: FormId) -> Result<Vec<Field>, SubmissionsError> {
        self.catalog
            .get_form_fields(form_id)
            .await
            .map_err(|e| SubmissionsError::storage("get_form_fields", e))
    }

    /// Whether a field's values are uploaded files
    pub(super) fn is_file_field(&self, field: &Field) -> bool {
        field.is_file_field
            || self
                .collaborators
                .field_types
                .processing_info_for(field.field_type_id)
                .is_file_field
    }

    /// Hand deferred file fields to the uploader; a failing uploader is a failed upload
    pub(super) async fn upload_files(
        &self,
        form_id: FormId,
        submission_id: SubmissionId,
        deferred: &[DeferredFileField],
        payload: &crate::contract::FormPayload,
    ) -> UploadOutcome {
        if deferred.is_empty() {
            return UploadOutcome::ok();
        }
        match self
            .collaborators
            .uploader
            .upload(form_id, submission_id, deferred, payload)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(form_id, submission_id, "File upload failed: {}", e);
                UploadOutcome {
                    success: false,
                    message: e.to_string(),
                    redirect_query_params: Vec::new(),
                }
            }
        }
    }

    /// Best-effort notification
    pub(super) async fn notify(
        &self,
        event: SubmissionEvent,
        form_id: FormId,
        submission_id: SubmissionId,
    ) {
        let notification = SubmissionNotification::new(event, form_id, submission_id);
        if let Err(e) = self.collaborators.notifier.notify(notification).await {
            warn!(
                form_id,
                submission_id,
                event = event.as_str(),
                "Failed to send notification: {}",
                e
            );
        }
    }
}

/// System columns followed by the form's custom columns, in field order
pub(super) fn form_columns(fields: &[Field]) -> Vec<String> {
    let mut columns: Vec<String> = SYSTEM_COLUMNS.iter().map(|c| c.to_string()).collect();
    for field in fields {
        if !columns.iter().any(|c| *c == field.column_name) {
            columns.push(field.column_name.clone());
        }
    }
    columns
}

/// Request time, truncated to whole seconds
pub(super) fn current_datetime() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Editable system columns: the two dates (only when a usable value is given)
/// and the address. Id and finalized flag never change through an edit.
fn system_column_value(
    field: &Field,
    incoming: Option<&SubmittedValue>,
    delimiter: &str,
) -> Option<SubmissionValue> {
    let raw = incoming.map(|value| value.joined(delimiter))?;
    if is_system_date_column(&field.column_name) {
        return parse_stored_datetime(raw.trim()).map(SubmissionValue::DateTime);
    }
    (field.column_name == IP_ADDRESS).then(|| SubmissionValue::Text(raw))
}

fn parse_stored_datetime(raw: &str) -> Option<NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })
}
