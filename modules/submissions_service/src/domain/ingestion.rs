//! Ingestion of public form posts
//!
//! Steps run in a fixed order: form lookup, start hooks, form state checks,
//! bot verification, field filtering, insert, end hooks, redirect parameters,
//! file handling with notification, and finally the redirect itself.

use super::events::SubmissionEvent;
use super::hooks::{take_patched, to_context_value, HookContext, HookPhase, HookPoint};
use super::repository::ColumnValues;
use super::service::{current_datetime, Service};
use crate::config::Config;
use crate::contract::{
    is_system_column, DeferredFileField, Field, Form, FormId, FormPayload, IngestionOutcome,
    RequestContext, SubmissionId, SubmissionValue, SubmissionsError, SubmittedValue, IP_ADDRESS,
    IS_FINALIZED, LAST_MODIFIED_DATE, SUBMISSION_DATE, SUBMISSION_ID,
};
use chrono::NaiveDateTime;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

// ===== Control keys =====

pub const FORM_ID_KEY: &str = "form_tools_form_id";
/// Present (with any value) to process without storing anything
pub const IGNORE_SUBMISSION_KEY: &str = "form_tools_ignore_submission";
pub const REDIRECT_URL_KEY: &str = "form_tools_redirect_url";
pub const INACTIVE_FORM_REDIRECT_URL_KEY: &str = "form_tools_inactive_form_redirect_url";
pub const FORM_URL_KEY: &str = "form_tools_form_url";
pub const BOT_CHECK_RESPONSE_KEY: &str = "g-recaptcha-response";

const TAG_PATTERN_SOURCE: &str = r"(?s)<!--.*?-->|</?[A-Za-z!?][^>]*>";

static TAG_PATTERN: OnceCell<Regex> = OnceCell::new();

impl Service {
    /// Handle a public form post end to end
    pub async fn process_form_submission(
        &self,
        payload: FormPayload,
        request: &RequestContext,
    ) -> Result<IngestionOutcome, SubmissionsError> {
        let form_id = form_id_from(&payload)?;
        let form = self.require_form(form_id).await?;

        let mut form_data = payload;
        if !self.collaborators.hooks.is_empty() {
            let mut context = HookContext::new();
            context.insert("form_id".into(), Value::from(form_id));
            context.insert("form_data".into(), to_context_value(&form_data));
            self.collaborators.hooks.dispatch(
                HookPoint::ProcessForm,
                HookPhase::Start,
                &mut context,
                &["form_data"],
            );
            form_data = take_patched(&mut context, "form_data", form_data);
        }

        if !form.is_complete {
            return Err(SubmissionsError::FormIncomplete { form_id });
        }
        if !form.is_active {
            return match non_empty(&form_data, INACTIVE_FORM_REDIRECT_URL_KEY) {
                Some(location) => {
                    debug!(form_id, "Inactive form, redirecting");
                    Ok(IngestionOutcome::Redirect {
                        location,
                        submission_id: None,
                    })
                }
                None => Err(SubmissionsError::FormInactive { form_id }),
            };
        }

        if let Some(failed) = self.verify(form_id, &form_data, request).await? {
            return Ok(failed);
        }

        let fields = self.form_fields(form_id).await?;
        let now = current_datetime();
        let ignored = form_data.contains_key(IGNORE_SUBMISSION_KEY);

        let mut values = self.submitted_columns(&form, &fields, &form_data)?;
        values.insert(SUBMISSION_DATE.into(), SubmissionValue::DateTime(now));
        values.insert(LAST_MODIFIED_DATE.into(), SubmissionValue::DateTime(now));
        values.insert(IP_ADDRESS.into(), SubmissionValue::text(&request.ip_address));
        values.insert(IS_FINALIZED.into(), SubmissionValue::Flag(true));

        let submission_id = if ignored {
            debug!(form_id, "Submission ignored by request");
            None
        } else {
            let submission_id = self
                .repo
                .insert(form_id, &values)
                .await
                .map_err(|e| SubmissionsError::storage("process_form_submission", e))?;

            let mut context = HookContext::new();
            context.insert("form_id".into(), Value::from(form_id));
            context.insert("submission_id".into(), Value::from(submission_id));
            self.collaborators.hooks.dispatch(
                HookPoint::ProcessForm,
                HookPhase::End,
                &mut context,
                &[],
            );
            Some(submission_id)
        };

        let mut redirect_query_params = redirect_query_params(
            &self.config,
            &fields,
            |field| self.is_file_field(field),
            &form_data,
            submission_id,
            now,
            &request.ip_address,
        )?;

        if let Some(submission_id) = submission_id {
            let deferred: Vec<DeferredFileField> = {
                let file_fields: Vec<_> = fields
                    .iter()
                    .filter(|f| !f.is_system_field && self.is_file_field(f))
                    .map(|f| f.field_id)
                    .collect();
                let settings = self
                    .collaborators
                    .field_types
                    .resolved_settings_for(&file_fields, &fields);
                fields
                    .iter()
                    .filter(|f| file_fields.contains(&f.field_id))
                    .map(|f| DeferredFileField {
                        field: f.clone(),
                        settings: settings.get(&f.field_id).cloned().unwrap_or_default(),
                    })
                    .collect()
            };

            let upload = self
                .upload_files(form_id, submission_id, &deferred, &form_data)
                .await;
            if !upload.success {
                warn!(form_id, submission_id, "File handling failed: {}", upload.message);
            }
            redirect_query_params.extend(
                upload
                    .redirect_query_params
                    .iter()
                    .map(|(key, value)| query_param(key, value)),
            );

            let mut context = HookContext::new();
            context.insert("form_id".into(), Value::from(form_id));
            context.insert("submission_id".into(), Value::from(submission_id));
            context.insert("file_fields".into(), to_context_value(&deferred));
            context.insert("success".into(), Value::Bool(upload.success));
            context.insert("message".into(), Value::String(upload.message));
            context.insert(
                "redirect_query_params".into(),
                to_context_value(&redirect_query_params),
            );
            self.collaborators.hooks.dispatch(
                HookPoint::ProcessForm,
                HookPhase::ManageFiles,
                &mut context,
                &["success", "message", "redirect_query_params"],
            );
            redirect_query_params =
                take_patched(&mut context, "redirect_query_params", redirect_query_params);

            self.notify(SubmissionEvent::OnSubmission, form_id, submission_id)
                .await;
        }

        let target = non_empty(&form_data, REDIRECT_URL_KEY)
            .or_else(|| form.redirect_url.clone().filter(|url| !url.is_empty()))
            .ok_or(SubmissionsError::NoRedirectUrl { form_id })?;

        info!(form_id, ?submission_id, "Processed form submission");
        Ok(IngestionOutcome::Redirect {
            location: build_redirect_url(&target, &redirect_query_params),
            submission_id,
        })
    }

    /// `Some(outcome)` when the bot check ran and failed
    async fn verify(
        &self,
        form_id: FormId,
        form_data: &FormPayload,
        request: &RequestContext,
    ) -> Result<Option<IngestionOutcome>, SubmissionsError> {
        let Some(bot_check) = &self.collaborators.bot_check else {
            return Ok(None);
        };
        let Some(token) = form_data.get(BOT_CHECK_RESPONSE_KEY) else {
            return Ok(None);
        };

        let verification = match bot_check.verify(&token.joined(""), request).await {
            Ok(verification) => verification,
            Err(e) => {
                warn!(form_id, "Bot verification unavailable: {}", e);
                super::verification::Verification::failed(vec!["verification-unavailable".into()])
            }
        };
        if verification.passed {
            return Ok(None);
        }

        let location = non_empty(form_data, FORM_URL_KEY)
            .or_else(|| request.referer.clone().filter(|r| !r.is_empty()))
            .ok_or(SubmissionsError::NoReturnUrl { form_id })?;

        info!(form_id, "Bot verification failed, returning to form");
        Ok(Some(IngestionOutcome::VerificationFailed {
            location,
            form_data: form_data.clone(),
            error_codes: verification.error_codes,
        }))
    }

    /// Stored values for the custom, non-file fields present in the post
    fn submitted_columns(
        &self,
        form: &Form,
        fields: &[Field],
        form_data: &FormPayload,
    ) -> Result<ColumnValues, SubmissionsError> {
        let delimiter = self.config.multi_value_delimiter.as_str();
        let tags = if form.strip_tags_on_submit {
            Some(tag_pattern()?)
        } else {
            None
        };
        let mut values = ColumnValues::new();
        for field in fields {
            if field.is_system_field || is_system_column(&field.column_name) || self.is_file_field(field) {
                continue;
            }
            let Some(value) = form_data.get(&field.field_name) else {
                continue;
            };
            let value = match tags {
                Some(pattern) => strip_tags_from(pattern, value),
                None => value.clone(),
            };
            values.insert(
                field.column_name.clone(),
                SubmissionValue::Text(value.joined(delimiter)),
            );
        }
        Ok(values)
    }
}

fn form_id_from(payload: &FormPayload) -> Result<FormId, SubmissionsError> {
    let raw = non_empty(payload, FORM_ID_KEY).ok_or_else(|| SubmissionsError::InvalidInput {
        message: format!("missing {FORM_ID_KEY}"),
    })?;
    raw.trim()
        .parse()
        .map_err(|_| SubmissionsError::InvalidInput {
            message: format!("invalid {FORM_ID_KEY}: {raw}"),
        })
}

fn non_empty(form_data: &FormPayload, key: &str) -> Option<String> {
    form_data
        .get(key)
        .map(|value| value.joined(","))
        .filter(|value| !value.is_empty())
}

fn tag_pattern() -> Result<&'static Regex, SubmissionsError> {
    TAG_PATTERN
        .get_or_try_init(|| Regex::new(TAG_PATTERN_SOURCE))
        .map_err(|e| {
            error!("Tag pattern failed to compile: {}", e);
            SubmissionsError::Internal
        })
}

/// Remove HTML tags and comments
pub fn strip_tags(value: &str) -> Result<String, SubmissionsError> {
    Ok(tag_pattern()?.replace_all(value, "").into_owned())
}

fn strip_tags_from(pattern: &Regex, value: &SubmittedValue) -> SubmittedValue {
    let strip = |text: &str| pattern.replace_all(text, "").into_owned();
    match value {
        SubmittedValue::Single(value) => SubmittedValue::Single(strip(value)),
        SubmittedValue::Multiple(values) => {
            SubmittedValue::Multiple(values.iter().map(|v| strip(v)).collect())
        }
    }
}

fn query_param(key: &str, value: &str) -> String {
    format!("{key}={}", urlencoding::encode(value))
}

/// `key=value` pairs for every redirect-eligible, non-file field
fn redirect_query_params(
    config: &Config,
    fields: &[Field],
    is_file_field: impl Fn(&Field) -> bool,
    form_data: &FormPayload,
    submission_id: Option<SubmissionId>,
    now: NaiveDateTime,
    ip_address: &str,
) -> Result<Vec<String>, SubmissionsError> {
    let mut params = Vec::new();
    for field in fields.iter().filter(|f| f.include_on_redirect && !is_file_field(*f)) {
        match field.column_name.as_str() {
            SUBMISSION_ID => params.push(query_param(
                SUBMISSION_ID,
                &submission_id.map(|id| id.to_string()).unwrap_or_default(),
            )),
            SUBMISSION_DATE | LAST_MODIFIED_DATE => {
                let formatted = config.redirect_date(now).map_err(|_| {
                    error!(
                        format = %config.redirect_date_format,
                        "Redirect date format cannot be rendered"
                    );
                    SubmissionsError::Internal
                })?;
                params.push(query_param(&field.column_name, &formatted))
            }
            IP_ADDRESS => params.push(query_param(IP_ADDRESS, ip_address)),
            _ => {
                if let Some(value) = form_data.get(&field.field_name) {
                    params.push(query_param(
                        &field.field_name,
                        &value.joined(&config.query_string_multi_value_separator),
                    ));
                }
            }
        }
    }
    Ok(params)
}

/// Append parameters, extending an existing query string
fn build_redirect_url(target: &str, params: &[String]) -> String {
    if params.is_empty() {
        return target.to_string();
    }
    let separator = if target.contains('?') { '&' } else { '?' };
    format!("{target}{separator}{}", params.join("&"))
}
