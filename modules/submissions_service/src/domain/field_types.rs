//! Field-type registry
//!
//! Maps a field type id to its processing behavior: whether values are files
//! handled by the uploader, and an optional pure value transform computing the
//! stored value from raw input. Transforms are registered in code; stored field
//! configuration only selects among them.

use crate::contract::{
    Field, FieldId, FieldTypeId, RequestContext, SubmissionValue, SubmittedValue,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Everything a transform may look at
pub struct TransformInput<'a> {
    pub field: &'a Field,
    /// Raw incoming value for the field, if the request carried one
    pub value: Option<&'a SubmittedValue>,
    /// Field-type defaults overridden by the field's own settings
    pub settings: &'a BTreeMap<String, String>,
    pub context: &'a RequestContext,
    pub multi_value_delimiter: &'a str,
}

/// Computes the stored value of a field from its raw input
pub trait ValueTransform: Send + Sync {
    fn transform(&self, input: &TransformInput<'_>) -> SubmissionValue;
}

/// Registered behavior of one field type
#[derive(Clone, Default)]
pub struct FieldTypeDefinition {
    pub is_file_field: bool,
    /// Default settings, overridable per field
    pub settings: BTreeMap<String, String>,
    pub transform: Option<Arc<dyn ValueTransform>>,
}

/// What the engine needs to know when writing a field
#[derive(Clone, Default)]
pub struct ProcessingInfo {
    pub is_file_field: bool,
    pub transform: Option<Arc<dyn ValueTransform>>,
}

#[derive(Clone, Default)]
pub struct FieldTypeRegistry {
    types: HashMap<FieldTypeId, FieldTypeDefinition>,
}

impl FieldTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, field_type_id: FieldTypeId, definition: FieldTypeDefinition) {
        self.types.insert(field_type_id, definition);
    }

    /// Builder-style `register`
    pub fn with_type(mut self, field_type_id: FieldTypeId, definition: FieldTypeDefinition) -> Self {
        self.register(field_type_id, definition);
        self
    }

    /// Unknown types are plain text fields
    pub fn processing_info_for(&self, field_type_id: FieldTypeId) -> ProcessingInfo {
        self.types
            .get(&field_type_id)
            .map(|definition| ProcessingInfo {
                is_file_field: definition.is_file_field,
                transform: definition.transform.clone(),
            })
            .unwrap_or_default()
    }

    /// Settings for each requested field: type defaults overridden by the field's own
    pub fn resolved_settings_for(
        &self,
        field_ids: &[FieldId],
        form_fields: &[Field],
    ) -> HashMap<FieldId, BTreeMap<String, String>> {
        form_fields
            .iter()
            .filter(|field| field_ids.contains(&field.field_id))
            .map(|field| {
                let mut settings = self
                    .types
                    .get(&field.field_type_id)
                    .map(|definition| definition.settings.clone())
                    .unwrap_or_default();
                settings.extend(field.settings.clone());
                (field.field_id, settings)
            })
            .collect()
    }
}

/// Setting naming the strftime format a date field is typed in
pub const DATE_INPUT_FORMAT: &str = "date_format";

/// Normalizes a date typed in the field's input format to `YYYY-MM-DD HH:MM:SS`.
/// Empty or unparsable input stores an empty string.
pub struct DateInputTransform;

impl DateInputTransform {
    const DEFAULT_FORMAT: &'static str = "%m/%d/%Y";
}

impl ValueTransform for DateInputTransform {
    fn transform(&self, input: &TransformInput<'_>) -> SubmissionValue {
        let raw = input
            .value
            .map(|value| value.joined(input.multi_value_delimiter))
            .unwrap_or_default();
        let raw = raw.trim();
        let format = input
            .settings
            .get(DATE_INPUT_FORMAT)
            .map(String::as_str)
            .unwrap_or(Self::DEFAULT_FORMAT);

        let parsed = NaiveDateTime::parse_from_str(raw, format).ok().or_else(|| {
            NaiveDate::parse_from_str(raw, format)
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        });

        match parsed {
            Some(value) => SubmissionValue::text(value.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => SubmissionValue::text(""),
        }
    }
}
