//! Field-level validation of incoming submission values
//!
//! Rules are JSON Schemas evaluated against the field's submitted value
//! (a string, an array of strings, or `null` when absent).

use crate::contract::{Field, FieldId, FormPayload, SubmissionsError, SubmittedValue};
use jsonschema::Validator;
use serde_json::Value;
use std::collections::BTreeMap;

/// Validates the editable part of a submission payload
pub trait SubmissionValidator: Send + Sync {
    /// Error messages for every failing field; empty means valid
    fn validate(
        &self,
        fields: &[Field],
        editable_field_ids: &[FieldId],
        payload: &FormPayload,
    ) -> Vec<String>;
}

/// Accepts everything
#[derive(Clone, Default)]
pub struct NoOpValidator;

impl SubmissionValidator for NoOpValidator {
    fn validate(&self, _fields: &[Field], _editable: &[FieldId], _payload: &FormPayload) -> Vec<String> {
        Vec::new()
    }
}

struct FieldRule {
    validator: Validator,
    message: Option<String>,
}

/// JSON Schema rules keyed by field id
#[derive(Default)]
pub struct FieldSchemaValidator {
    rules: BTreeMap<FieldId, Vec<FieldRule>>,
}

impl FieldSchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; `message` replaces the schema error text when set
    pub fn with_rule(
        mut self,
        field_id: FieldId,
        schema: &Value,
        message: Option<&str>,
    ) -> Result<Self, SubmissionsError> {
        let validator = compile_schema(schema)?;
        self.rules.entry(field_id).or_default().push(FieldRule {
            validator,
            message: message.map(str::to_string),
        });
        Ok(self)
    }
}

impl SubmissionValidator for FieldSchemaValidator {
    fn validate(
        &self,
        fields: &[Field],
        editable_field_ids: &[FieldId],
        payload: &FormPayload,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        for field in fields.iter().filter(|f| editable_field_ids.contains(&f.field_id)) {
            let Some(rules) = self.rules.get(&field.field_id) else {
                continue;
            };
            let value = submitted_json(payload.get(&field.field_name));
            for rule in rules {
                if let Err(error) = rule.validator.validate(&value) {
                    errors.push(match &rule.message {
                        Some(message) => message.clone(),
                        None => format!("{}: {}", field.field_title, error),
                    });
                }
            }
        }
        errors
    }
}

fn compile_schema(schema: &Value) -> Result<Validator, SubmissionsError> {
    Validator::new(schema).map_err(|e| SubmissionsError::InvalidInput {
        message: format!("Invalid JSON Schema: {}", e),
    })
}

fn submitted_json(value: Option<&SubmittedValue>) -> Value {
    match value {
        None => Value::Null,
        Some(SubmittedValue::Single(value)) => Value::String(value.clone()),
        Some(SubmittedValue::Multiple(values)) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
    }
}
