//! Row mappers
//!
//! Conversions between dynamic query rows and contract submissions. Column
//! types follow the provisioned table: integer id, datetime system dates,
//! `yes`/`no` finalized flag, text everywhere else.

use crate::contract::{
    is_system_date_column, Submission, SubmissionValue, IS_FINALIZED, SUBMISSION_ID,
};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use sea_orm::{QueryResult, Value};

/// Stored spelling of the finalized flag
pub fn flag_text(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Bind value for one column
pub fn to_db_value(value: &SubmissionValue) -> Value {
    match value {
        SubmissionValue::Null => Value::String(None),
        SubmissionValue::Flag(flag) => flag_text(*flag).into(),
        SubmissionValue::Integer(n) => (*n).into(),
        SubmissionValue::DateTime(at) => (*at).into(),
        SubmissionValue::Text(text) => text.clone().into(),
    }
}

/// Read exactly `columns` from a row, in order
pub fn read_submission(row: &QueryResult, columns: &[String]) -> Result<Submission> {
    let mut values = IndexMap::with_capacity(columns.len());
    for column in columns {
        let value = read_column(row, column)
            .with_context(|| format!("Failed to read column '{column}'"))?;
        values.insert(column.clone(), value);
    }
    Ok(Submission { values })
}

fn read_column(row: &QueryResult, column: &str) -> Result<SubmissionValue> {
    let value = if column == SUBMISSION_ID {
        row.try_get::<Option<i64>>("", column)?
            .map_or(SubmissionValue::Null, SubmissionValue::Integer)
    } else if is_system_date_column(column) {
        row.try_get::<Option<NaiveDateTime>>("", column)?
            .map_or(SubmissionValue::Null, SubmissionValue::DateTime)
    } else if column == IS_FINALIZED {
        row.try_get::<Option<String>>("", column)?
            .map_or(SubmissionValue::Null, |flag| SubmissionValue::Flag(flag == "yes"))
    } else {
        row.try_get::<Option<String>>("", column)?
            .map_or(SubmissionValue::Null, SubmissionValue::Text)
    };
    Ok(value)
}
