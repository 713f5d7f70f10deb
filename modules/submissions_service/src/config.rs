//! Configuration for submissions service module

use crate::domain::query::DateOrder;
use anyhow::{bail, Context, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::Deserialize;
use std::fmt::Write;
use std::path::Path;

/// Submissions service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Joins array-shaped input before it is stored
    #[serde(default = "default_multi_value_delimiter")]
    pub multi_value_delimiter: String,

    /// Joins array-shaped input in redirect query strings
    #[serde(default = "default_query_string_separator")]
    pub query_string_multi_value_separator: String,

    /// Day/month order of dates typed into searches
    #[serde(default)]
    pub search_date_format: DateOrder,

    /// strftime format for system dates passed on redirect
    #[serde(default = "default_redirect_date_format")]
    pub redirect_date_format: String,

    /// Offset applied to system dates passed on redirect (hours)
    #[serde(default)]
    pub timezone_offset_hours: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multi_value_delimiter: default_multi_value_delimiter(),
            query_string_multi_value_separator: default_query_string_separator(),
            search_date_format: DateOrder::default(),
            redirect_date_format: default_redirect_date_format(),
            timezone_offset_hours: 0,
        }
    }
}

impl Config {
    /// Layer a YAML file (if present) and `SUBMISSIONS_*` environment variables
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SUBMISSIONS_"))
            .extract()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail once a request uses them
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.redirect_date_format).any(|item| matches!(item, Item::Error)) {
            bail!(
                "invalid redirect_date_format {:?}: unknown strftime specifier",
                self.redirect_date_format
            );
        }
        Ok(())
    }

    /// System date as passed on redirect, shifted by the configured offset
    pub fn redirect_date(&self, at: NaiveDateTime) -> Result<String, std::fmt::Error> {
        let shifted = at + chrono::Duration::hours(i64::from(self.timezone_offset_hours));
        let mut rendered = String::new();
        write!(rendered, "{}", shifted.format(&self.redirect_date_format))?;
        Ok(rendered)
    }
}

fn default_multi_value_delimiter() -> String {
    ", ".to_string()
}

fn default_query_string_separator() -> String {
    ",".to_string()
}

fn default_redirect_date_format() -> String {
    "%b %-d, %Y %-I:%M %p".to_string()
}
