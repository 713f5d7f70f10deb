//! Bot verification of public form posts

use crate::contract::RequestContext;
use anyhow::Result;
use async_trait::async_trait;

/// Outcome of a verification attempt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verification {
    pub passed: bool,
    /// Provider error codes, sent back to the form page on failure
    pub error_codes: Vec<String>,
}

impl Verification {
    pub fn passed() -> Self {
        Self {
            passed: true,
            error_codes: Vec::new(),
        }
    }

    pub fn failed(error_codes: Vec<String>) -> Self {
        Self {
            passed: false,
            error_codes,
        }
    }
}

/// Checks a CAPTCHA-style response token
#[async_trait]
pub trait BotCheck: Send + Sync {
    async fn verify(&self, token: &str, context: &RequestContext) -> Result<Verification>;
}
