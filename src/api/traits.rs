//! Trait abstraction for the forms service to enable mocking in tests

use async_trait::async_trait;
use serde_json::Value;

use super::ApiError;

/// Filters for `GET submissions`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionFilter {
    /// Inclusive start date, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive end date, `YYYY-MM-DD`
    pub end_date: Option<String>,
    pub form_id: Option<u64>,
}

/// Filters for `GET forms`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormQuery {
    pub status: Option<String>,
}

/// Selector for `GET forms/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormLookup {
    pub status: Option<String>,
    pub version: Option<String>,
}

impl FormLookup {
    /// The lookup used when resolving forms for submissions
    pub fn published() -> Self {
        Self {
            status: Some("published".to_string()),
            version: None,
        }
    }
}

/// Forms service operations. Bodies come back as raw JSON so callers can
/// persist exactly what the service sent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CanvasApi: Send + Sync {
    /// Fetch one page of the forms list
    async fn list_forms_page(
        &self,
        query: &FormQuery,
        page: u32,
        per_page: u32,
    ) -> Result<Value, ApiError>;

    /// Fetch one page of the submissions list
    async fn list_submissions_page(
        &self,
        filter: &SubmissionFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Value, ApiError>;

    /// Fetch one nested form definition
    async fn get_form(&self, form_id: u64, lookup: &FormLookup) -> Result<Value, ApiError>;

    /// Fetch one full submission
    async fn get_submission(&self, submission_id: &str) -> Result<Value, ApiError>;
}
