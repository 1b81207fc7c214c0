//! HTTP client for the GoCanvas v3 REST API
//!
//! Thin transport over reqwest: builds URLs and query strings, attaches
//! credentials and turns non-2xx responses into [`ApiError`]s. Retries are
//! left to the caller.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, error};

use super::traits::{CanvasApi, FormLookup, FormQuery, SubmissionFilter};
use super::ApiError;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://www.gocanvas.com/api/v3";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How the client authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// Client for the forms service
pub struct CanvasClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl fmt::Debug for CanvasClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl CanvasClient {
    /// Create a new client. `base_url` defaults to [`DEFAULT_BASE_URL`];
    /// trailing slashes are stripped.
    pub fn new(base_url: Option<&str>, credentials: Credentials) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            credentials,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = self.url(endpoint);
        debug!("Making GET request to {url}");
        if !query.is_empty() {
            debug!("Query parameters: {query:?}");
        }

        let request = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .query(query);
        let request = match &self.credentials {
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        };

        let response = request.send().await.map_err(|e| {
            error!("Request to {url} failed: {e}");
            ApiError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Request to {url} failed with status {status}");
            error!("Response body: {body}");
            return Err(ApiError::from_status(status, body));
        }

        response.json().await.map_err(ApiError::from)
    }
}

fn page_params(page: u32, per_page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.to_string()),
        ("per_page", per_page.to_string()),
    ]
}

fn submission_params(filter: &SubmissionFilter, page: u32, per_page: u32) -> Vec<(&'static str, String)> {
    let mut params = page_params(page, per_page);
    if let Some(start) = filter.start_date.as_deref().filter(|s| !s.is_empty()) {
        params.push(("start_date", start.to_string()));
    }
    if let Some(end) = filter.end_date.as_deref().filter(|s| !s.is_empty()) {
        params.push(("end_date", end.to_string()));
    }
    if let Some(form_id) = filter.form_id {
        params.push(("form_id", form_id.to_string()));
    }
    params
}

fn form_params(lookup: &FormLookup) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(status) = lookup.status.as_deref().filter(|s| !s.is_empty()) {
        params.push(("status", status.to_string()));
    }
    if let Some(version) = lookup.version.as_deref().filter(|s| !s.is_empty()) {
        params.push(("version", version.to_string()));
    }
    params
}

#[async_trait]
impl CanvasApi for CanvasClient {
    async fn list_forms_page(
        &self,
        query: &FormQuery,
        page: u32,
        per_page: u32,
    ) -> Result<Value, ApiError> {
        let mut params = page_params(page, per_page);
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(("status", status.to_string()));
        }
        self.get_json("forms", &params).await
    }

    async fn list_submissions_page(
        &self,
        filter: &SubmissionFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Value, ApiError> {
        self.get_json("submissions", &submission_params(filter, page, per_page))
            .await
    }

    async fn get_form(&self, form_id: u64, lookup: &FormLookup) -> Result<Value, ApiError> {
        self.get_json(&format!("forms/{form_id}"), &form_params(lookup))
            .await
    }

    async fn get_submission(&self, submission_id: &str) -> Result<Value, ApiError> {
        self.get_json(&format!("submissions/{submission_id}"), &[])
            .await
    }
}
