//! Sequential page walking over list endpoints
//!
//! Pages are always requested one after another. Some list endpoints page
//! without a cursor, so fetching ahead could skip or repeat rows.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::envelope::{Collection, Envelope};
use super::traits::{CanvasApi, FormQuery, SubmissionFilter};
use super::ApiError;

/// Service maximum for `per_page`
pub const MAX_PER_PAGE: u32 = 100;

/// Something that can produce numbered pages of one collection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageSource: Send + Sync {
    fn collection(&self) -> Collection;

    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Value, ApiError>;
}

/// Pages of `GET submissions` under a fixed filter
pub struct SubmissionPages<'a, A: CanvasApi> {
    pub api: &'a A,
    pub filter: &'a SubmissionFilter,
}

#[async_trait]
impl<'a, A: CanvasApi> PageSource for SubmissionPages<'a, A> {
    fn collection(&self) -> Collection {
        Collection::Submissions
    }

    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Value, ApiError> {
        self.api
            .list_submissions_page(self.filter, page, per_page)
            .await
    }
}

/// Pages of `GET forms` under a fixed query
pub struct FormPages<'a, A: CanvasApi> {
    pub api: &'a A,
    pub query: &'a FormQuery,
}

#[async_trait]
impl<'a, A: CanvasApi> PageSource for FormPages<'a, A> {
    fn collection(&self) -> Collection {
        Collection::Forms
    }

    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Value, ApiError> {
        self.api.list_forms_page(self.query, page, per_page).await
    }
}

/// Walks a [`PageSource`] from page 1 until it runs out
#[derive(Debug, Clone, Copy)]
pub struct PageWalker {
    per_page: u32,
}

impl Default for PageWalker {
    fn default() -> Self {
        Self::new(MAX_PER_PAGE)
    }
}

impl PageWalker {
    /// `per_page` is clamped to `1..=MAX_PER_PAGE`
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Fetch and normalize a single page
    pub async fn fetch_page<S>(&self, source: &S, page: u32) -> Result<Envelope, ApiError>
    where
        S: PageSource + ?Sized,
    {
        debug!("Fetching {} page {page}...", source.collection().key());
        let body = source.fetch_page(page, self.per_page).await?;
        Ok(Envelope::normalize(body, source.collection(), page))
    }

    /// Fetch every record of the collection, in page order.
    ///
    /// Stops on the first page that reports no further pages, is not full
    /// (absent counters), or is empty. Any request error aborts the walk.
    pub async fn fetch_all<S>(&self, source: &S) -> Result<Vec<Value>, ApiError>
    where
        S: PageSource + ?Sized,
    {
        let name = source.collection().key();
        let mut records = Vec::new();
        let mut page = 1;
        debug!("Walking {name} with {} records per page", self.per_page());

        loop {
            let envelope = self.fetch_page(source, page).await?;
            let has_more = envelope.has_more(self.per_page);
            let count = envelope.records().len();

            records.extend(envelope.into_records());
            info!(
                "Retrieved {count} {name} from page {page} (total: {})",
                records.len()
            );

            if !has_more || count == 0 {
                break;
            }
            page += 1;
        }

        info!("Total {name} retrieved: {}", records.len());
        Ok(records)
    }
}
