//! Forms service access: transport, response normalization and paging

mod client;
mod envelope;
mod error;
mod pager;
mod traits;

pub use client::{CanvasClient, Credentials};
pub use error::ApiError;
pub use pager::{FormPages, PageWalker, SubmissionPages, MAX_PER_PAGE};
pub use traits::{CanvasApi, FormLookup, FormQuery, SubmissionFilter};

#[cfg(test)]
pub use traits::MockCanvasApi;
