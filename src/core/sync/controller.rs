//! Incremental sync controller
//!
//! The controller is the per-resource entry point of the sync protocol: it
//! decodes the client's bookmark, runs exactly one fetch and re-encodes the
//! resulting bookmark.

use super::bookmark::Bookmark;
use super::fetcher::SyncPageFetcher;
use crate::domain::{Result, SyncRecord};
use serde::Serialize;
use serde_json::{json, Value};

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Parameters of one sync call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Bookmark from the previous response, `None` on first sync
    pub bookmark: Option<String>,

    /// Whether voided records are delivered
    pub include_voided: bool,

    /// Page size
    pub max_results: usize,
}

/// Response to one sync call
#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse<R> {
    /// Records changed since the incoming bookmark
    pub results: Vec<R>,

    /// Opaque bookmark to send on the next call
    pub bookmark: String,

    /// Whether the client should call again right away
    pub more: bool,
}

impl<R> SyncResponse<R> {
    /// Renders the response as JSON, converting each record with `render`
    pub fn to_json<F>(&self, render: F) -> Value
    where
        F: Fn(&R) -> Value,
    {
        json!({
            "results": self.results.iter().map(render).collect::<Vec<_>>(),
            "bookmark": self.bookmark,
            "more": self.more,
        })
    }
}

/// Serves the sync protocol for one record kind
pub struct SyncController<R: SyncRecord> {
    fetcher: SyncPageFetcher<R>,
    page_size: usize,
    include_voided: bool,
}

impl<R: SyncRecord> SyncController<R> {
    /// Creates a controller with the default page size, delivering voided records
    pub fn new(fetcher: SyncPageFetcher<R>) -> Self {
        Self {
            fetcher,
            page_size: DEFAULT_PAGE_SIZE,
            include_voided: true,
        }
    }

    /// Overrides the page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Overrides whether voided records are delivered
    pub fn with_include_voided(mut self, include_voided: bool) -> Self {
        self.include_voided = include_voided;
        self
    }

    /// A request using this controller's defaults
    pub fn default_request(&self, bookmark: Option<&str>) -> SyncRequest {
        SyncRequest {
            bookmark: bookmark.map(str::to_string),
            include_voided: self.include_voided,
            max_results: self.page_size,
        }
    }

    /// Returns everything changed since `bookmark`, one page at a time
    ///
    /// # Errors
    ///
    /// Returns `MalformedBookmark` for an undecodable bookmark and passes
    /// fetch errors through unchanged.
    pub async fn sync_since(&self, bookmark: Option<&str>) -> Result<SyncResponse<R>> {
        self.sync(&self.default_request(bookmark)).await
    }

    /// Runs one sync call with explicit parameters
    pub async fn sync(&self, request: &SyncRequest) -> Result<SyncResponse<R>> {
        let since = request
            .bookmark
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(Bookmark::from_store)
            .transpose()?;

        let page = self
            .fetcher
            .fetch(since.as_ref(), request.include_voided, request.max_results)
            .await?;
        let (results, bookmark, more) = page.into_parts();
        let bookmark = bookmark.serialize();

        crate::log_sync_page!(R::KIND, results.len(), more, bookmark);

        Ok(SyncResponse {
            results,
            bookmark,
            more,
        })
    }
}
