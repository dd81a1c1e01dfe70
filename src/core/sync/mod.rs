//! Incremental sync protocol
//!
//! - [`bookmark`] - Opaque resume positions
//! - [`clock`] - Injectable wall clock
//! - [`page`] - One page of results
//! - [`fetcher`] - Fetches a page and derives its bookmark
//! - [`controller`] - Per-resource protocol entry point

pub mod bookmark;
pub mod clock;
pub mod controller;
pub mod fetcher;
pub mod page;

pub use bookmark::{Bookmark, DEFAULT_BUFFER_MILLIS, MAX_BUFFER_MILLIS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{SyncController, SyncRequest, SyncResponse, DEFAULT_PAGE_SIZE};
pub use fetcher::SyncPageFetcher;
pub use page::SyncPage;
