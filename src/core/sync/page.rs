//! One page of sync results

use super::bookmark::Bookmark;
use crate::domain::SyncRecord;

/// Records returned by one fetch, plus where the next fetch resumes
///
/// `more` is a heuristic: it is true whenever the page came back full, even
/// if nothing else turns out to be pending.
#[derive(Debug, Clone)]
pub struct SyncPage<R: SyncRecord> {
    results: Vec<R>,
    bookmark: Bookmark,
    more: bool,
}

impl<R: SyncRecord> SyncPage<R> {
    /// Assembles a page fetched with the given page size
    pub fn new(results: Vec<R>, bookmark: Bookmark, page_size: usize) -> Self {
        let more = results.len() == page_size;
        Self {
            results,
            bookmark,
            more,
        }
    }

    /// Records in `(date_modified, id)` order
    pub fn results(&self) -> &[R] {
        &self.results
    }

    /// Where the next fetch resumes
    pub fn bookmark(&self) -> &Bookmark {
        &self.bookmark
    }

    /// Whether the caller should fetch again right away
    pub fn more(&self) -> bool {
        self.more
    }

    /// Splits the page into its parts
    pub fn into_parts(self) -> (Vec<R>, Bookmark, bool) {
        (self.results, self.bookmark, self.more)
    }
}
