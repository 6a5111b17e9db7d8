use serde::{Deserialize, Serialize};

/// One page of an offset-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// 1-based page number, when the backend reports it.
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            page: None,
            total_pages: None,
        }
    }
}

impl<T> Page<T> {
    /// Page number to request next, `None` once the last page is reached.
    ///
    /// `fetched` is how many pages have been loaded so far, used when the
    /// backend omits `page`. A missing `totalPages` counts as a single page.
    pub fn next_page(&self, fetched: u32) -> Option<u32> {
        let current = self.page.unwrap_or(fetched);
        let total = self.total_pages.unwrap_or(1);
        (current < total).then_some(current + 1)
    }

    /// Total page count, at least 1.
    pub fn total_pages(&self) -> u32 {
        self.total_pages.unwrap_or(1).max(1)
    }
}
