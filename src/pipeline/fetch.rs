// src/pipeline/fetch.rs

//! Paginated traversal of a listing source.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::Listing;
use crate::pipeline::Pacing;
use crate::services::ListingSource;

/// Result of one full traversal.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Listings in source page order (newest first)
    pub listings: Vec<Listing>,
    /// Pages successfully fetched
    pub pages: usize,
    /// Error that cut traversal short after the first page
    pub error: Option<AppError>,
}

impl FetchOutcome {
    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }
}

/// Follows pagination cursors until the source is exhausted.
pub struct PaginatedFetcher {
    source: Arc<dyn ListingSource>,
    pacing: Pacing,
    max_pages: Option<usize>,
}

impl PaginatedFetcher {
    pub fn new(source: Arc<dyn ListingSource>, pacing: Pacing) -> Self {
        Self {
            source,
            pacing,
            max_pages: None,
        }
    }

    /// Stop after this many pages even if the source has more.
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fetch every page, newest first.
    ///
    /// Fails only when the first page fails. A later failure ends traversal
    /// and is returned alongside the listings gathered so far.
    pub async fn fetch_all(&self) -> Result<FetchOutcome> {
        let first = self
            .source
            .fetch_page(None)
            .await
            .map_err(|e| AppError::fetch(1, e))?;

        let (listings, mut next) = first.into_parts();
        let mut outcome = FetchOutcome {
            listings,
            pages: 1,
            error: None,
        };

        while let Some(cursor) = next.take() {
            if let Some(max) = self.max_pages {
                if outcome.pages >= max {
                    log::info!("Reached page cap of {}, stopping traversal", max);
                    break;
                }
            }

            self.pacing.before_next_page().await;

            let page_no = outcome.pages + 1;
            match self.source.fetch_page(Some(&cursor)).await {
                Ok(page) => {
                    let (listings, cursor) = page.into_parts();
                    log::debug!("Page {}: {} listings", page_no, listings.len());
                    outcome.listings.extend(listings);
                    outcome.pages = page_no;
                    next = cursor;
                }
                Err(e) => {
                    log::warn!(
                        "Failed to fetch page {}: {}. Keeping {} listings from earlier pages.",
                        page_no,
                        e,
                        outcome.listings.len()
                    );
                    outcome.error = Some(AppError::fetch(page_no, e));
                    break;
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::services::{PageCursor, SearchPage};

    /// Source that replays scripted pages and records the cursors it saw.
    pub(crate) struct ScriptedSource {
        pages: Mutex<VecDeque<Result<SearchPage>>>,
        pub(crate) cursors: Mutex<Vec<Option<PageCursor>>>,
    }

    impl ScriptedSource {
        pub(crate) fn new(pages: Vec<Result<SearchPage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }

        /// Build pages from id lists; every page but the last links onward.
        pub(crate) fn from_ids(pages: &[&[&str]]) -> Self {
            let count = pages.len();
            let scripted = pages
                .iter()
                .enumerate()
                .map(|(i, ids)| Ok(page(ids, i + 1 < count, i + 2)))
                .collect();
            Self::new(scripted)
        }

        pub(crate) fn calls(&self) -> usize {
            self.cursors.lock().unwrap().len()
        }
    }

    pub(crate) fn page(ids: &[&str], has_more: bool, next: usize) -> SearchPage {
        SearchPage {
            listings: ids
                .iter()
                .map(|id| Listing::new(*id, format!("Listing {id}")))
                .collect(),
            has_more,
            cursor: has_more.then(|| PageCursor(json!({ "page": next }))),
        }
    }

    #[async_trait]
    impl ListingSource for ScriptedSource {
        async fn fetch_page(&self, cursor: Option<&PageCursor>) -> Result<SearchPage> {
            self.cursors.lock().unwrap().push(cursor.cloned());
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(SearchPage::default()))
        }
    }

    fn ids(outcome: &FetchOutcome) -> Vec<&str> {
        outcome.listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_follows_cursor_until_exhausted() {
        let source = Arc::new(ScriptedSource::from_ids(&[&["E", "D"], &["C", "B"], &["A"]]));
        let fetcher = PaginatedFetcher::new(source.clone(), Pacing::none());

        let outcome = fetcher.fetch_all().await.unwrap();
        assert_eq!(ids(&outcome), vec!["E", "D", "C", "B", "A"]);
        assert_eq!(outcome.pages, 3);
        assert!(!outcome.is_partial());

        let cursors = source.cursors.lock().unwrap().clone();
        assert_eq!(
            cursors,
            vec![
                None,
                Some(PageCursor(json!({ "page": 2 }))),
                Some(PageCursor(json!({ "page": 3 }))),
            ]
        );
    }

    #[tokio::test]
    async fn test_first_page_failure_fails() {
        let source = Arc::new(ScriptedSource::new(vec![Err(AppError::api(
            "search API",
            503,
            "busy",
        ))]));
        let fetcher = PaginatedFetcher::new(source, Pacing::none());

        let result = fetcher.fetch_all().await;
        assert!(matches!(result, Err(AppError::Fetch { page: 1, .. })));
    }

    #[tokio::test]
    async fn test_later_page_failure_keeps_partial_results() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(page(&["C", "B"], true, 2)),
            Err(AppError::api("search API", 429, "slow down")),
            Ok(page(&["A"], false, 0)),
        ]));
        let fetcher = PaginatedFetcher::new(source.clone(), Pacing::none());

        let outcome = fetcher.fetch_all().await.unwrap();
        assert_eq!(ids(&outcome), vec!["C", "B"]);
        assert_eq!(outcome.pages, 1);
        assert!(matches!(outcome.error, Some(AppError::Fetch { page: 2, .. })));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_cursor_ends_traversal() {
        let mut first = page(&["B"], true, 2);
        first.cursor = None;
        let source = Arc::new(ScriptedSource::new(vec![Ok(first), Ok(page(&["A"], false, 0))]));
        let fetcher = PaginatedFetcher::new(source.clone(), Pacing::none());

        let outcome = fetcher.fetch_all().await.unwrap();
        assert_eq!(ids(&outcome), vec!["B"]);
        assert!(!outcome.is_partial());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_page_cap() {
        let source = Arc::new(ScriptedSource::from_ids(&[&["C"], &["B"], &["A"]]));
        let fetcher = PaginatedFetcher::new(source.clone(), Pacing::none()).with_max_pages(Some(2));

        let outcome = fetcher.fetch_all().await.unwrap();
        assert_eq!(ids(&outcome), vec!["C", "B"]);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_pages_only() {
        let source = Arc::new(ScriptedSource::from_ids(&[&["C"], &["B"], &["A"]]));
        let pacing = Pacing {
            page_delay: std::time::Duration::from_secs(2),
            ..Pacing::none()
        };
        let fetcher = PaginatedFetcher::new(source, pacing);

        let start = tokio::time::Instant::now();
        fetcher.fetch_all().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= std::time::Duration::from_secs(4));
        assert!(elapsed < std::time::Duration::from_secs(5));
    }
}
