// src/services/divar.rs

//! Divar search API client.
//!
//! One call to [`ListingSource::fetch_page`] is one HTTP POST. Traversal
//! across pages lives in [`crate::pipeline::PaginatedFetcher`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Listing, SearchConfig};
use crate::utils::http::{create_async_client, error_body};

/// Widget type carrying a listing.
const POST_ROW: &str = "POST_ROW";

/// Opaque pagination token, echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(pub Value);

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Listings in source order (newest first)
    pub listings: Vec<Listing>,
    /// Whether the source reports more pages
    pub has_more: bool,
    /// Token for the next page
    pub cursor: Option<PageCursor>,
}

impl SearchPage {
    /// Split into listings and the cursor to follow, if any.
    ///
    /// A page that claims more data but carries no cursor ends traversal.
    pub fn into_parts(self) -> (Vec<Listing>, Option<PageCursor>) {
        let next = match (self.has_more, self.cursor) {
            (true, Some(cursor)) => Some(cursor),
            (true, None) => {
                log::warn!("Search page reports more results but no cursor; stopping");
                None
            }
            (false, _) => None,
        };
        (self.listings, next)
    }
}

/// A paginated source of listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page. `None` requests the first page.
    async fn fetch_page(&self, cursor: Option<&PageCursor>) -> Result<SearchPage>;
}

/// Request body for the search endpoint.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    city_ids: &'a [String],
    search_data: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination_data: Option<&'a PageCursor>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    list_widgets: Vec<Widget>,
    #[serde(default)]
    web_widgets: Option<WebWidgets>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

/// Older response layout, still served by some endpoints.
#[derive(Debug, Deserialize)]
struct WebWidgets {
    #[serde(default)]
    post_list: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    #[serde(default)]
    widget_type: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostRowData {
    token: Option<String>,
    title: Option<String>,
    image_url: Option<String>,
    top_description_text: Option<String>,
    middle_description_text: Option<String>,
    bottom_description_text: Option<String>,
    description: Option<String>,
    district: Option<String>,
    action: Option<Value>,
}

impl PostRowData {
    fn token(&self) -> Option<String> {
        self.token
            .as_deref()
            .or_else(|| {
                self.action
                    .as_ref()
                    .and_then(|a| a.pointer("/payload/token"))
                    .and_then(Value::as_str)
            })
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    fn into_listing(self) -> Option<Listing> {
        let id = self.token()?;
        let annotations = [
            self.top_description_text,
            self.middle_description_text,
            self.bottom_description_text,
            self.description,
            self.district,
        ]
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

        Some(Listing {
            id,
            title: self
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "No title".to_string()),
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
            annotations,
        })
    }
}

impl SearchResponse {
    fn into_page(self) -> SearchPage {
        let widgets = self
            .list_widgets
            .into_iter()
            .chain(self.web_widgets.into_iter().flat_map(|w| w.post_list));

        let mut listings = Vec::new();
        for widget in widgets {
            if widget.widget_type != POST_ROW {
                continue;
            }
            let row = widget
                .data
                .and_then(|data| serde_json::from_value::<PostRowData>(data).ok());
            match row.and_then(PostRowData::into_listing) {
                Some(listing) => listings.push(listing),
                None => log::debug!("Skipping malformed POST_ROW or one without a token"),
            }
        }

        let (has_more, cursor) = match self.pagination {
            Some(p) => (p.has_next_page, p.data.filter(|d| !d.is_null()).map(PageCursor)),
            None => (false, None),
        };

        SearchPage {
            listings,
            has_more,
            cursor,
        }
    }
}

/// HTTP client for the Divar search endpoint.
pub struct DivarClient {
    client: Client,
    config: SearchConfig,
}

impl DivarClient {
    /// Create a client from search settings.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = create_async_client(&config.user_agent, config.timeout())?;
        Ok(Self { client, config })
    }

    /// Parse a raw response body into a page.
    pub fn parse_page(body: &[u8]) -> Result<SearchPage> {
        let response: SearchResponse = serde_json::from_slice(body)?;
        Ok(response.into_page())
    }
}

#[async_trait]
impl ListingSource for DivarClient {
    async fn fetch_page(&self, cursor: Option<&PageCursor>) -> Result<SearchPage> {
        let request = SearchRequest {
            city_ids: &self.config.city_ids,
            search_data: &self.config.filter,
            pagination_data: cursor,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(AppError::api("search API", status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        let page = Self::parse_page(&bytes)?;
        log::debug!(
            "Search page: {} listings, has_more={}",
            page.listings.len(),
            page.has_more
        );
        Ok(page)
    }
}
