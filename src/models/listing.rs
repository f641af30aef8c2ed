//! Listing data structure.

use serde::{Deserialize, Serialize};
use url::Url;

/// A listing fetched from the search API.
///
/// Listings are never mutated after fetching; the pipeline only filters
/// and reorders collections of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    /// Post token, unique and stable on the source
    pub id: String,

    /// Listing title
    pub title: String,

    /// Optional thumbnail URL
    #[serde(default)]
    pub image_url: Option<String>,

    /// Free-text descriptors such as price or district
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl Listing {
    /// Create a listing with no image and no annotations.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Deep link to the listing page.
    pub fn post_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.id)
    }

    /// Image URL if it is an absolute http(s) URL.
    pub fn photo_url(&self) -> Option<&str> {
        let raw = self.image_url.as_deref()?.trim();
        let parsed = Url::parse(raw).ok()?;
        match parsed.scheme() {
            "http" | "https" => Some(raw),
            _ => None,
        }
    }
}
