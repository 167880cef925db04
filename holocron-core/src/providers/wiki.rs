//! MediaWiki `pageimages` lookups for character portraits.

use super::decode_json;
use super::omdb::default_client;
use super::traits::{ProviderError, WikiImageProvider};
use crate::constants::DEFAULT_WIKI_API_URL;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const THUMBNAIL_SIZE: &str = "800";
const SEARCH_LIMIT: &str = "5";

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: HashMap<String, WikiPage>,
}

#[derive(Debug, Default, Deserialize)]
struct WikiPage {
    /// Search rank, only present for generator queries.
    #[serde(default)]
    index: Option<i64>,
    #[serde(default)]
    original: Option<PageImage>,
    #[serde(default)]
    thumbnail: Option<PageImage>,
}

#[derive(Debug, Default, Deserialize)]
struct PageImage {
    #[serde(default)]
    source: Option<String>,
}

/// Which pages a query should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageLookup {
    ExactTitle,
    Search,
}

/// MediaWiki `pageimages` client (Wookieepedia by default).
#[derive(Debug)]
pub struct WikiProvider {
    http: reqwest::Client,
    api_url: String,
}

impl Default for WikiProvider {
    fn default() -> Self {
        Self::new(DEFAULT_WIKI_API_URL)
    }
}

impl WikiProvider {
    /// Client for the `api.php` endpoint at `api_url`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(api_url, default_client(None))
    }

    /// Client reusing an existing `reqwest::Client`.
    pub fn with_client(api_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    async fn query(
        &self,
        name: &str,
        lookup: PageLookup,
    ) -> Result<Vec<String>, ProviderError> {
        let mut params = vec![
            ("action", "query"),
            ("format", "json"),
            ("prop", "pageimages"),
            ("piprop", "original|thumbnail"),
            ("pithumbsize", THUMBNAIL_SIZE),
        ];
        match lookup {
            PageLookup::ExactTitle => params.push(("titles", name)),
            PageLookup::Search => {
                params.push(("generator", "search"));
                params.push(("gsrsearch", name));
                params.push(("gsrlimit", SEARCH_LIMIT));
            }
        }

        let response = self
            .http
            .get(&self.api_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&params)
            .send()
            .await?;
        let body: QueryResponse = decode_json(response).await?;
        Ok(body.query.map(|q| page_images(q.pages)).unwrap_or_default())
    }
}

#[async_trait]
impl WikiImageProvider for WikiProvider {
    async fn page_images(
        &self,
        name: &str,
    ) -> Result<Vec<String>, ProviderError> {
        // Only report an error when no query got an answer at all.
        let mut answered = false;
        let mut last_error = None;
        let mut candidates: Vec<String> = Vec::new();
        for lookup in [PageLookup::ExactTitle, PageLookup::Search] {
            match self.query(name, lookup).await {
                Ok(urls) => {
                    answered = true;
                    debug!(name, ?lookup, found = urls.len(), "wiki page images");
                    for url in urls {
                        if !candidates.contains(&url) {
                            candidates.push(url);
                        }
                    }
                }
                Err(err) => {
                    debug!(name, ?lookup, error = %err, "wiki query failed");
                    last_error = Some(err);
                }
            }
        }
        match last_error {
            Some(err) if !answered => Err(err),
            _ => Ok(candidates),
        }
    }
}

/// Page keys are opaque ids (`"-1"` for missing pages), so order by search
/// rank first and numeric id second. Each page contributes one image: its
/// original upload, else its thumbnail.
fn page_images(pages: HashMap<String, WikiPage>) -> Vec<String> {
    let mut pages: Vec<(String, WikiPage)> = pages.into_iter().collect();
    pages.sort_by_key(|(key, page)| {
        (
            page.index.unwrap_or(i64::MAX),
            key.parse::<i64>().unwrap_or(i64::MAX),
        )
    });

    pages
        .into_iter()
        .filter_map(|(_, page)| {
            let original = page.original.and_then(|img| img.source);
            let thumbnail = page.thumbnail.and_then(|img| img.source);
            original
                .filter(|url| !url.is_empty())
                .or(thumbnail.filter(|url| !url.is_empty()))
        })
        .collect()
}
