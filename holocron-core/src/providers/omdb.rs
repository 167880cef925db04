//! OMDb-style metadata client.

use super::decode_json;
use super::traits::{MetadataProvider, ProviderError};
use crate::constants::{DEFAULT_OMDB_URL, USER_AGENT};

use async_trait::async_trait;
use holocron_model::{MovieDetails, SearchItem};
use serde::{Deserialize, Deserializer};
use std::{fmt, time::Duration};
use tracing::debug;

/// Provider spelling of "this field has no value".
pub const NOT_AVAILABLE: &str = "N/A";

/// `true` when a provider field carries a real value.
pub fn is_available(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != NOT_AVAILABLE
}

fn available<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| is_available(v)))
}

#[derive(Debug, Deserialize)]
struct TitleResponse {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Title", default, deserialize_with = "available")]
    title: Option<String>,
    #[serde(rename = "Year", default, deserialize_with = "available")]
    year: Option<String>,
    #[serde(rename = "Poster", default, deserialize_with = "available")]
    poster: Option<String>,
    #[serde(rename = "Plot", default, deserialize_with = "available")]
    plot: Option<String>,
    #[serde(rename = "Metascore", default, deserialize_with = "available")]
    metascore: Option<String>,
    #[serde(rename = "Genre", default, deserialize_with = "available")]
    genre: Option<String>,
    #[serde(rename = "Runtime", default, deserialize_with = "available")]
    runtime: Option<String>,
    #[serde(rename = "Rated", default, deserialize_with = "available")]
    rated: Option<String>,
    #[serde(rename = "Released", default, deserialize_with = "available")]
    released: Option<String>,
    #[serde(rename = "imdbID", default, deserialize_with = "available")]
    imdb_id: Option<String>,
    #[serde(rename = "imdbRating", default, deserialize_with = "available")]
    imdb_rating: Option<String>,
}

impl TitleResponse {
    fn into_details(self) -> Option<MovieDetails> {
        if self.response.as_deref() != Some("True") {
            return None;
        }
        let imdb_id = self.imdb_id?;
        Some(MovieDetails {
            title: self.title.unwrap_or_default(),
            year: self.year,
            poster: self.poster,
            plot: self.plot,
            metascore: self.metascore,
            genre: self.genre,
            runtime: self.runtime,
            rated: self.rated,
            released: self.released,
            imdb_id,
            imdb_rating: self.imdb_rating,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<SearchRow>,
}

#[derive(Debug, Deserialize)]
struct SearchRow {
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Year", default, deserialize_with = "available")]
    year: Option<String>,
    #[serde(rename = "Poster", default, deserialize_with = "available")]
    poster: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: String,
    #[serde(rename = "Type", default, deserialize_with = "available")]
    kind: Option<String>,
}

impl From<SearchRow> for SearchItem {
    fn from(row: SearchRow) -> Self {
        SearchItem {
            title: row.title,
            year: row.year,
            poster: row.poster,
            imdb_id: row.imdb_id,
            kind: row.kind,
        }
    }
}

/// OMDb-compatible metadata client (`?apikey=&t=&y=` and `?apikey=&s=`).
pub struct OmdbProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl fmt::Debug for OmdbProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmdbProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OmdbProvider {
    /// A blank key counts as no key.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_OMDB_URL)
    }

    /// Client against a non-default API base URL.
    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::with_client(api_key, base_url, default_client(None))
    }

    /// Client reusing an existing `reqwest::Client`.
    pub fn with_client(
        api_key: Option<String>,
        base_url: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    async fn get<T>(
        &self,
        api_key: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("apikey", api_key)])
            .query(params)
            .send()
            .await?;
        decode_json(response).await
    }
}

#[async_trait]
impl MetadataProvider for OmdbProvider {
    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn find_by_title(
        &self,
        title: &str,
        year: Option<&str>,
    ) -> Result<Option<MovieDetails>, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        let mut params = vec![("t", title)];
        if let Some(year) = year.filter(|y| !y.is_empty()) {
            params.push(("y", year));
        }

        let body: TitleResponse = self.get(api_key, &params).await?;
        let details = body.into_details();
        debug!(
            title,
            year,
            found = details.is_some(),
            "metadata title lookup"
        );
        Ok(details)
    }

    async fn search(
        &self,
        query: &str,
    ) -> Result<Vec<SearchItem>, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        // `Response: "False"` bodies carry no `Search` array and decode empty.
        let body: SearchResponse = self.get(api_key, &[("s", query)]).await?;
        debug!(query, hits = body.search.len(), "metadata search");
        Ok(body.search.into_iter().map(SearchItem::from).collect())
    }
}

pub(crate) fn default_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|err| {
        tracing::warn!("falling back to default HTTP client: {err}");
        reqwest::Client::new()
    })
}
