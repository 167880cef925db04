//! Provider seams and their shared error type.

use async_trait::async_trait;
use holocron_model::{
    CharacterId, FilmDetails, FilmId, FilmRef, MovieDetails, Person,
    PersonRef, SearchItem, catalog::CatalogEntry,
};
use std::fmt;

/// Failure talking to an external source.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Non-success status or a provider-reported error.
    #[error("API error: {0}")]
    ApiError(String),

    /// HTTP 404.
    #[error("Not found")]
    NotFound,

    /// HTTP 429.
    #[error("Rate limited")]
    RateLimited,

    /// HTTP 401, or the provider rejected the key.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Transport failure, including timeouts.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The body did not have the expected shape.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The GraphQL response carried `errors` and no usable data.
    #[error("GraphQL error: {0}")]
    GraphQl(String),
}

/// `{id, title}` and `{id, name}` rows backing the slug indexes.
#[derive(Debug, Clone, Default)]
pub struct SlugListing {
    /// Every film.
    pub films: Vec<FilmRef>,
    /// The first page of characters.
    pub people: Vec<PersonRef>,
}

/// Primary catalog (films and characters).
#[async_trait]
pub trait CatalogSource: Send + Sync + fmt::Debug {
    /// Every film in the catalog, in upstream order.
    async fn films(&self) -> Result<Vec<CatalogEntry>, ProviderError>;

    /// Film titles and character names for slug lookups.
    async fn slug_listing(&self) -> Result<SlugListing, ProviderError>;

    /// Film detail, `None` for an unknown id.
    async fn film(
        &self,
        id: &FilmId,
    ) -> Result<Option<FilmDetails>, ProviderError>;

    /// Character detail, `None` for an unknown id.
    async fn person(
        &self,
        id: &CharacterId,
    ) -> Result<Option<Person>, ProviderError>;
}

/// Poster/plot/rating provider.
#[async_trait]
pub trait MetadataProvider: Send + Sync + fmt::Debug {
    /// `false` when no API key is configured. A disabled provider answers
    /// every call with "no result" and never touches the network.
    fn is_enabled(&self) -> bool;

    /// Best match for `title`, narrowed to `year` when given.
    async fn find_by_title(
        &self,
        title: &str,
        year: Option<&str>,
    ) -> Result<Option<MovieDetails>, ProviderError>;

    /// Free-text search hits.
    async fn search(
        &self,
        query: &str,
    ) -> Result<Vec<SearchItem>, ProviderError>;
}

/// Wiki page image lookup by page title.
#[async_trait]
pub trait WikiImageProvider: Send + Sync + fmt::Debug {
    /// Candidate image URLs for `name`, best first: the exact-title page,
    /// then search hits. Each page offers its original upload when present,
    /// otherwise its thumbnail. Callers validate candidates in order.
    async fn page_images(
        &self,
        name: &str,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Checks that a candidate URL actually serves an image.
#[async_trait]
pub trait ImageProbe: Send + Sync + fmt::Debug {
    /// `true` when `url` serves an image.
    async fn probe(&self, url: &str) -> bool;
}
