//! Movie details and character search backed by the metadata provider.

use std::{collections::HashSet, fmt, sync::Arc};

use dashmap::DashMap;
use holocron_model::{MovieDetails, SearchItem};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::extract_year;
use crate::constants::DEFAULT_FRANCHISE_KEYWORD;
use crate::providers::{MetadataProvider, is_available};
use crate::resolver::unless_cancelled;

/// Plot, rating and similar enrichment for detail views.
///
/// Answers are memoized per `title|year` for the life of the service,
/// "no match" included. Provider errors are not memoized.
pub struct DetailsService {
    metadata: Arc<dyn MetadataProvider>,
    memo: DashMap<String, Option<MovieDetails>>,
    franchise_keyword: String,
}

impl fmt::Debug for DetailsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailsService")
            .field("metadata", &self.metadata)
            .field("memoized", &self.memo.len())
            .field("franchise_keyword", &self.franchise_keyword)
            .finish()
    }
}

impl DetailsService {
    /// Service over `metadata` with the default franchise keyword.
    pub fn new(metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            metadata,
            memo: DashMap::new(),
            franchise_keyword: DEFAULT_FRANCHISE_KEYWORD.to_string(),
        }
    }

    /// Keyword prefixed to names for the second search query.
    pub fn with_franchise_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.franchise_keyword = keyword.into();
        self
    }

    /// Details for `title` in the year of `release_date`; `None` when the
    /// provider has no match or fails.
    pub async fn movie_details(
        &self,
        title: &str,
        release_date: Option<&str>,
    ) -> Option<MovieDetails> {
        let token = CancellationToken::new();
        self.movie_details_scoped(title, release_date, &token)
            .await
            .flatten()
    }

    /// Outer `None` means `token` was cancelled and nothing was memoized.
    pub async fn movie_details_scoped(
        &self,
        title: &str,
        release_date: Option<&str>,
        token: &CancellationToken,
    ) -> Option<Option<MovieDetails>> {
        if title.trim().is_empty() {
            return Some(None);
        }
        let year = release_date.and_then(extract_year);
        let key = format!("{title}|{}", year.unwrap_or_default());
        if let Some(hit) = self.memo.get(&key) {
            return Some(hit.value().clone());
        }
        if !self.metadata.is_enabled() {
            return Some(None);
        }

        let result =
            unless_cancelled(token, self.metadata.find_by_title(title, year))
                .await?;
        if token.is_cancelled() {
            return None;
        }

        match result {
            Ok(details) => {
                self.memo.insert(key, details.clone());
                Some(details)
            }
            Err(err) => {
                debug!(title, year, error = %err, "movie details lookup failed");
                Some(None)
            }
        }
    }

    /// Search hits with a usable poster for the raw and the
    /// franchise-qualified name, first occurrence of each imdb id kept.
    pub async fn character_search(&self, name: &str) -> Vec<SearchItem> {
        let qualified = format!("{} {}", self.franchise_keyword, name);
        let mut seen = HashSet::new();
        let mut hits = Vec::new();

        for query in [name, qualified.as_str()] {
            let items = match self.metadata.search(query).await {
                Ok(items) => items,
                Err(err) => {
                    debug!(query, error = %err, "character search failed");
                    continue;
                }
            };
            for item in items {
                let usable = item.poster.as_deref().is_some_and(is_available);
                if usable && seen.insert(item.imdb_id.clone()) {
                    hits.push(item);
                }
            }
        }
        hits
    }
}
