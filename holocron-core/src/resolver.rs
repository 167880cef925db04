//! Poster and character image resolution.
//!
//! Every entry point returns a usable URL: a provider image when one is
//! found (and, for characters, validated), otherwise a constant
//! placeholder. Provider failures are logged and treated as "no image".

use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use dashmap::DashMap;
use futures::future::join_all;
use holocron_model::{CatalogEntry, FilmId, FilmRef};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::first_appearance;
use crate::constants::{
    DEFAULT_FRANCHISE_KEYWORD, FALLBACK_CHARACTER_IMAGE, FALLBACK_POSTER,
};
use crate::infra::cache::{ImageCache, ImageCacheKey};
use crate::providers::{
    ImageProbe, MetadataProvider, WikiImageProvider, is_available,
};

/// Tunables for [`ImageResolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Prefixed to character names for the second metadata search.
    pub franchise_keyword: String,
    /// Returned (and cached) when a film has no usable poster.
    pub fallback_poster: String,
    /// Returned, uncached, when no character source validates.
    pub fallback_character_image: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            franchise_keyword: DEFAULT_FRANCHISE_KEYWORD.to_string(),
            fallback_poster: FALLBACK_POSTER.to_string(),
            fallback_character_image: FALLBACK_CHARACTER_IMAGE.to_string(),
        }
    }
}

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Memory or durable cache.
    Cache,
    /// Metadata title lookup.
    Metadata,
    /// Wiki page image.
    Wiki,
    /// Metadata free-text search.
    MetadataSearch,
    /// Poster of the character's earliest film.
    AssociatedFilm,
    /// Constant fallback.
    Placeholder,
}

/// A usable image URL and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// URL to display.
    pub url: String,
    /// Where `url` came from.
    pub source: ImageSource,
}

impl ResolvedImage {
    fn new(url: impl Into<String>, source: ImageSource) -> Self {
        Self {
            url: url.into(),
            source,
        }
    }

    /// `true` for the constant fallbacks.
    pub fn is_placeholder(&self) -> bool {
        self.source == ImageSource::Placeholder
    }
}

/// Holds a key's single-flight slot. Dropping it, whether after the work
/// or while still queued, frees the map entry once no other caller is
/// queued on it.
struct FlightGuard<'a> {
    in_flight: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    gate: Option<Arc<Mutex<()>>>,
    permit: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        drop(self.permit.take());
        drop(self.gate.take());
        self.in_flight
            .remove_if(&self.key, |_, gate| Arc::strong_count(gate) == 1);
    }
}

pub(crate) async fn unless_cancelled<F>(
    token: &CancellationToken,
    fut: F,
) -> Option<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}

/// Ordered provider chains for posters and portraits, fronted by the
/// shared [`ImageCache`] and deduplicated per key.
pub struct ImageResolver {
    cache: Arc<ImageCache>,
    metadata: Arc<dyn MetadataProvider>,
    wiki: Arc<dyn WikiImageProvider>,
    probe: Arc<dyn ImageProbe>,
    options: ResolverOptions,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageResolver")
            .field("cache", &self.cache)
            .field("metadata", &self.metadata)
            .field("wiki", &self.wiki)
            .field("probe", &self.probe)
            .field("options", &self.options)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl ImageResolver {
    /// Resolver with default [`ResolverOptions`].
    pub fn new(
        cache: Arc<ImageCache>,
        metadata: Arc<dyn MetadataProvider>,
        wiki: Arc<dyn WikiImageProvider>,
        probe: Arc<dyn ImageProbe>,
    ) -> Self {
        Self {
            cache,
            metadata,
            wiki,
            probe,
            options: ResolverOptions::default(),
            in_flight: DashMap::new(),
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// The cache this resolver reads and writes.
    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    /// Current options.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    async fn enter_flight(&self, key: &ImageCacheKey) -> FlightGuard<'_> {
        let mut guard = FlightGuard {
            in_flight: &self.in_flight,
            key: key.as_str().to_string(),
            gate: None,
            permit: None,
        };
        let gate = self
            .in_flight
            .entry(guard.key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // Declared after `guard` so a dropped wait releases its handle first.
        let wait = gate.clone().lock_owned();
        guard.gate = Some(gate);
        guard.permit = Some(wait.await);
        guard
    }

    fn placeholder_poster(&self) -> ResolvedImage {
        ResolvedImage::new(&self.options.fallback_poster, ImageSource::Placeholder)
    }

    fn placeholder_character(&self) -> ResolvedImage {
        ResolvedImage::new(
            &self.options.fallback_character_image,
            ImageSource::Placeholder,
        )
    }

    /// Poster URL for a film; never fails.
    pub async fn resolve_film_poster(
        &self,
        title: &str,
        year: Option<&str>,
    ) -> ResolvedImage {
        let token = CancellationToken::new();
        self.resolve_film_poster_scoped(title, year, &token)
            .await
            .unwrap_or_else(|| self.placeholder_poster())
    }

    /// Cached under `title|year`, fallback included. `None` once `token`
    /// is cancelled, in which case nothing is written.
    pub async fn resolve_film_poster_scoped(
        &self,
        title: &str,
        year: Option<&str>,
        token: &CancellationToken,
    ) -> Option<ResolvedImage> {
        let key = ImageCacheKey::film(title, year);
        if let Some(url) = self.cache.get(&key).await {
            return Some(ResolvedImage::new(url, ImageSource::Cache));
        }

        let _flight = unless_cancelled(token, self.enter_flight(&key)).await?;
        if let Some(url) = self.cache.get(&key).await {
            return Some(ResolvedImage::new(url, ImageSource::Cache));
        }

        let resolved =
            unless_cancelled(token, self.fetch_poster(title, year)).await?;
        if token.is_cancelled() {
            return None;
        }
        self.cache.put(key, resolved.url.clone()).await;
        Some(resolved)
    }

    /// Metadata lookup only; no caching.
    async fn fetch_poster(&self, title: &str, year: Option<&str>) -> ResolvedImage {
        match self.metadata.find_by_title(title, year).await {
            Ok(Some(details)) => match details.poster {
                Some(poster) if is_available(&poster) => {
                    ResolvedImage::new(poster, ImageSource::Metadata)
                }
                _ => {
                    debug!(title, year, "no usable poster");
                    self.placeholder_poster()
                }
            },
            Ok(None) => {
                debug!(title, year, "no metadata match");
                self.placeholder_poster()
            }
            Err(err) => {
                debug!(title, year, error = %err, "poster lookup failed");
                self.placeholder_poster()
            }
        }
    }

    /// Portrait URL for a character; never fails.
    pub async fn resolve_character_image(
        &self,
        name: &str,
        films: &[FilmRef],
    ) -> ResolvedImage {
        let token = CancellationToken::new();
        self.resolve_character_image_scoped(name, films, &token)
            .await
            .unwrap_or_else(|| self.placeholder_character())
    }

    /// Wiki, then metadata search, then the character's first film poster;
    /// each candidate must pass the probe. Only validated URLs are cached
    /// under `character|name`.
    pub async fn resolve_character_image_scoped(
        &self,
        name: &str,
        films: &[FilmRef],
        token: &CancellationToken,
    ) -> Option<ResolvedImage> {
        let key = ImageCacheKey::character(name);
        if let Some(url) = self.cache.get(&key).await {
            return Some(ResolvedImage::new(url, ImageSource::Cache));
        }

        let _flight = unless_cancelled(token, self.enter_flight(&key)).await?;
        if let Some(url) = self.cache.get(&key).await {
            return Some(ResolvedImage::new(url, ImageSource::Cache));
        }

        let found = unless_cancelled(token, self.find_character_image(name, films, token))
            .await
            .flatten();
        if token.is_cancelled() {
            return None;
        }

        match found {
            Some(resolved) => {
                info!(name, source = ?resolved.source, "character image resolved");
                self.cache.put(key, resolved.url.clone()).await;
                Some(resolved)
            }
            None => {
                debug!(name, "character image falls back to placeholder");
                Some(self.placeholder_character())
            }
        }
    }

    async fn find_character_image(
        &self,
        name: &str,
        films: &[FilmRef],
        token: &CancellationToken,
    ) -> Option<ResolvedImage> {
        match self.wiki.page_images(name).await {
            Ok(candidates) => {
                for url in candidates {
                    if token.is_cancelled() {
                        return None;
                    }
                    if self.validate(&url).await {
                        return Some(ResolvedImage::new(url, ImageSource::Wiki));
                    }
                }
            }
            Err(err) => debug!(name, error = %err, "wiki image lookup failed"),
        }
        if token.is_cancelled() {
            return None;
        }

        let qualified = format!("{} {}", self.options.franchise_keyword, name);
        for query in [name, qualified.as_str()] {
            let poster = match self.metadata.search(query).await {
                Ok(items) => items
                    .into_iter()
                    .find_map(|item| item.poster.filter(|p| is_available(p))),
                Err(err) => {
                    debug!(query, error = %err, "metadata search failed");
                    None
                }
            };
            if token.is_cancelled() {
                return None;
            }
            if let Some(url) = poster
                && self.validate(&url).await
            {
                return Some(ResolvedImage::new(url, ImageSource::MetadataSearch));
            }
        }

        let film = first_appearance(films)?;
        let poster = self
            .resolve_film_poster_scoped(&film.title, film.release_year(), token)
            .await?;
        if poster.url == self.options.fallback_poster {
            return None;
        }
        self.validate(&poster.url)
            .await
            .then(|| ResolvedImage::new(poster.url, ImageSource::AssociatedFilm))
    }

    async fn validate(&self, url: &str) -> bool {
        let ok = self.probe.probe(url).await;
        if !ok {
            debug!(url, "image candidate failed validation");
        }
        ok
    }

    /// Poster URL for every entry, keyed by film id.
    pub async fn resolve_posters(
        &self,
        entries: &[CatalogEntry],
    ) -> HashMap<FilmId, String> {
        let token = CancellationToken::new();
        match self.resolve_posters_scoped(entries, &token).await {
            Some(posters) => posters,
            None => entries
                .iter()
                .map(|e| (e.id.clone(), self.options.fallback_poster.clone()))
                .collect(),
        }
    }

    /// Cache misses are fetched concurrently and merged with one write.
    ///
    /// Each miss holds its key's single-flight slot while fetching, so a
    /// concurrent single lookup of the same film waits and then reads the
    /// staged URL instead of fetching again.
    pub async fn resolve_posters_scoped(
        &self,
        entries: &[CatalogEntry],
        token: &CancellationToken,
    ) -> Option<HashMap<FilmId, String>> {
        let mut posters = HashMap::with_capacity(entries.len());
        let mut misses: HashMap<ImageCacheKey, Vec<&CatalogEntry>> =
            HashMap::new();

        for entry in entries {
            let key = ImageCacheKey::film(&entry.title, entry.release_year());
            match self.cache.get(&key).await {
                Some(url) => {
                    posters.insert(entry.id.clone(), url);
                }
                None => misses.entry(key).or_default().push(entry),
            }
        }

        if misses.is_empty() {
            return Some(posters);
        }
        debug!(
            hits = posters.len(),
            misses = misses.len(),
            "resolving posters"
        );

        let lookups = misses
            .into_iter()
            .map(|(key, group)| self.fetch_for_batch(key, group, token));
        let fetched = unless_cancelled(token, join_all(lookups)).await?;
        if token.is_cancelled() {
            return None;
        }

        let mut updates = Vec::new();
        for (key, group, url, fresh) in fetched.into_iter().flatten() {
            for entry in group {
                posters.insert(entry.id.clone(), url.clone());
            }
            if fresh {
                updates.push((key, url));
            }
        }
        self.cache.put_many(updates).await;
        Some(posters)
    }

    /// One batch miss under its flight slot. The URL is staged in memory
    /// before the slot is released; `put_many` persists the batch. The flag
    /// is `false` when another caller resolved the key while this one
    /// waited.
    async fn fetch_for_batch<'e>(
        &self,
        key: ImageCacheKey,
        group: Vec<&'e CatalogEntry>,
        token: &CancellationToken,
    ) -> Option<(ImageCacheKey, Vec<&'e CatalogEntry>, String, bool)> {
        let _flight = self.enter_flight(&key).await;
        if let Some(url) = self.cache.get(&key).await {
            return Some((key, group, url, false));
        }

        let first = group.first()?;
        let resolved = self.fetch_poster(&first.title, first.release_year()).await;
        if token.is_cancelled() {
            return None;
        }
        self.cache.stage(key.clone(), resolved.url.clone());
        Some((key, group, resolved.url, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use holocron_model::{MovieDetails, SearchItem};
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    #[derive(Debug, Default)]
    struct FakeMetadata {
        posters: HashMap<String, String>,
        search_posters: HashMap<String, String>,
        title_calls: AtomicUsize,
        search_calls: AtomicUsize,
        delay: Option<Duration>,
        cancel_on_call: Option<CancellationToken>,
    }

    #[async_trait]
    impl MetadataProvider for FakeMetadata {
        fn is_enabled(&self) -> bool {
            true
        }

        async fn find_by_title(
            &self,
            title: &str,
            year: Option<&str>,
        ) -> Result<Option<MovieDetails>, ProviderError> {
            self.title_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(token) = &self.cancel_on_call {
                token.cancel();
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.posters.get(title).map(|poster| MovieDetails {
                title: title.to_string(),
                year: year.map(str::to_string),
                poster: Some(poster.clone()),
                imdb_id: format!("tt-{title}"),
                ..Default::default()
            }))
        }

        async fn search(
            &self,
            query: &str,
        ) -> Result<Vec<SearchItem>, ProviderError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .search_posters
                .get(query)
                .map(|poster| {
                    vec![SearchItem {
                        title: query.to_string(),
                        poster: Some(poster.clone()),
                        imdb_id: format!("tt-{query}"),
                        ..Default::default()
                    }]
                })
                .unwrap_or_default())
        }
    }

    #[derive(Debug, Default)]
    struct FakeWiki {
        images: HashMap<String, Vec<String>>,
        fail: bool,
        cancel_on_call: Option<CancellationToken>,
    }

    #[async_trait]
    impl WikiImageProvider for FakeWiki {
        async fn page_images(
            &self,
            name: &str,
        ) -> Result<Vec<String>, ProviderError> {
            if let Some(token) = &self.cancel_on_call {
                token.cancel();
            }
            if self.fail {
                return Err(ProviderError::ApiError("wiki down".into()));
            }
            Ok(self.images.get(name).cloned().unwrap_or_default())
        }
    }

    fn entry(id: &str, title: &str, date: &str) -> CatalogEntry {
        CatalogEntry {
            id: FilmId::new(id),
            title: title.into(),
            episode_id: 0,
            release_date: date.into(),
        }
    }

    /// Accepts only the listed URLs.
    #[derive(Debug, Default)]
    struct FakeProbe {
        accept: HashSet<String>,
    }

    #[async_trait]
    impl ImageProbe for FakeProbe {
        async fn probe(&self, url: &str) -> bool {
            self.accept.contains(url)
        }
    }

    fn resolver(
        metadata: FakeMetadata,
        wiki: FakeWiki,
        probe: FakeProbe,
    ) -> (ImageResolver, Arc<FakeMetadata>) {
        let metadata = Arc::new(metadata);
        let resolver = ImageResolver::new(
            Arc::new(ImageCache::in_memory()),
            metadata.clone(),
            Arc::new(wiki),
            Arc::new(probe),
        );
        (resolver, metadata)
    }

    fn film_ref(title: &str, date: &str) -> FilmRef {
        FilmRef {
            id: FilmId::new(format!("id-{title}")),
            title: title.to_string(),
            release_date: Some(date.to_string()),
        }
    }

    #[tokio::test]
    async fn second_resolution_hits_cache() {
        let (resolver, metadata) = resolver(
            FakeMetadata {
                posters: HashMap::from([("X".into(), "https://img/x.jpg".into())]),
                ..Default::default()
            },
            FakeWiki::default(),
            FakeProbe::default(),
        );

        let first = resolver.resolve_film_poster("X", Some("1999")).await;
        let second = resolver.resolve_film_poster("X", Some("1999")).await;

        assert_eq!(first.url, "https://img/x.jpg");
        assert_eq!(first.source, ImageSource::Metadata);
        assert_eq!(second.source, ImageSource::Cache);
        assert_eq!(metadata.title_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sentinel_poster_falls_back() {
        let (resolver, _) = resolver(
            FakeMetadata {
                posters: HashMap::from([("Y".into(), "N/A".into())]),
                ..Default::default()
            },
            FakeWiki::default(),
            FakeProbe::default(),
        );

        let resolved = resolver.resolve_film_poster("Y", Some("2001")).await;
        assert_eq!(resolved.url, FALLBACK_POSTER);
        assert!(resolved.is_placeholder());
        // The fallback is cached too.
        assert_eq!(
            resolver.cache().peek(&ImageCacheKey::film("Y", Some("2001"))).as_deref(),
            Some(FALLBACK_POSTER)
        );
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let (resolver, metadata) = resolver(
            FakeMetadata {
                posters: HashMap::from([("Z".into(), "https://img/z.jpg".into())]),
                delay: Some(Duration::from_millis(50)),
                ..Default::default()
            },
            FakeWiki::default(),
            FakeProbe::default(),
        );

        let (a, b) = tokio::join!(
            resolver.resolve_film_poster("Z", Some("2005")),
            resolver.resolve_film_poster("Z", Some("2005")),
        );
        assert_eq!(a.url, b.url);
        assert_eq!(metadata.title_calls.load(Ordering::SeqCst), 1);
        assert!(resolver.in_flight.is_empty());
    }

    #[tokio::test]
    async fn cancelled_resolution_writes_nothing() {
        let token = CancellationToken::new();
        let (resolver, _) = resolver(
            FakeMetadata {
                posters: HashMap::from([("W".into(), "https://img/w.jpg".into())]),
                cancel_on_call: Some(token.clone()),
                ..Default::default()
            },
            FakeWiki::default(),
            FakeProbe::default(),
        );

        let out = resolver
            .resolve_film_poster_scoped("W", Some("1983"), &token)
            .await;
        assert!(out.is_none());
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn wiki_image_wins_when_valid() {
        let (resolver, metadata) = resolver(
            FakeMetadata::default(),
            FakeWiki {
                images: HashMap::from([(
                    "Yoda".into(),
                    vec!["https://wiki/yoda.png".into()],
                )]),
                ..Default::default()
            },
            FakeProbe {
                accept: HashSet::from(["https://wiki/yoda.png".to_string()]),
            },
        );

        let resolved = resolver.resolve_character_image("Yoda", &[]).await;
        assert_eq!(resolved.url, "https://wiki/yoda.png");
        assert_eq!(resolved.source, ImageSource::Wiki);
        assert_eq!(metadata.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            resolver.cache().peek(&ImageCacheKey::character("Yoda")).as_deref(),
            Some("https://wiki/yoda.png")
        );
    }

    #[tokio::test]
    async fn qualified_search_used_after_raw_miss() {
        let (resolver, metadata) = resolver(
            FakeMetadata {
                search_posters: HashMap::from([(
                    "Star Wars Greedo".into(),
                    "https://img/greedo.jpg".into(),
                )]),
                ..Default::default()
            },
            FakeWiki {
                fail: true,
                ..Default::default()
            },
            FakeProbe {
                accept: HashSet::from(["https://img/greedo.jpg".to_string()]),
            },
        );

        let resolved = resolver.resolve_character_image("Greedo", &[]).await;
        assert_eq!(resolved.source, ImageSource::MetadataSearch);
        assert_eq!(resolved.url, "https://img/greedo.jpg");
        assert_eq!(metadata.search_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn earliest_film_poster_is_last_real_source() {
        let (resolver, _) = resolver(
            FakeMetadata {
                posters: HashMap::from([
                    ("A New Hope".into(), "https://img/anh.jpg".into()),
                    ("Return of the Jedi".into(), "https://img/rotj.jpg".into()),
                ]),
                ..Default::default()
            },
            FakeWiki::default(),
            FakeProbe {
                accept: HashSet::from(["https://img/anh.jpg".to_string()]),
            },
        );

        let films = [
            film_ref("Return of the Jedi", "1983-05-25"),
            film_ref("A New Hope", "1977-05-25"),
        ];
        let resolved = resolver.resolve_character_image("Wedge Antilles", &films).await;
        assert_eq!(resolved.source, ImageSource::AssociatedFilm);
        assert_eq!(resolved.url, "https://img/anh.jpg");
    }

    #[tokio::test]
    async fn all_sources_failing_yields_uncached_placeholder() {
        let (resolver, _) = resolver(
            FakeMetadata {
                posters: HashMap::from([("A New Hope".into(), "https://img/anh.jpg".into())]),
                search_posters: HashMap::from([("Nobody".into(), "https://img/n.jpg".into())]),
                ..Default::default()
            },
            FakeWiki {
                images: HashMap::from([("Nobody".into(), vec!["https://wiki/n.png".into()])]),
                ..Default::default()
            },
            // Rejects everything.
            FakeProbe::default(),
        );

        let films = [film_ref("A New Hope", "1977-05-25")];
        let resolved = resolver.resolve_character_image("Nobody", &films).await;
        assert_eq!(resolved.url, FALLBACK_CHARACTER_IMAGE);
        assert!(resolved.is_placeholder());
        assert_eq!(
            resolver.cache().peek(&ImageCacheKey::character("Nobody")),
            None
        );
    }

    #[tokio::test]
    async fn batch_dispatches_only_misses() {
        let (resolver, metadata) = resolver(
            FakeMetadata {
                posters: HashMap::from([
                    ("A".into(), "https://img/a.jpg".into()),
                    ("B".into(), "https://img/b.jpg".into()),
                ]),
                ..Default::default()
            },
            FakeWiki::default(),
            FakeProbe::default(),
        );
        resolver
            .cache()
            .put(ImageCacheKey::film("A", Some("1977")), "https://cached/a.jpg".into())
            .await;

        let entries = vec![
            CatalogEntry {
                id: FilmId::new("a"),
                title: "A".into(),
                episode_id: 4,
                release_date: "1977-05-25".into(),
            },
            CatalogEntry {
                id: FilmId::new("b"),
                title: "B".into(),
                episode_id: 5,
                release_date: "1980-05-17".into(),
            },
            CatalogEntry {
                id: FilmId::new("c"),
                title: "C".into(),
                episode_id: 6,
                release_date: "1983-05-25".into(),
            },
        ];

        let posters = resolver.resolve_posters(&entries).await;
        assert_eq!(metadata.title_calls.load(Ordering::SeqCst), 2);
        assert_eq!(posters[&FilmId::new("a")], "https://cached/a.jpg");
        assert_eq!(posters[&FilmId::new("b")], "https://img/b.jpg");
        assert_eq!(posters[&FilmId::new("c")], FALLBACK_POSTER);
        assert_eq!(resolver.cache().len(), 3);
    }

    #[tokio::test]
    async fn rejected_wiki_candidate_falls_through_to_next() {
        let (resolver, metadata) = resolver(
            FakeMetadata::default(),
            FakeWiki {
                images: HashMap::from([(
                    "Han Solo".into(),
                    vec![
                        "https://wiki/han-page.html".into(),
                        "https://wiki/han.png".into(),
                    ],
                )]),
                ..Default::default()
            },
            FakeProbe {
                accept: HashSet::from(["https://wiki/han.png".to_string()]),
            },
        );

        let resolved = resolver.resolve_character_image("Han Solo", &[]).await;
        assert_eq!(resolved.source, ImageSource::Wiki);
        assert_eq!(resolved.url, "https://wiki/han.png");
        assert_eq!(metadata.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_and_single_lookup_share_one_fetch() {
        let (resolver, metadata) = resolver(
            FakeMetadata {
                posters: HashMap::from([("Q".into(), "https://img/q.jpg".into())]),
                delay: Some(Duration::from_millis(100)),
                ..Default::default()
            },
            FakeWiki::default(),
            FakeProbe::default(),
        );
        let entries = [entry("q", "Q", "1999-01-01")];

        let (single, batch) = tokio::join!(
            resolver.resolve_film_poster("Q", Some("1999")),
            resolver.resolve_posters(&entries),
        );

        assert_eq!(metadata.title_calls.load(Ordering::SeqCst), 1);
        assert_eq!(single.url, "https://img/q.jpg");
        assert_eq!(batch[&FilmId::new("q")], "https://img/q.jpg");
        assert!(resolver.in_flight.is_empty());
    }

    #[tokio::test]
    async fn batch_waits_for_single_lookup_started_first() {
        let (resolver, metadata) = resolver(
            FakeMetadata {
                posters: HashMap::from([("Q".into(), "https://img/q.jpg".into())]),
                delay: Some(Duration::from_millis(100)),
                ..Default::default()
            },
            FakeWiki::default(),
            FakeProbe::default(),
        );
        let entries = [entry("q", "Q", "1999-01-01")];

        let (batch, single) = tokio::join!(
            resolver.resolve_posters(&entries),
            resolver.resolve_film_poster("Q", Some("1999")),
        );

        assert_eq!(metadata.title_calls.load(Ordering::SeqCst), 1);
        assert_eq!(single.source, ImageSource::Cache);
        assert_eq!(batch[&FilmId::new("q")], "https://img/q.jpg");
    }

    #[tokio::test]
    async fn cancelled_character_resolution_writes_nothing() {
        let token = CancellationToken::new();
        let (resolver, metadata) = resolver(
            FakeMetadata {
                search_posters: HashMap::from([("Yoda".into(), "https://img/yoda.jpg".into())]),
                ..Default::default()
            },
            FakeWiki {
                images: HashMap::from([(
                    "Yoda".into(),
                    vec!["https://wiki/yoda.png".into()],
                )]),
                cancel_on_call: Some(token.clone()),
                ..Default::default()
            },
            FakeProbe {
                accept: HashSet::from([
                    "https://wiki/yoda.png".to_string(),
                    "https://img/yoda.jpg".to_string(),
                ]),
            },
        );

        let out = resolver
            .resolve_character_image_scoped("Yoda", &[], &token)
            .await;
        assert!(out.is_none());
        assert_eq!(resolver.cache().peek(&ImageCacheKey::character("Yoda")), None);
        assert!(resolver.cache().is_empty());
        assert_eq!(metadata.search_calls.load(Ordering::SeqCst), 0);
        assert!(resolver.in_flight.is_empty());
    }

    #[tokio::test]
    async fn cancelled_batch_writes_nothing() {
        let token = CancellationToken::new();
        let (resolver, _) = resolver(
            FakeMetadata {
                posters: HashMap::from([
                    ("A".into(), "https://img/a.jpg".into()),
                    ("B".into(), "https://img/b.jpg".into()),
                ]),
                delay: Some(Duration::from_millis(20)),
                cancel_on_call: Some(token.clone()),
                ..Default::default()
            },
            FakeWiki::default(),
            FakeProbe::default(),
        );
        let entries = [entry("a", "A", "1977-05-25"), entry("b", "B", "1980-05-17")];

        let out = resolver.resolve_posters_scoped(&entries, &token).await;
        assert!(out.is_none());
        assert!(resolver.cache().is_empty());
        assert!(resolver.in_flight.is_empty());
    }

    #[tokio::test]
    async fn cancelled_waiter_frees_flight_slot() {
        let (resolver, _) =
            resolver(FakeMetadata::default(), FakeWiki::default(), FakeProbe::default());
        let key = ImageCacheKey::film("K", Some("2000"));
        let token = CancellationToken::new();

        let holder = resolver.enter_flight(&key).await;
        let waiter = unless_cancelled(&token, resolver.enter_flight(&key));
        let cancel = token.clone();
        let release = async move {
            tokio::task::yield_now().await;
            drop(holder);
            cancel.cancel();
        };

        let (waited, ()) = tokio::join!(waiter, release);
        assert!(waited.is_none());
        assert!(resolver.in_flight.is_empty());
    }
}
