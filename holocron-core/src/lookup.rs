//! Readiness-aware slug resolution for films and characters.

use std::sync::Arc;

use holocron_model::{CharacterId, FilmId};
use tokio::sync::RwLock;
use tracing::info;

use crate::providers::{CatalogSource, ProviderError, SlugListing};
use crate::slug::SlugIndex;

/// Which slug index a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Film titles.
    Films,
    /// Character names.
    Characters,
}

/// Outcome of a slug lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugResolution<Id> {
    /// The indexes have not been built yet.
    Pending,
    /// The slug maps to this id.
    Found(Id),
    /// The indexes are built and the slug is not in them.
    NotFound,
}

impl<Id> SlugResolution<Id> {
    /// The id when found; `None` for both pending and not found.
    pub fn found(self) -> Option<Id> {
        match self {
            SlugResolution::Found(id) => Some(id),
            _ => None,
        }
    }

    fn map<T>(self, f: impl FnOnce(Id) -> T) -> SlugResolution<T> {
        match self {
            SlugResolution::Pending => SlugResolution::Pending,
            SlugResolution::Found(id) => SlugResolution::Found(f(id)),
            SlugResolution::NotFound => SlugResolution::NotFound,
        }
    }
}

/// Both namespaces, built together from one catalog listing.
#[derive(Debug, Clone, Default)]
pub struct SlugDirectory {
    /// Film title slugs.
    pub films: SlugIndex<FilmId>,
    /// Character name slugs.
    pub characters: SlugIndex<CharacterId>,
}

impl SlugDirectory {
    /// Indexes the listing in order; later collisions win.
    pub fn from_listing(listing: &SlugListing) -> Self {
        Self {
            films: SlugIndex::build(
                listing.films.iter().map(|f| (f.id.clone(), f.title.as_str())),
            ),
            characters: SlugIndex::build(
                listing.people.iter().map(|p| (p.id.clone(), p.name.as_str())),
            ),
        }
    }
}

/// Shared, swappable slug directory.
#[derive(Debug, Default)]
pub struct SlugLookup {
    directory: RwLock<Option<Arc<SlugDirectory>>>,
}

impl SlugLookup {
    /// Lookup with no directory; every resolution is `Pending` until
    /// [`SlugLookup::install`] or [`SlugLookup::refresh`] runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current directory.
    pub async fn install(&self, directory: SlugDirectory) -> Arc<SlugDirectory> {
        let directory = Arc::new(directory);
        *self.directory.write().await = Some(directory.clone());
        directory
    }

    /// Rebuilds both namespaces from the catalog. On error the previous
    /// directory, if any, stays in place.
    pub async fn refresh(
        &self,
        catalog: &dyn CatalogSource,
    ) -> Result<Arc<SlugDirectory>, ProviderError> {
        let listing = catalog.slug_listing().await?;
        let directory = SlugDirectory::from_listing(&listing);
        info!(
            films = directory.films.len(),
            characters = directory.characters.len(),
            "slug directory built"
        );
        Ok(self.install(directory).await)
    }

    /// The current directory, if built.
    pub async fn directory(&self) -> Option<Arc<SlugDirectory>> {
        self.directory.read().await.clone()
    }

    /// `true` once a directory has been installed.
    pub async fn is_ready(&self) -> bool {
        self.directory.read().await.is_some()
    }

    /// Namespace-generic lookup returning the raw id.
    pub async fn resolve(
        &self,
        slug: &str,
        namespace: Namespace,
    ) -> SlugResolution<String> {
        match namespace {
            Namespace::Films => {
                self.resolve_film(slug).await.map(|id| id.0)
            }
            Namespace::Characters => {
                self.resolve_character(slug).await.map(|id| id.0)
            }
        }
    }

    /// A supplied id skips the lookup, even before the directory is ready.
    pub async fn resolve_with_hint(
        &self,
        slug: &str,
        passed_id: Option<&str>,
        namespace: Namespace,
    ) -> SlugResolution<String> {
        match passed_id.filter(|id| !id.is_empty()) {
            Some(id) => SlugResolution::Found(id.to_string()),
            None => self.resolve(slug, namespace).await,
        }
    }

    /// Film id for `slug`.
    pub async fn resolve_film(&self, slug: &str) -> SlugResolution<FilmId> {
        match self.directory().await {
            None => SlugResolution::Pending,
            Some(dir) => dir
                .films
                .id_for(slug)
                .cloned()
                .map_or(SlugResolution::NotFound, SlugResolution::Found),
        }
    }

    /// Character id for `slug`.
    pub async fn resolve_character(
        &self,
        slug: &str,
    ) -> SlugResolution<CharacterId> {
        match self.directory().await {
            None => SlugResolution::Pending,
            Some(dir) => dir
                .characters
                .id_for(slug)
                .cloned()
                .map_or(SlugResolution::NotFound, SlugResolution::Found),
        }
    }

    /// [`SlugLookup::resolve_film`], unless a non-empty id was passed along.
    pub async fn resolve_film_with_hint(
        &self,
        slug: &str,
        passed_id: Option<&FilmId>,
    ) -> SlugResolution<FilmId> {
        match passed_id.filter(|id| !id.as_str().is_empty()) {
            Some(id) => SlugResolution::Found(id.clone()),
            None => self.resolve_film(slug).await,
        }
    }

    /// [`SlugLookup::resolve_character`], unless a non-empty id was passed
    /// along.
    pub async fn resolve_character_with_hint(
        &self,
        slug: &str,
        passed_id: Option<&CharacterId>,
    ) -> SlugResolution<CharacterId> {
        match passed_id.filter(|id| !id.as_str().is_empty()) {
            Some(id) => SlugResolution::Found(id.clone()),
            None => self.resolve_character(slug).await,
        }
    }

    /// Reverse lookup used to link a film.
    pub async fn film_slug(&self, id: &FilmId) -> Option<String> {
        let dir = self.directory().await?;
        dir.films.slug_for(id).map(str::to_string)
    }

    /// Reverse lookup used to link a character.
    pub async fn character_slug(&self, id: &CharacterId) -> Option<String> {
        let dir = self.directory().await?;
        dir.characters.slug_for(id).map(str::to_string)
    }
}
