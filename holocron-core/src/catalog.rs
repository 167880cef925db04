//! Film catalog access and the list/detail helpers built on it.

use std::sync::Arc;

use holocron_model::{
    CatalogEntry, CharacterId, FilmDetails, FilmId, FilmRef, Person,
};
use tracing::debug;

use crate::error::{CoreError, EntityKind, Result};
use crate::lookup::{SlugDirectory, SlugLookup, SlugResolution};
use crate::providers::CatalogSource;

pub use holocron_model::catalog::release_year as extract_year;

/// Ascending by release date string; undated entries first, ties keep
/// their upstream order.
pub fn sort_by_release(entries: &mut [CatalogEntry]) {
    entries.sort_by(|a, b| a.release_date.cmp(&b.release_date));
}

/// Neighbours of a film within an already ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Adjacent<'a> {
    /// Film just before, absent at the start of the list.
    pub previous: Option<&'a CatalogEntry>,
    /// Film just after, absent at the end of the list.
    pub next: Option<&'a CatalogEntry>,
}

/// Previous and next films around `id`; both absent for an unknown id.
pub fn adjacent<'a>(films: &'a [CatalogEntry], id: &FilmId) -> Adjacent<'a> {
    let Some(index) = films.iter().position(|film| &film.id == id) else {
        return Adjacent::default();
    };
    Adjacent {
        previous: index.checked_sub(1).and_then(|i| films.get(i)),
        next: films.get(index + 1),
    }
}

/// Earliest film carrying a release date.
pub fn first_appearance(films: &[FilmRef]) -> Option<&FilmRef> {
    films
        .iter()
        .filter(|film| {
            !film.title.is_empty()
                && film.release_date.as_deref().is_some_and(|d| !d.is_empty())
        })
        .min_by(|a, b| a.release_date.cmp(&b.release_date))
}

/// Splits an opening crawl into display paragraphs.
pub fn normalize_opening_crawl(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in unified.trim().split('\n') {
        if line.trim().is_empty() {
            push_paragraph(&mut paragraphs, &mut current);
        } else {
            current.push(line);
        }
    }
    push_paragraph(&mut paragraphs, &mut current);
    paragraphs
}

fn push_paragraph(out: &mut Vec<String>, lines: &mut Vec<&str>) {
    let text = lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    lines.clear();
    if !text.is_empty() {
        out.push(text);
    }
}

/// Film list and slug-addressed detail lookups.
///
/// The slug directory is built lazily on the first lookup that finds it
/// missing; later lookups reuse it until [`CatalogService::refresh_slugs`].
#[derive(Debug, Clone)]
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    lookup: Arc<SlugLookup>,
}

impl CatalogService {
    /// Service over `source`, sharing `lookup` with other consumers.
    pub fn new(source: Arc<dyn CatalogSource>, lookup: Arc<SlugLookup>) -> Self {
        Self { source, lookup }
    }

    /// Slug lookup used for routing and reverse links.
    pub fn lookup(&self) -> &Arc<SlugLookup> {
        &self.lookup
    }

    /// Every film, sorted by release date.
    pub async fn films(&self) -> Result<Vec<CatalogEntry>> {
        let mut films = self.source.films().await?;
        sort_by_release(&mut films);
        Ok(films)
    }

    /// Rebuilds the slug directory from the catalog listing.
    pub async fn refresh_slugs(&self) -> Result<Arc<SlugDirectory>> {
        Ok(self.lookup.refresh(self.source.as_ref()).await?)
    }

    /// Film detail for `slug`, or for `passed_id` when given.
    pub async fn film_by_slug(
        &self,
        slug: &str,
        passed_id: Option<&FilmId>,
    ) -> Result<FilmDetails> {
        let id = match self.lookup.resolve_film_with_hint(slug, passed_id).await {
            SlugResolution::Found(id) => id,
            SlugResolution::NotFound => {
                return Err(CoreError::not_found(EntityKind::Film, slug));
            }
            SlugResolution::Pending => {
                self.refresh_slugs().await?;
                self.lookup
                    .resolve_film(slug)
                    .await
                    .found()
                    .ok_or_else(|| CoreError::not_found(EntityKind::Film, slug))?
            }
        };

        debug!(slug, id = %id, "loading film");
        self.source
            .film(&id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Film, slug))
    }

    /// Character detail for `slug`, or for `passed_id` when given.
    pub async fn person_by_slug(
        &self,
        slug: &str,
        passed_id: Option<&CharacterId>,
    ) -> Result<Person> {
        let id = match self
            .lookup
            .resolve_character_with_hint(slug, passed_id)
            .await
        {
            SlugResolution::Found(id) => id,
            SlugResolution::NotFound => {
                return Err(CoreError::not_found(EntityKind::Character, slug));
            }
            SlugResolution::Pending => {
                self.refresh_slugs().await?;
                self.lookup.resolve_character(slug).await.found().ok_or_else(
                    || CoreError::not_found(EntityKind::Character, slug),
                )?
            }
        };

        debug!(slug, id = %id, "loading character");
        self.source
            .person(&id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Character, slug))
    }
}
