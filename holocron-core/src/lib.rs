//! # Holocron Core
//!
//! Library behind the Holocron film browser: catalog access, slug routing,
//! image resolution with persistent caching, and metadata enrichment.
//!
//! ## Overview
//!
//! - **Catalog**: films and characters from a GraphQL catalog, sorted and
//!   addressed by slug ([`catalog`], [`lookup`], [`slug`])
//! - **Images**: posters and character portraits resolved through an ordered
//!   provider chain that always ends in a placeholder ([`resolver`])
//! - **Caching**: resolved URLs kept in memory and mirrored to an on-disk
//!   `cacache` store ([`infra::cache`])
//! - **Enrichment**: plot, ratings and search hits from an OMDb-style
//!   provider ([`details`])
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use holocron_core::{
//!     catalog::CatalogService,
//!     infra::cache::{CacacheStore, ImageCache},
//!     lookup::SlugLookup,
//!     providers::{HttpImageProbe, OmdbProvider, SwapiClient, WikiProvider},
//!     resolver::ImageResolver,
//! };
//!
//! # async fn demo() -> holocron_core::Result<()> {
//! let catalog = CatalogService::new(
//!     Arc::new(SwapiClient::default()),
//!     Arc::new(SlugLookup::new()),
//! );
//! let cache = Arc::new(
//!     ImageCache::load(Arc::new(CacacheStore::new("/tmp/holocron"))).await,
//! );
//! let resolver = ImageResolver::new(
//!     cache,
//!     Arc::new(OmdbProvider::new(std::env::var("OMDB_API_KEY").ok())),
//!     Arc::new(WikiProvider::default()),
//!     Arc::new(HttpImageProbe::new(None)),
//! );
//!
//! let film = catalog.film_by_slug("a-new-hope", None).await?;
//! let poster = resolver
//!     .resolve_film_poster(&film.title, film.release_year())
//!     .await;
//! println!("{} -> {}", film.title, poster.url);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod constants;
pub mod details;
pub mod error;
pub mod infra;
pub mod lookup;
pub mod providers;
pub mod resolver;
pub mod slug;

pub use error::{CoreError, EntityKind, Result};
pub use holocron_model as model;
