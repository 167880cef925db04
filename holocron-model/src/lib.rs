//! Core data model definitions shared across Holocron crates.
#![allow(missing_docs)]

pub mod catalog;
pub mod character;
pub mod ids;
pub mod metadata;

// Intentionally curated re-exports for downstream consumers.
pub use catalog::{CatalogEntry, FilmDetails, FilmRef};
pub use character::{CharacterSummary, NamedRef, Person, PersonRef};
pub use ids::{CharacterId, FilmId, GlobalId};
pub use metadata::{MovieDetails, SearchItem};
