//! User-visible failures of the core services.

use thiserror::Error;

use crate::providers::ProviderError;

/// The two failure categories a viewer can actually see.
///
/// Enrichment sources (posters, plot, ratings) never surface here; they
/// degrade to placeholders inside the resolver and details service.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The catalog query failed; the view cannot load at all.
    #[error("error loading catalog: {0}")]
    Catalog(#[from] ProviderError),

    /// No film or character answers to the requested slug or id.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Which namespace was searched.
        kind: EntityKind,
        /// The slug or id that was asked for.
        key: String,
    },
}

/// Entity family named in a [`CoreError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A film.
    Film,
    /// A character (a "person" upstream).
    Character,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Film => f.write_str("film"),
            EntityKind::Character => f.write_str("character"),
        }
    }
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// `true` for the "not found" state, which views show distinctly.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

/// Result alias for the core services.
pub type Result<T> = std::result::Result<T, CoreError>;
