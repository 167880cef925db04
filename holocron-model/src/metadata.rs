//! Metadata provider records (OMDb response shape).
//!
//! The provider spells "no value" as the literal string `N/A`. Those values
//! never reach these types: the provider client normalizes them to `None`.

/// Detailed record for one movie title (+ year).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieDetails {
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub plot: Option<String>,
    pub metascore: Option<String>,
    pub genre: Option<String>,
    pub runtime: Option<String>,
    pub rated: Option<String>,
    pub released: Option<String>,
    pub imdb_id: String,
    pub imdb_rating: Option<String>,
}

/// One hit of a free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchItem {
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub imdb_id: String,
    pub kind: Option<String>,
}
