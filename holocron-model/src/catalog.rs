use crate::character::CharacterSummary;
use crate::ids::FilmId;

/// One film record from the catalog listing.
///
/// Entries are immutable once fetched; a session refetches the full set
/// rather than patching it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogEntry {
    pub id: FilmId,
    pub title: String,
    /// Sequence number within the saga (the upstream `episodeID`).
    pub episode_id: i32,
    /// ISO-8601 date string, e.g. `1977-05-25`.
    pub release_date: String,
}

impl CatalogEntry {
    pub fn release_year(&self) -> Option<&str> {
        release_year(&self.release_date)
    }
}

/// Minimal film reference attached to a character.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilmRef {
    pub id: FilmId,
    pub title: String,
    pub release_date: Option<String>,
}

impl FilmRef {
    pub fn release_year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(release_year)
    }
}

impl From<&CatalogEntry> for FilmRef {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            release_date: Some(entry.release_date.clone()),
        }
    }
}

/// Full film record used by the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilmDetails {
    pub id: FilmId,
    pub title: String,
    pub episode_id: Option<i32>,
    pub release_date: String,
    pub director: String,
    pub producers: Vec<String>,
    pub opening_crawl: Option<String>,
    pub characters: Vec<CharacterSummary>,
}

impl FilmDetails {
    pub fn release_year(&self) -> Option<&str> {
        release_year(&self.release_date)
    }
}

/// Leading four-digit year of an ISO-like date. `None` when the date is
/// shorter or does not start with four ASCII digits (`"TBD-..."`).
pub fn release_year(date: &str) -> Option<&str> {
    date.get(..4)
        .filter(|year| year.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_requires_four_chars() {
        assert_eq!(release_year("1977-05-25"), Some("1977"));
        assert_eq!(release_year("1977"), Some("1977"));
        assert_eq!(release_year("197"), None);
        assert_eq!(release_year(""), None);
    }

    #[test]
    fn year_must_be_digits() {
        assert_eq!(release_year("TBD-01-01"), None);
        assert_eq!(release_year("19x7-05-25"), None);
        assert_eq!(release_year("c. 1977"), None);
    }

    #[test]
    fn film_ref_from_entry_keeps_date() {
        let entry = CatalogEntry {
            id: FilmId::new("ZmlsbXM6MQ=="),
            title: "A New Hope".into(),
            episode_id: 4,
            release_date: "1977-05-25".into(),
        };
        let film_ref = FilmRef::from(&entry);
        assert_eq!(film_ref.release_year(), Some("1977"));
        assert_eq!(film_ref.id, entry.id);
    }
}
