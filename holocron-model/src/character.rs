use crate::catalog::FilmRef;
use crate::ids::CharacterId;

/// `{ id, name }` pair for species and homeworld links.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// Character row inside a film's cast list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterSummary {
    pub id: CharacterId,
    pub name: String,
    pub species: Option<NamedRef>,
    pub homeworld: Option<NamedRef>,
}

/// Listing row used to build the character slug index.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersonRef {
    pub id: CharacterId,
    pub name: String,
}

/// Full character record used by the character detail view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Person {
    pub id: CharacterId,
    pub name: String,
    pub birth_year: Option<String>,
    pub gender: Option<String>,
    pub height: Option<String>,
    pub mass: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub skin_color: Option<String>,
    pub species: Option<NamedRef>,
    pub homeworld: Option<NamedRef>,
    pub films: Vec<FilmRef>,
}
