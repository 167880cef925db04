//! GraphQL client for the film catalog (SWAPI schema).

use super::decode_json;
use super::omdb::default_client;
use super::traits::{CatalogSource, ProviderError, SlugListing};
use crate::constants::{DEFAULT_CATALOG_URL, PEOPLE_LISTING_LIMIT};

use async_trait::async_trait;
use holocron_model::{
    CatalogEntry, CharacterId, CharacterSummary, FilmDetails, FilmId, FilmRef,
    NamedRef, Person, PersonRef,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

const FILMS_QUERY: &str = r#"
query Films {
  allFilms {
    films { id title episodeID releaseDate }
    edges { node { id title episodeID releaseDate } }
    totalCount
  }
}
"#;

const SLUG_LISTING_QUERY: &str = r#"
query SlugListing($first: Int) {
  allFilms {
    films { id title }
  }
  allPeople(first: $first) {
    people { id name }
  }
}
"#;

const FILM_QUERY: &str = r#"
query FilmById($id: ID!) {
  film(id: $id) {
    id
    title
    episodeID
    releaseDate
    openingCrawl
    director
    producers
    characterConnection {
      characters {
        id
        name
        species { id name }
        homeworld { id name }
      }
    }
  }
}
"#;

const PERSON_QUERY: &str = r#"
query PersonById($id: ID!) {
  person(id: $id) {
    id
    name
    birthYear
    gender
    height
    mass
    eyeColor
    hairColor
    skinColor
    species { id name }
    homeworld { id name }
    filmConnection(first: 20) {
      films { id title releaseDate }
      edges { node { id title releaseDate } }
    }
  }
}
"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct GraphQlResponse<T> {
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

fn join_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Relay connection that may list rows directly or through `edges`.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct Connection<T> {
    #[serde(default, alias = "people", alias = "characters")]
    films: Option<Vec<T>>,
    #[serde(default)]
    edges: Option<Vec<Edge<T>>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct Edge<T> {
    #[serde(default)]
    node: Option<T>,
}

impl<T> Connection<T> {
    /// Direct rows when there are any, otherwise the edge nodes.
    fn into_rows(self) -> Vec<T> {
        let direct = self.films.unwrap_or_default();
        if !direct.is_empty() {
            return direct;
        }
        self.edges
            .unwrap_or_default()
            .into_iter()
            .filter_map(|edge| edge.node)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilmRow {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "episodeID")]
    episode_id: Option<i32>,
    #[serde(default)]
    release_date: Option<String>,
}

impl FilmRow {
    fn into_entry(self) -> CatalogEntry {
        CatalogEntry {
            id: FilmId(self.id),
            title: self.title.unwrap_or_default(),
            episode_id: self.episode_id.unwrap_or_default(),
            release_date: self.release_date.unwrap_or_default(),
        }
    }

    fn into_ref(self) -> FilmRef {
        FilmRef {
            id: FilmId(self.id),
            title: self.title.unwrap_or_default(),
            release_date: self.release_date,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NamedRow {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl From<NamedRow> for NamedRef {
    fn from(row: NamedRow) -> Self {
        NamedRef {
            id: row.id,
            name: row.name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CharacterRow {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    species: Option<NamedRow>,
    #[serde(default)]
    homeworld: Option<NamedRow>,
}

impl From<CharacterRow> for CharacterSummary {
    fn from(row: CharacterRow) -> Self {
        CharacterSummary {
            id: CharacterId(row.id),
            name: row.name.unwrap_or_default(),
            species: row.species.map(NamedRef::from),
            homeworld: row.homeworld.map(NamedRef::from),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilmDetailRow {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "episodeID")]
    episode_id: Option<i32>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    opening_crawl: Option<String>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    producers: Option<Vec<Option<String>>>,
    #[serde(default)]
    character_connection: Option<Connection<CharacterRow>>,
}

impl From<FilmDetailRow> for FilmDetails {
    fn from(row: FilmDetailRow) -> Self {
        FilmDetails {
            id: FilmId(row.id),
            title: row.title.unwrap_or_default(),
            episode_id: row.episode_id,
            release_date: row.release_date.unwrap_or_default(),
            director: row.director.unwrap_or_default(),
            producers: row
                .producers
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .collect(),
            opening_crawl: row.opening_crawl,
            characters: row
                .character_connection
                .map(Connection::into_rows)
                .unwrap_or_default()
                .into_iter()
                .map(CharacterSummary::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonRow {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    birth_year: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    // Numeric in the schema (Int / Float).
    #[serde(default)]
    height: Option<Value>,
    #[serde(default)]
    mass: Option<Value>,
    #[serde(default)]
    eye_color: Option<String>,
    #[serde(default)]
    hair_color: Option<String>,
    #[serde(default)]
    skin_color: Option<String>,
    #[serde(default)]
    species: Option<NamedRow>,
    #[serde(default)]
    homeworld: Option<NamedRow>,
    #[serde(default)]
    film_connection: Option<Connection<FilmRow>>,
}

fn scalar_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Person {
            id: CharacterId(row.id),
            name: row.name.unwrap_or_default(),
            birth_year: row.birth_year,
            gender: row.gender,
            height: scalar_text(row.height),
            mass: scalar_text(row.mass),
            eye_color: row.eye_color,
            hair_color: row.hair_color,
            skin_color: row.skin_color,
            species: row.species.map(NamedRef::from),
            homeworld: row.homeworld.map(NamedRef::from),
            films: row
                .film_connection
                .map(Connection::into_rows)
                .unwrap_or_default()
                .into_iter()
                .map(FilmRow::into_ref)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilmsData {
    #[serde(default)]
    all_films: Option<Connection<FilmRow>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlugListingData {
    #[serde(default)]
    all_films: Option<Connection<FilmRow>>,
    #[serde(default)]
    all_people: Option<Connection<NamedRow>>,
}

#[derive(Debug, Deserialize)]
struct FilmData {
    #[serde(default)]
    film: Option<FilmDetailRow>,
}

#[derive(Debug, Deserialize)]
struct PersonData {
    #[serde(default)]
    person: Option<PersonRow>,
}

/// POSTs GraphQL documents to the catalog endpoint.
#[derive(Debug)]
pub struct SwapiClient {
    http: reqwest::Client,
    endpoint: String,
}

impl Default for SwapiClient {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_URL)
    }
}

impl SwapiClient {
    /// Client for the GraphQL endpoint at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, default_client(None))
    }

    /// Client reusing an existing `reqwest::Client`.
    pub fn with_client(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    async fn send<T>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<GraphQlResponse<T>, ProviderError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;
        decode_json(response).await
    }

    /// Any reported error fails the whole query.
    async fn execute<T>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let body = self.send::<T>(query, variables).await?;
        if let Some(errors) = body.errors.as_deref().filter(|e| !e.is_empty()) {
            return Err(ProviderError::GraphQl(join_errors(errors)));
        }
        body.data.ok_or_else(|| {
            ProviderError::GraphQl("response carried no data".to_string())
        })
    }

    /// Single-entity lookups: a null entity next to errors means "no such
    /// id", only a missing `data` object is a failure.
    async fn execute_lookup<T>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let body = self.send::<T>(query, variables).await?;
        let errors = body.errors.unwrap_or_default();
        match body.data {
            Some(data) => {
                if !errors.is_empty() {
                    debug!(errors = %join_errors(&errors), "catalog lookup reported errors");
                }
                Ok(data)
            }
            None if errors.is_empty() => Err(ProviderError::GraphQl(
                "response carried no data".to_string(),
            )),
            None => Err(ProviderError::GraphQl(join_errors(&errors))),
        }
    }
}

#[async_trait]
impl CatalogSource for SwapiClient {
    async fn films(&self) -> Result<Vec<CatalogEntry>, ProviderError> {
        let data: FilmsData = self.execute(FILMS_QUERY, json!({})).await?;
        let films: Vec<CatalogEntry> = data
            .all_films
            .map(Connection::into_rows)
            .unwrap_or_default()
            .into_iter()
            .map(FilmRow::into_entry)
            .collect();
        debug!(count = films.len(), "catalog films fetched");
        Ok(films)
    }

    async fn slug_listing(&self) -> Result<SlugListing, ProviderError> {
        let data: SlugListingData = self
            .execute(SLUG_LISTING_QUERY, json!({ "first": PEOPLE_LISTING_LIMIT }))
            .await?;
        let listing = SlugListing {
            films: data
                .all_films
                .map(Connection::into_rows)
                .unwrap_or_default()
                .into_iter()
                .map(FilmRow::into_ref)
                .collect(),
            people: data
                .all_people
                .map(Connection::into_rows)
                .unwrap_or_default()
                .into_iter()
                .map(|row| PersonRef {
                    id: CharacterId(row.id),
                    name: row.name.unwrap_or_default(),
                })
                .collect(),
        };
        debug!(
            films = listing.films.len(),
            people = listing.people.len(),
            "slug listing fetched"
        );
        Ok(listing)
    }

    async fn film(
        &self,
        id: &FilmId,
    ) -> Result<Option<FilmDetails>, ProviderError> {
        let data: FilmData = self
            .execute_lookup(FILM_QUERY, json!({ "id": id.as_str() }))
            .await?;
        Ok(data.film.map(FilmDetails::from))
    }

    async fn person(
        &self,
        id: &CharacterId,
    ) -> Result<Option<Person>, ProviderError> {
        let data: PersonData = self
            .execute_lookup(PERSON_QUERY, json!({ "id": id.as_str() }))
            .await?;
        Ok(data.person.map(Person::from))
    }
}
