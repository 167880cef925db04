mod common;

use std::sync::Arc;

use axum::{Json, Router, routing::post};
use holocron_core::{
    catalog::CatalogService,
    lookup::SlugLookup,
    model::{CharacterId, FilmId},
    providers::{CatalogSource, ProviderError, SwapiClient},
};
use serde_json::{Value, json};

async fn graphql(Json(body): Json<Value>) -> Json<Value> {
    let query = body["query"].as_str().unwrap_or_default();
    let id = body["variables"]["id"].as_str().unwrap_or_default();

    let response = if query.contains("query Films") {
        // Direct list empty, rows only under edges.
        json!({"data": {"allFilms": {
            "films": [],
            "edges": [
                {"node": {"id": "ZmlsbXM6Mg==", "title": "The Empire Strikes Back", "episodeID": 5, "releaseDate": "1980-05-17"}},
                {"node": {"id": "ZmlsbXM6MQ==", "title": "A New Hope", "episodeID": 4, "releaseDate": "1977-05-25"}}
            ],
            "totalCount": 2
        }}})
    } else if query.contains("query SlugListing") {
        assert_eq!(body["variables"]["first"], 200);
        json!({"data": {
            "allFilms": {"films": [
                {"id": "ZmlsbXM6MQ==", "title": "A New Hope"},
                {"id": "ZmlsbXM6Mg==", "title": "The Empire Strikes Back"}
            ]},
            "allPeople": {"people": [
                {"id": "cGVvcGxlOjE=", "name": "Luke Skywalker"},
                {"id": "cGVvcGxlOjM=", "name": "R2-D2"}
            ]}
        }})
    } else if query.contains("query FilmById") {
        if id == "ZmlsbXM6MQ==" {
            json!({"data": {"film": {
                "id": id,
                "title": "A New Hope",
                "episodeID": 4,
                "releaseDate": "1977-05-25",
                "openingCrawl": "It is a period of civil war.\r\n\r\nRebel spaceships...",
                "director": "George Lucas",
                "producers": ["Gary Kurtz", "Rick McCallum"],
                "characterConnection": {"characters": [
                    {"id": "cGVvcGxlOjE=", "name": "Luke Skywalker",
                     "species": null, "homeworld": {"id": "cGxhbmV0czox", "name": "Tatooine"}}
                ]}
            }}})
        } else {
            json!({
                "data": {"film": null},
                "errors": [{"message": format!("No entry in local cache for {id}")}]
            })
        }
    } else if query.contains("query PersonById") {
        json!({"data": {"person": {
            "id": id,
            "name": "R2-D2",
            "birthYear": "33BBY",
            "height": 96,
            "mass": 32,
            "species": {"id": "c3BlY2llczoy", "name": "Droid"},
            "homeworld": {"id": "cGxhbmV0czo4", "name": "Naboo"},
            "filmConnection": {"films": null, "edges": [
                {"node": {"id": "ZmlsbXM6Mg==", "title": "The Empire Strikes Back", "releaseDate": "1980-05-17"}},
                {"node": {"id": "ZmlsbXM6MQ==", "title": "A New Hope", "releaseDate": "1977-05-25"}}
            ]}
        }}})
    } else {
        json!({"errors": [{"message": "Cannot query field"}]})
    };
    Json(response)
}

async fn client() -> SwapiClient {
    let app = Router::new().route("/graphql", post(graphql));
    let base = common::serve(app).await;
    SwapiClient::new(format!("{base}/graphql"))
}

#[tokio::test]
async fn films_fall_back_to_edges_and_sort() {
    let source = Arc::new(client().await);
    let service = CatalogService::new(source, Arc::new(SlugLookup::new()));

    let films = service.films().await.unwrap();
    let titles: Vec<_> = films.iter().map(|f| f.title.as_str()).collect();
    assert_eq!(titles, ["A New Hope", "The Empire Strikes Back"]);
    assert_eq!(films[0].episode_id, 4);
}

#[tokio::test]
async fn slug_routes_to_details() {
    let source = Arc::new(client().await);
    let service = CatalogService::new(source, Arc::new(SlugLookup::new()));

    let film = service.film_by_slug("a-new-hope", None).await.unwrap();
    assert_eq!(film.director, "George Lucas");
    assert_eq!(film.characters[0].homeworld.as_ref().unwrap().name, "Tatooine");

    let droid = service.person_by_slug("r2-d2", None).await.unwrap();
    assert_eq!(droid.height.as_deref(), Some("96"));
    assert_eq!(droid.films.len(), 2);

    let err = service.film_by_slug("the-phantom-menace", None).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn unknown_id_is_none_not_error() {
    let source = client().await;
    let film = source.film(&FilmId::new("ZmlsbXM6OTk=")).await.unwrap();
    assert!(film.is_none());

    let person = source.person(&CharacterId::new("cGVvcGxlOjM=")).await.unwrap();
    assert_eq!(person.unwrap().name, "R2-D2");
}

#[tokio::test]
async fn data_less_errors_surface() {
    let app = Router::new().route(
        "/graphql",
        post(|| async { Json(json!({"errors": [{"message": "Syntax Error"}]})) }),
    );
    let base = common::serve(app).await;
    let source = SwapiClient::new(format!("{base}/graphql"));

    let err = source.films().await.unwrap_err();
    assert!(matches!(err, ProviderError::GraphQl(ref msg) if msg.contains("Syntax Error")));
}
