use holocron_core::{
    catalog::{adjacent, normalize_opening_crawl},
    model::{CharacterId, FilmId},
    slug::slugify,
};
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::cli::CacheAction;

/// The root token was cancelled (Ctrl-C) before the command finished.
#[derive(Debug, thiserror::Error)]
#[error("interrupted")]
pub struct Interrupted;

fn field(label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        println!("{label:<12} {value}");
    }
}

pub async fn films(
    app: &App,
    with_posters: bool,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    let films = app.catalog.films().await?;
    let posters = if with_posters {
        app.resolver
            .resolve_posters_scoped(&films, token)
            .await
            .ok_or(Interrupted)?
    } else {
        Default::default()
    };

    for film in &films {
        let year = film.release_year().unwrap_or("----");
        print!(
            "EP {:<2} {year}  {:<28} {}",
            film.episode_id,
            film.title,
            slugify(&film.title)
        );
        if let Some(poster) = posters.get(&film.id) {
            print!("  {poster}");
        }
        println!();
    }
    Ok(())
}

pub async fn film(
    app: &App,
    slug: &str,
    id: Option<String>,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    let passed = id.map(FilmId::from);
    let film = app.catalog.film_by_slug(slug, passed.as_ref()).await?;

    let poster = app
        .resolver
        .resolve_film_poster_scoped(&film.title, film.release_year(), token)
        .await
        .ok_or(Interrupted)?;
    let details = app
        .details
        .movie_details_scoped(&film.title, Some(film.release_date.as_str()), token)
        .await
        .ok_or(Interrupted)?;
    let films = app.catalog.films().await?;
    let neighbours = adjacent(&films, &film.id);

    println!("{}", film.title);
    let episode = film.episode_id.map(|n| n.to_string());
    field("Episode", episode.as_deref());
    field("Released", Some(film.release_date.as_str()));
    field("Director", Some(film.director.as_str()));
    let producers = film.producers.join(", ");
    field("Producers", Some(producers.as_str()));
    field("Poster", Some(poster.url.as_str()));

    if let Some(details) = &details {
        field("Rated", details.rated.as_deref());
        field("Runtime", details.runtime.as_deref());
        field("Genre", details.genre.as_deref());
        field("IMDb", details.imdb_rating.as_deref());
        field("Metascore", details.metascore.as_deref());
        field("Plot", details.plot.as_deref());
    }

    let crawl = normalize_opening_crawl(film.opening_crawl.as_deref());
    if !crawl.is_empty() {
        println!();
        for paragraph in crawl {
            println!("  {paragraph}");
        }
    }

    if !film.characters.is_empty() {
        println!();
        println!("Characters");
        for character in &film.characters {
            let slug = app
                .catalog
                .lookup()
                .character_slug(&character.id)
                .await
                .unwrap_or_else(|| slugify(&character.name));
            let species = character
                .species
                .as_ref()
                .map(|s| s.name.as_str())
                .unwrap_or("unknown");
            println!("  {:<28} {:<12} {slug}", character.name, species);
        }
    }

    println!();
    if let Some(prev) = neighbours.previous {
        println!("Previous     {} ({})", prev.title, slugify(&prev.title));
    }
    if let Some(next) = neighbours.next {
        println!("Next         {} ({})", next.title, slugify(&next.title));
    }
    Ok(())
}

pub async fn character(
    app: &App,
    slug: &str,
    id: Option<String>,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    let passed = id.map(CharacterId::from);
    let person = app.catalog.person_by_slug(slug, passed.as_ref()).await?;

    let image = app
        .resolver
        .resolve_character_image_scoped(&person.name, &person.films, token)
        .await
        .ok_or(Interrupted)?;

    println!("{}", person.name);
    field("Image", Some(image.url.as_str()));
    field("Born", person.birth_year.as_deref());
    field("Gender", person.gender.as_deref());
    field("Height", person.height.as_deref());
    field("Mass", person.mass.as_deref());
    field("Eyes", person.eye_color.as_deref());
    field("Hair", person.hair_color.as_deref());
    field("Skin", person.skin_color.as_deref());
    field("Species", person.species.as_ref().map(|s| s.name.as_str()));
    field("Homeworld", person.homeworld.as_ref().map(|h| h.name.as_str()));

    if !person.films.is_empty() {
        println!();
        println!("Films");
        for film in &person.films {
            println!(
                "  {} {:<28} {}",
                film.release_year().unwrap_or("----"),
                film.title,
                slugify(&film.title)
            );
        }
    }
    Ok(())
}

pub async fn search(app: &App, name: &str) -> anyhow::Result<()> {
    let hits = app.details.character_search(name).await;
    if hits.is_empty() {
        println!("no results for {name}");
    }
    for hit in hits {
        println!(
            "{:<10} {:<6} {:<32} {}",
            hit.imdb_id,
            hit.year.as_deref().unwrap_or("-"),
            hit.title,
            hit.poster.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn posters(app: &App, token: &CancellationToken) -> anyhow::Result<()> {
    let films = app.catalog.films().await?;
    let posters = app
        .resolver
        .resolve_posters_scoped(&films, token)
        .await
        .ok_or(Interrupted)?;
    for film in &films {
        if let Some(url) = posters.get(&film.id) {
            println!("{:<28} {url}", film.title);
        }
    }
    println!("{} entries cached", app.cache.len());
    Ok(())
}

pub async fn cache(app: &App, action: CacheAction) -> anyhow::Result<()> {
    match action {
        CacheAction::Show => {
            for (key, url) in app.cache.snapshot() {
                println!("{key}\t{url}");
            }
        }
        CacheAction::Clear => {
            let count = app.cache.len();
            app.cache.clear().await;
            println!("removed {count} entries");
        }
    }
    Ok(())
}
