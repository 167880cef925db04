//! Shared defaults.

/// Dark placeholder poster (2:3) returned when no poster can be found.
pub const FALLBACK_POSTER: &str =
    "https://placehold.co/400x600/0b0b0b/9ca3af?text=No+Poster";

/// Square placeholder returned when every character image source fails.
pub const FALLBACK_CHARACTER_IMAGE: &str =
    "https://placehold.co/256x256/0b0b0b/9ca3af?text=No+Image";

/// Durable store key holding the serialized image URL map.
pub const IMAGE_CACHE_STORAGE_KEY: &str = "holocron.imageUrls.v1";

/// Prefix for the second metadata search attempt on a character name.
pub const DEFAULT_FRANCHISE_KEYWORD: &str = "Star Wars";

/// GraphQL catalog endpoint.
pub const DEFAULT_CATALOG_URL: &str =
    "https://swapi-graphql.netlify.app/graphql";
/// OMDb API base URL.
pub const DEFAULT_OMDB_URL: &str = "https://www.omdbapi.com/";
/// Wookieepedia MediaWiki API.
pub const DEFAULT_WIKI_API_URL: &str = "https://starwars.fandom.com/api.php";

/// Upper bound on characters fetched for the slug index.
pub const PEOPLE_LISTING_LIMIT: u32 = 200;

/// Sent with every provider request.
pub const USER_AGENT: &str =
    concat!("holocron/", env!("CARGO_PKG_VERSION"));
