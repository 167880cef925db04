//! External data sources.
//!
//! Every provider returns a typed `Result`; "nothing found" is `Ok(None)` or
//! an empty list. Callers that enrich a view treat `Err` the same as nothing.

pub mod omdb;
pub mod probe;
pub mod swapi;
pub mod traits;
pub mod wiki;

pub use omdb::{NOT_AVAILABLE, OmdbProvider, is_available};
pub use probe::HttpImageProbe;
pub use swapi::SwapiClient;
pub use traits::{
    CatalogSource, ImageProbe, MetadataProvider, ProviderError, SlugListing,
    WikiImageProvider,
};
pub use wiki::WikiProvider;

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Shared JSON decoding for provider responses.
///
/// Non-success statuses map onto [`ProviderError`] variants; the body of an
/// error response is only used for the message.
pub(crate) async fn decode_json<T>(
    response: reqwest::Response,
) -> Result<T, ProviderError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        return serde_json::from_slice::<T>(&bytes)
            .map_err(|err| ProviderError::ParseError(err.to_string()));
    }

    #[derive(Debug, Deserialize)]
    struct ErrorBody {
        #[serde(default, alias = "Error", alias = "status_message")]
        message: Option<String>,
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| format!("request failed with status {}", status));

    match status.as_u16() {
        401 => Err(ProviderError::InvalidApiKey),
        404 => Err(ProviderError::NotFound),
        429 => Err(ProviderError::RateLimited),
        _ => Err(ProviderError::ApiError(message)),
    }
}
