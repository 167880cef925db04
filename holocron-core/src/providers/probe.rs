//! HTTP validation of candidate image URLs.

use super::omdb::default_client;
use super::traits::ImageProbe;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Loads a candidate URL and accepts it when the server answers with a
/// success status and, if it declares one, an `image/*` content type.
///
/// Only the response head is inspected; the body is dropped unread.
#[derive(Debug, Clone)]
pub struct HttpImageProbe {
    http: reqwest::Client,
}

impl HttpImageProbe {
    /// `timeout` bounds each probe end to end. `None` leaves the request
    /// unbounded, matching a browser image load.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            http: default_client(timeout),
        }
    }

    /// Probe reusing an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, url: &str) -> bool {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(%url, error = %err, "image probe failed");
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "image probe rejected status");
            return false;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        match content_type {
            Some(kind) if !kind.starts_with("image/") => {
                debug!(%url, content_type = %kind, "image probe rejected content type");
                false
            }
            _ => true,
        }
    }
}
