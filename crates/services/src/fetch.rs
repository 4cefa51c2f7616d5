//! Fetch capabilities the engine consumes: a movie dataset source and a
//! poster byte source. Both are traits so tests can inject stubs; the
//! HTTP implementations live here as well.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use quiz_core::model::Movie;

use crate::error::{FetchError, LoadError};

/// Provides the movie dataset in one fetch.
#[async_trait]
pub trait MovieFetcher: Send + Sync {
    /// Fetch and decode the full movie list.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` on transport or decode failures.
    async fn fetch_movies(&self) -> Result<Vec<Movie>, LoadError>;
}

/// Provides raw image bytes for a poster URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the bytes behind `url`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport failures.
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Wire shape of the IMDb-style top-movies endpoint.
///
/// The payload carries an `errorMessage` field that is an empty string
/// on success and a quota or failure description otherwise.
#[derive(Debug, Deserialize)]
struct MostPopularMoviesPayload {
    #[serde(rename = "errorMessage", default)]
    error_message: String,
    #[serde(default)]
    items: Vec<MovieItem>,
}

#[derive(Debug, Deserialize)]
struct MovieItem {
    #[serde(rename = "fullTitle")]
    title: String,
    #[serde(rename = "imDbRating")]
    rating: String,
    #[serde(rename = "image")]
    image_url: Url,
}

impl MostPopularMoviesPayload {
    fn into_movies(self) -> Result<Vec<Movie>, LoadError> {
        if self.items.is_empty() && !self.error_message.is_empty() {
            return Err(LoadError::Api(self.error_message));
        }
        Ok(self
            .items
            .into_iter()
            .map(|item| Movie::new(item.title, item.rating, item.image_url))
            .collect())
    }
}

/// `MovieFetcher` over a single HTTP GET endpoint.
#[derive(Clone)]
pub struct HttpMovieFetcher {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpMovieFetcher {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl MovieFetcher for HttpMovieFetcher {
    async fn fetch_movies(&self) -> Result<Vec<Movie>, LoadError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(FetchError::from)?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status()).into());
        }
        let bytes = response.bytes().await.map_err(FetchError::from)?;
        let payload: MostPopularMoviesPayload =
            serde_json::from_slice(&bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
        payload.into_movies()
    }
}

/// `ImageFetcher` that issues a plain GET per poster.
#[derive(Clone, Default)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
