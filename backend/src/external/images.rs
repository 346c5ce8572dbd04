//! Image search client for crop pictures (Unsplash search API)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{EnrichmentError, ImageLookup};

#[derive(Clone)]
pub struct ImageSearchClient {
    client: Client,
    access_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchPhoto>,
}

#[derive(Debug, Deserialize)]
struct SearchPhoto {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    small: Option<String>,
}

impl ImageSearchClient {
    pub fn new(access_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            access_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn first_image(data: SearchResponse) -> Option<String> {
        data.results.into_iter().next().and_then(|photo| photo.urls.small)
    }
}

#[async_trait]
impl ImageLookup for ImageSearchClient {
    async fn find_image(&self, crop: &str) -> Result<Option<String>, EnrichmentError> {
        let url = format!("{}/search/photos", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", crop),
                ("client_id", self.access_key.as_str()),
                ("per_page", "1"),
            ])
            .send()
            .await
            .map_err(|e| EnrichmentError::ImageUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EnrichmentError::ImageUnavailable(format!(
                "Image search returned {}",
                response.status()
            )));
        }

        let data: SearchResponse = response.json().await.map_err(|e| {
            EnrichmentError::ImageUnavailable(format!("Failed to parse response: {}", e))
        })?;

        Ok(Self::first_image(data))
    }
}
