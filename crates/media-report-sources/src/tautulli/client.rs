use crate::error::SourceError;
use crate::tautulli::api::{self, CMD_LIBRARIES_TABLE, CMD_LIBRARY_MEDIA_INFO, CMD_METADATA, CMD_NEW_RATING_KEYS};
use crate::traits::MediaCatalog;
use async_trait::async_trait;
use media_report_models::{LibraryItem, LibraryRef, MediaKind, MediaMetadata, RatingKey};
use reqwest::{Client, Request};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// HTTP client for a Tautulli instance, authenticated by a static API key.
pub struct TautulliClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl TautulliClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .user_agent(concat!("unwatched/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self {
            client,
            endpoint: api_endpoint(base_url),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the GET request for one API command.
    fn request(&self, command: &'static str, params: &[(&str, String)]) -> Result<Request, SourceError> {
        let mut query: Vec<(&str, &str)> = vec![("apikey", self.api_key.as_str()), ("cmd", command)];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        self.client
            .get(&self.endpoint)
            .query(&query)
            .build()
            .map_err(|source| SourceError::Http { command, source })
    }

    /// Issue one API command and return the envelope's `data` member.
    async fn call(&self, command: &'static str, params: &[(&str, String)]) -> Result<Value, SourceError> {
        let request = self.request(command, params)?;
        debug!(command, params = ?params, "Tautulli request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| SourceError::Http { command, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { command, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| SourceError::Http { command, source })?;
        trace!(command, bytes = body.len(), "Tautulli response received");

        api::unwrap_envelope(command, &body)
    }
}

/// `http://host:8181/tautulli/` → `http://host:8181/tautulli/api/v2`
pub fn api_endpoint(base_url: &str) -> String {
    format!("{}/api/v2", base_url.trim().trim_end_matches('/'))
}

fn library_media_info_params(section_id: &str, length: u32) -> [(&'static str, String); 2] {
    [("section_id", section_id.to_string()), ("length", length.to_string())]
}

fn new_rating_keys_params(rating_key: RatingKey, media_type: &MediaKind) -> [(&'static str, String); 2] {
    [("rating_key", rating_key.to_string()), ("media_type", media_type.to_string())]
}

fn metadata_params(rating_key: RatingKey) -> [(&'static str, String); 2] {
    [("rating_key", rating_key.to_string()), ("media_info", "1".to_string())]
}

#[async_trait]
impl MediaCatalog for TautulliClient {
    fn source_name(&self) -> &str {
        "tautulli"
    }

    async fn libraries(&self) -> Result<Vec<LibraryRef>, SourceError> {
        let data = self.call(CMD_LIBRARIES_TABLE, &[]).await?;
        let libraries = api::parse_libraries_table(data)?;
        debug!(count = libraries.len(), "Fetched libraries table");
        Ok(libraries)
    }

    async fn library_items(&self, section_id: &str, length: u32) -> Result<Vec<LibraryItem>, SourceError> {
        let data = self.call(CMD_LIBRARY_MEDIA_INFO, &library_media_info_params(section_id, length)).await?;
        let items = api::parse_library_media_info(data)?;
        debug!(section_id, count = items.len(), "Fetched library media info");
        Ok(items)
    }

    async fn episode_keys(&self, rating_key: RatingKey, media_type: &MediaKind) -> Result<Vec<RatingKey>, SourceError> {
        let data = self.call(CMD_NEW_RATING_KEYS, &new_rating_keys_params(rating_key, media_type)).await?;
        api::parse_new_rating_keys(data)
    }

    async fn metadata(&self, rating_key: RatingKey) -> Result<MediaMetadata, SourceError> {
        let data = self.call(CMD_METADATA, &metadata_params(rating_key)).await?;
        api::parse_metadata(data)
    }
}
