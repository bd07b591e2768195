//! OMDb (Open Movie Database) API client.
//!
//! OMDb answers every lookup with HTTP 200 and signals "nothing found" through
//! `{"Response": "False", "Error": "..."}` in the body, so the status code
//! alone does not tell success from failure.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{MovieDetail, SearchResult};
use super::{CatalogError, MovieCatalog, NO_MATCHES_MESSAGE};

const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

/// OMDb sentinel for "no value".
const NOT_AVAILABLE: &str = "N/A";

/// OMDb API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmdbConfig {
    /// OMDb API key (required).
    pub api_key: String,
    /// Base URL (default: https://www.omdbapi.com/).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl OmdbConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }
}

fn default_timeout() -> u64 {
    10
}

/// OMDb API client.
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    /// Create a new OMDb client.
    pub fn new(config: OmdbConfig) -> Result<Self, CatalogError> {
        if config.api_key.trim().is_empty() {
            return Err(CatalogError::NotConfigured(
                "OMDb API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            api_key: config.api_key,
        })
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value, CatalogError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if status == 401 {
            return Err(CatalogError::NotConfigured(
                "Invalid OMDb API key".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout
            } else {
                CatalogError::ParseError(format!("Failed to parse OMDb response: {}", e))
            }
        })
    }

    async fn fetch_search(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError> {
        debug!("OMDb search: query='{}'", query);
        let body = self.get_json(&[("s", query)]).await?;
        parse_search_body(body)
    }

    async fn fetch_detail(&self, imdb_id: &str) -> Result<MovieDetail, CatalogError> {
        debug!("OMDb detail: id={}", imdb_id);
        let body = self.get_json(&[("i", imdb_id)]).await?;
        parse_detail_body(body)
    }
}

#[async_trait::async_trait]
impl MovieCatalog for OmdbClient {
    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        // Losing the race drops the request future, which aborts the connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CatalogError::Cancelled),
            result = self.fetch_search(query) => result,
        }
    }

    async fn detail(
        &self,
        imdb_id: &str,
        cancel: &CancellationToken,
    ) -> Result<MovieDetail, CatalogError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CatalogError::Cancelled),
            result = self.fetch_detail(imdb_id) => result,
        }
    }
}

fn map_transport(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::HttpError(e)
    }
}

// ============================================================================
// OMDb API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "imdbID", default)]
    imdb_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbDetail {
    #[serde(rename = "imdbID", default)]
    imdb_id: Option<String>,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Runtime", default)]
    runtime: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Actors", default)]
    actors: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
    #[serde(rename = "Released", default)]
    released: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
}

fn is_false_response(body: &Value) -> bool {
    body.get("Response").and_then(Value::as_str) == Some("False")
}

fn error_message(body: &Value) -> String {
    body.get("Error")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(NO_MATCHES_MESSAGE)
        .to_string()
}

fn parse_search_body(body: Value) -> Result<Vec<SearchResult>, CatalogError> {
    if is_false_response(&body) {
        return Err(CatalogError::NoMatches(error_message(&body)));
    }

    let items = match body.get("Search") {
        Some(raw) => Vec::<OmdbSearchItem>::deserialize(raw).unwrap_or_else(|e| {
            warn!("Malformed OMDb search field, treating as empty: {}", e);
            Vec::new()
        }),
        None => {
            warn!("OMDb search response without a Search field");
            Vec::new()
        }
    };

    Ok(items
        .into_iter()
        .filter(|item| !item.imdb_id.is_empty())
        .map(SearchResult::from)
        .collect())
}

fn parse_detail_body(body: Value) -> Result<MovieDetail, CatalogError> {
    if is_false_response(&body) {
        return Err(CatalogError::NotFound(error_message(&body)));
    }

    let detail = OmdbDetail::deserialize(&body)
        .map_err(|e| CatalogError::ParseError(format!("Failed to parse movie detail: {}", e)))?;

    Ok(detail.into())
}

/// Drop OMDb's "N/A" sentinel and blank strings.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != NOT_AVAILABLE)
}

/// Split a comma-joined OMDb list ("Action, Drama") into its parts.
fn split_list(value: Option<String>) -> Vec<String> {
    present(value)
        .map(|v| {
            v.split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Conversions
// ============================================================================

impl From<OmdbSearchItem> for SearchResult {
    fn from(item: OmdbSearchItem) -> Self {
        Self {
            imdb_id: item.imdb_id,
            title: item.title,
            year: item.year,
            poster: present(item.poster),
        }
    }
}

impl From<OmdbDetail> for MovieDetail {
    fn from(d: OmdbDetail) -> Self {
        Self {
            imdb_id: present(d.imdb_id).unwrap_or_default(),
            title: present(d.title).unwrap_or_default(),
            runtime: present(d.runtime),
            genre: split_list(d.genre),
            actors: split_list(d.actors),
            director: present(d.director),
            plot: present(d.plot),
            poster: present(d.poster),
            released: present(d.released),
            imdb_rating: present(d.imdb_rating)
                .and_then(|r| r.parse::<f32>().ok())
                .filter(|r| r.is_finite()),
        }
    }
}
