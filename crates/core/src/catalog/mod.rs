//! External movie metadata lookups.
//!
//! The catalog is a read-only HTTP JSON service (OMDb). Every call takes a
//! [`CancellationToken`]; implementations must abort the underlying request
//! once the token fires and return [`CatalogError::Cancelled`].

mod omdb;
mod types;

pub use omdb::{OmdbClient, OmdbConfig};
pub use types::*;

pub(crate) use types::leading_number;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Message shown for transport and parse failures.
pub const LOOKUP_FAILED_MESSAGE: &str = "Something went wrong while fetching movies";

/// Message shown when a lookup exceeds its time budget.
pub const LOOKUP_TIMEOUT_MESSAGE: &str = "Request timed out";

/// Message used when the catalog reports no matches without saying why.
pub const NO_MATCHES_MESSAGE: &str = "Movie not found!";

/// Errors that can occur when talking to the movie catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The request did not finish within its time budget.
    #[error("Request timed out")]
    Timeout,

    /// The request was superseded or torn down before it finished.
    #[error("Request cancelled")]
    Cancelled,

    /// The catalog answered successfully but had nothing for the query.
    #[error("{0}")]
    NoMatches(String),

    /// No movie with the given identifier.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl CatalogError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CatalogError::Cancelled)
    }

    /// Text for the user-visible error slot.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::NoMatches(message) => message.clone(),
            CatalogError::Timeout => LOOKUP_TIMEOUT_MESSAGE.to_string(),
            _ => LOOKUP_FAILED_MESSAGE.to_string(),
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Cancelled => "cancelled",
            CatalogError::Timeout => "timeout",
            CatalogError::NoMatches(_) => "no_matches",
            CatalogError::NotFound(_) => "not_found",
            _ => "error",
        }
    }
}

/// Read-only movie metadata service.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Search movies by free-text title query.
    ///
    /// A catalog-side "nothing matched" answer is [`CatalogError::NoMatches`].
    /// A malformed result list is normalized to an empty `Ok`.
    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, CatalogError>;

    /// Fetch the full record for one identifier.
    async fn detail(
        &self,
        imdb_id: &str,
        cancel: &CancellationToken,
    ) -> Result<MovieDetail, CatalogError>;
}
