//! Movie records as seen by the rest of the crate, independent of OMDb's wire casing.

use serde::{Deserialize, Serialize};

/// One hit from a title search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// External catalog identifier (e.g. "tt0372784").
    pub imdb_id: String,
    /// Movie title.
    pub title: String,
    /// Release year as reported by the catalog (may be a range like "2008–2013").
    pub year: String,
    /// Poster image URL, absent when the catalog has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

/// Full record for a single selected movie.
///
/// `MovieDetail::default()` is the empty detail shown when nothing is loaded
/// or a lookup failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    pub imdb_id: String,
    pub title: String,
    /// Free-text runtime, e.g. "148 min".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    /// Release date as reported by the catalog, e.g. "16 Jul 2010".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    /// Aggregate external rating (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<f32>,
}

impl MovieDetail {
    /// Runtime in whole minutes, parsed from the leading number of `runtime`.
    pub fn runtime_minutes(&self) -> Option<u32> {
        self.runtime.as_deref().and_then(leading_number).map(|m| m as u32)
    }

    /// True when no lookup has populated this detail.
    pub fn is_empty(&self) -> bool {
        self.imdb_id.is_empty() && self.title.is_empty()
    }
}

/// Parse the leading numeric part of a free-text value ("148 min" -> 148.0).
pub(crate) fn leading_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    trimmed[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}
