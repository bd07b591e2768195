//! Watched-list records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::WatchedError;
use crate::catalog::MovieDetail;

/// Date formats accepted for a release date, tried in order.
const RELEASE_DATE_FORMATS: &[&str] = &["%d %b %Y", "%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

/// A user's own score for a movie, 1 through 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct UserRating(u8);

impl UserRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Result<Self, WatchedError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(WatchedError::Validation(format!(
                "userRating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for UserRating {
    type Error = WatchedError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserRating> for u8 {
    fn from(rating: UserRating) -> Self {
        rating.0
    }
}

impl std::fmt::Display for UserRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fallbacks applied when a movie record lacks a field the list requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDefaults {
    /// Used when the release date is missing or "N/A".
    #[serde(default = "default_release_date")]
    pub release_date: NaiveDate,
    /// Used when the runtime is missing, zero, or unparseable.
    #[serde(default = "default_runtime_minutes")]
    pub runtime_minutes: u32,
    /// Used when the actor list is empty.
    #[serde(default = "default_actors")]
    pub actors: Vec<String>,
}

impl Default for EntryDefaults {
    fn default() -> Self {
        Self {
            release_date: default_release_date(),
            runtime_minutes: default_runtime_minutes(),
            actors: default_actors(),
        }
    }
}

fn default_release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 9, 11).unwrap_or_default()
}

fn default_runtime_minutes() -> u32 {
    90
}

fn default_actors() -> Vec<String> {
    vec!["Unknown".to_string()]
}

/// A persisted watched-list entry.
///
/// Serialized with the field names the browser UI reads (`_id`, `imdbID`,
/// `userRating`, `createdAt`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedEntry {
    /// Server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    pub title: String,
    pub released: NaiveDate,
    /// Runtime in minutes.
    pub runtime: u32,
    #[serde(default)]
    pub genre: Vec<String>,
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<f32>,
    pub user_rating: UserRating,
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWatchedEntry {
    pub imdb_id: String,
    pub title: String,
    pub released: NaiveDate,
    pub runtime: u32,
    pub genre: Vec<String>,
    pub actors: Vec<String>,
    pub director: Option<String>,
    pub poster: Option<String>,
    pub imdb_rating: Option<f32>,
    pub user_rating: UserRating,
    pub description: Option<String>,
}

impl NewWatchedEntry {
    /// Build an entry from a looked-up movie and the user's rating.
    ///
    /// Missing fields take their value from `defaults`. An unreadable release
    /// date is logged and replaced by the fallback date.
    pub fn from_detail(detail: &MovieDetail, rating: UserRating, defaults: &EntryDefaults) -> Self {
        let released = resolve_release_date(detail.released.as_deref(), defaults.release_date)
            .unwrap_or_else(|e| {
                warn!(imdb_id = %detail.imdb_id, "{}, using fallback date", e);
                defaults.release_date
            });

        let runtime = detail
            .runtime_minutes()
            .filter(|m| *m > 0)
            .unwrap_or(defaults.runtime_minutes);

        let actors = if detail.actors.is_empty() {
            defaults.actors.clone()
        } else {
            detail.actors.clone()
        };

        Self {
            imdb_id: detail.imdb_id.clone(),
            title: detail.title.clone(),
            released,
            runtime,
            genre: detail.genre.clone(),
            actors,
            director: detail.director.clone(),
            poster: detail.poster.clone(),
            imdb_rating: detail.imdb_rating,
            user_rating: rating,
            description: detail.plot.clone(),
        }
    }

    /// Check the fields the list requires.
    pub fn validate(&self) -> Result<(), WatchedError> {
        if self.imdb_id.trim().is_empty() {
            return Err(WatchedError::Validation("imdbID is required".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(WatchedError::Validation("title is required".to_string()));
        }
        if self.runtime == 0 {
            return Err(WatchedError::Validation(
                "runtime must be at least one minute".to_string(),
            ));
        }
        if self.actors.is_empty() {
            return Err(WatchedError::Validation("actors are required".to_string()));
        }
        Ok(())
    }
}

/// Resolve a free-text release date.
///
/// Absent, blank and "N/A" values resolve to `fallback`. Anything else must
/// parse as one of the known formats.
pub fn resolve_release_date(
    raw: Option<&str>,
    fallback: NaiveDate,
) -> Result<NaiveDate, WatchedError> {
    let raw = match raw.map(str::trim) {
        None | Some("") | Some("N/A") => return Ok(fallback),
        Some(raw) => raw,
    };

    for format in RELEASE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.date_naive());
    }

    Err(WatchedError::Validation(format!(
        "unrecognized release date '{}'",
        raw
    )))
}
