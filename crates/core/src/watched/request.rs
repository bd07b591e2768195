//! Request body for adding a watched movie over HTTP.
//!
//! Browser clients send loosely typed bodies: runtime as `148`, `"148"` or
//! `"148 min"`, genre as `"Action, Drama"` or `["Action", "Drama"]`. This
//! adapter accepts all of them and applies [`EntryDefaults`] for the rest.

use serde::{Deserialize, Serialize};

use super::{resolve_release_date, EntryDefaults, NewWatchedEntry, UserRating, WatchedError};
use crate::catalog::leading_number;

/// A number that may arrive as JSON number or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexNumber {
    Number(f64),
    Text(String),
}

impl FlexNumber {
    pub fn value(&self) -> Option<f64> {
        match self {
            FlexNumber::Number(n) => Some(*n).filter(|n| n.is_finite()),
            FlexNumber::Text(text) => leading_number(text),
        }
    }
}

/// A list that may arrive as an array or as one comma-joined string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    List(Vec<String>),
    Joined(String),
}

impl StringList {
    pub fn into_vec(self) -> Vec<String> {
        let parts: Vec<String> = match self {
            StringList::List(items) => items,
            StringList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };

        parts
            .into_iter()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty() && part != "N/A")
            .collect()
    }
}

/// JSON body of `POST /movies/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWatchedRequest {
    #[serde(rename = "imdbID", default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<FlexNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actors: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<FlexNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<FlexNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

impl AddWatchedRequest {
    /// Body for submitting an already-built entry.
    pub fn from_entry(entry: &NewWatchedEntry) -> Self {
        Self {
            imdb_id: Some(entry.imdb_id.clone()),
            title: Some(entry.title.clone()),
            released: Some(entry.released.format("%Y-%m-%d").to_string()),
            runtime: Some(FlexNumber::Number(f64::from(entry.runtime))),
            poster: entry.poster.clone(),
            actors: Some(StringList::List(entry.actors.clone())),
            imdb_rating: entry.imdb_rating.map(|r| FlexNumber::Number(f64::from(r))),
            user_rating: Some(FlexNumber::Number(f64::from(entry.user_rating.get()))),
            genre: Some(StringList::List(entry.genre.clone())),
            director: entry.director.clone(),
            desc: entry.description.clone(),
        }
    }

    /// Validate the body and fill gaps from `defaults`.
    ///
    /// Unlike the client path, an unreadable release date is rejected here.
    pub fn into_new_entry(self, defaults: &EntryDefaults) -> Result<NewWatchedEntry, WatchedError> {
        let imdb_id = non_blank(self.imdb_id)
            .ok_or_else(|| WatchedError::Validation("imdbID is required".to_string()))?;
        let title = non_blank(self.title)
            .ok_or_else(|| WatchedError::Validation("title is required".to_string()))?;

        let released = resolve_release_date(self.released.as_deref(), defaults.release_date)?;

        let runtime = self
            .runtime
            .as_ref()
            .and_then(FlexNumber::value)
            .filter(|m| *m >= 1.0 && *m <= f64::from(u32::MAX))
            .map(|m| m as u32)
            .unwrap_or(defaults.runtime_minutes);

        let actors = self
            .actors
            .map(StringList::into_vec)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| defaults.actors.clone());

        let user_rating = parse_user_rating(self.user_rating.as_ref())?;

        let entry = NewWatchedEntry {
            imdb_id,
            title,
            released,
            runtime,
            genre: self.genre.map(StringList::into_vec).unwrap_or_default(),
            actors,
            director: non_blank(self.director),
            poster: non_blank(self.poster),
            imdb_rating: self
                .imdb_rating
                .as_ref()
                .and_then(FlexNumber::value)
                .map(|r| r as f32),
            user_rating,
            description: non_blank(self.desc),
        };

        entry.validate()?;
        Ok(entry)
    }
}

fn parse_user_rating(raw: Option<&FlexNumber>) -> Result<UserRating, WatchedError> {
    let value = raw
        .and_then(FlexNumber::value)
        .ok_or_else(|| WatchedError::Validation("userRating is required".to_string()))?;

    let in_range = value >= f64::from(UserRating::MIN) && value <= f64::from(UserRating::MAX);
    if !in_range || value.fract() != 0.0 {
        return Err(WatchedError::Validation(format!(
            "userRating must be a whole number from {} to {}",
            UserRating::MIN,
            UserRating::MAX
        )));
    }

    UserRating::new(value as u8)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> Result<NewWatchedEntry, WatchedError> {
        let request: AddWatchedRequest = serde_json::from_value(body).unwrap();
        request.into_new_entry(&EntryDefaults::default())
    }

    #[test]
    fn test_browser_shaped_body() {
        let entry = parse(json!({
            "imdbID": "tt1375666",
            "title": "Inception",
            "released": "16 Jul 2010",
            "runtime": 148,
            "poster": "https://img/inception.jpg",
            "actors": "Leonardo DiCaprio, Elliot Page",
            "imdbRating": "8.8",
            "userRating": 8,
            "genre": "Action, Adventure, Sci-Fi",
            "director": "Christopher Nolan",
            "desc": "Dreams."
        }))
        .unwrap();

        assert_eq!(entry.imdb_id, "tt1375666");
        assert_eq!(entry.released, NaiveDate::from_ymd_opt(2010, 7, 16).unwrap());
        assert_eq!(entry.runtime, 148);
        assert_eq!(entry.actors, vec!["Leonardo DiCaprio", "Elliot Page"]);
        assert_eq!(entry.genre, vec!["Action", "Adventure", "Sci-Fi"]);
        assert_eq!(entry.imdb_rating, Some(8.8));
        assert_eq!(entry.user_rating.get(), 8);
        assert_eq!(entry.description.as_deref(), Some("Dreams."));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let entry = parse(json!({
            "imdbID": "tt0000001",
            "title": "Obscure Short",
            "released": "N/A",
            "runtime": "N/A",
            "userRating": "7"
        }))
        .unwrap();

        assert_eq!(entry.released, NaiveDate::from_ymd_opt(2023, 9, 11).unwrap());
        assert_eq!(entry.runtime, 90);
        assert_eq!(entry.actors, vec!["Unknown"]);
        assert!(entry.genre.is_empty());
        assert!(entry.imdb_rating.is_none());
    }

    #[test]
    fn test_runtime_text_with_unit() {
        let entry = parse(json!({
            "imdbID": "tt1",
            "title": "T",
            "runtime": "101 min",
            "userRating": 3
        }))
        .unwrap();
        assert_eq!(entry.runtime, 101);
    }

    #[test]
    fn test_missing_imdb_id_rejected() {
        let result = parse(json!({"title": "Inception", "userRating": 8}));
        assert!(matches!(result, Err(WatchedError::Validation(_))));
    }

    #[test]
    fn test_user_rating_required_and_bounded() {
        assert!(parse(json!({"imdbID": "tt1", "title": "T"})).is_err());
        assert!(parse(json!({"imdbID": "tt1", "title": "T", "userRating": 0})).is_err());
        assert!(parse(json!({"imdbID": "tt1", "title": "T", "userRating": 11})).is_err());
        assert!(parse(json!({"imdbID": "tt1", "title": "T", "userRating": 7.5})).is_err());
    }

    #[test]
    fn test_unreadable_release_date_rejected() {
        let result = parse(json!({
            "imdbID": "tt1",
            "title": "T",
            "released": "the future",
            "userRating": 5
        }));
        assert!(matches!(result, Err(WatchedError::Validation(_))));
    }

    #[test]
    fn test_from_entry_is_accepted_back() {
        let original = parse(json!({
            "imdbID": "tt1375666",
            "title": "Inception",
            "released": "2010-07-16",
            "runtime": 148,
            "actors": ["Leonardo DiCaprio"],
            "genre": ["Action"],
            "imdbRating": 8.8,
            "userRating": 9
        }))
        .unwrap();

        let body = serde_json::to_value(AddWatchedRequest::from_entry(&original)).unwrap();
        assert_eq!(body["imdbID"], "tt1375666");
        assert_eq!(body["userRating"], 9.0);

        let again = parse(body).unwrap();
        assert_eq!(again, original);
    }
}
