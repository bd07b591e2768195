//! SQLite-backed watched-list store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::{NewWatchedEntry, UserRating, WatchedEntry, WatchedError, WatchedStore};

const SELECT_COLUMNS: &str = "id, imdb_id, title, released, runtime, genre, actors, director, poster, imdb_rating, user_rating, description, created_at, updated_at";

/// SQLite-backed watched-list store.
pub struct SqliteWatchedStore {
    conn: Mutex<Connection>,
}

impl SqliteWatchedStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, WatchedError> {
        let conn = Connection::open(path).map_err(|e| WatchedError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, WatchedError> {
        let conn =
            Connection::open_in_memory().map_err(|e| WatchedError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), WatchedError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS watched_movies (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                imdb_id TEXT NOT NULL,
                title TEXT NOT NULL,
                released TEXT NOT NULL,
                runtime INTEGER NOT NULL,
                genre TEXT NOT NULL,
                actors TEXT NOT NULL,
                director TEXT,
                poster TEXT,
                imdb_rating REAL,
                user_rating INTEGER NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_watched_movies_imdb_id ON watched_movies(imdb_id);
            "#,
        )
        .map_err(|e| WatchedError::Database(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, WatchedError> {
        self.conn
            .lock()
            .map_err(|_| WatchedError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<WatchedEntry> {
        let released_str: String = row.get(3)?;
        let genre_json: String = row.get(5)?;
        let actors_json: String = row.get(6)?;
        let imdb_rating: Option<f64> = row.get(9)?;
        let user_rating: u8 = row.get(10)?;
        let created_at_str: String = row.get(12)?;
        let updated_at_str: String = row.get(13)?;

        let released = NaiveDate::parse_from_str(&released_str, "%Y-%m-%d")
            .map_err(|e| conversion_error(3, e))?;
        let genre: Vec<String> =
            serde_json::from_str(&genre_json).map_err(|e| conversion_error(5, e))?;
        let actors: Vec<String> =
            serde_json::from_str(&actors_json).map_err(|e| conversion_error(6, e))?;
        let user_rating = UserRating::new(user_rating).map_err(|e| conversion_error(10, e))?;
        let created_at = parse_timestamp(12, &created_at_str)?;
        let updated_at = parse_timestamp(13, &updated_at_str)?;

        Ok(WatchedEntry {
            id: row.get(0)?,
            imdb_id: row.get(1)?,
            title: row.get(2)?,
            released,
            runtime: row.get(4)?,
            genre,
            actors,
            director: row.get(7)?,
            poster: row.get(8)?,
            imdb_rating: imdb_rating.map(|r| r as f32),
            user_rating,
            description: row.get(11)?,
            created_at,
            updated_at,
        })
    }
}

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

impl WatchedStore for SqliteWatchedStore {
    fn list(&self) -> Result<Vec<WatchedEntry>, WatchedError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM watched_movies ORDER BY seq ASC",
                SELECT_COLUMNS
            ))
            .map_err(|e| WatchedError::Database(e.to_string()))?;

        let entries = stmt
            .query_map([], Self::row_to_entry)
            .map_err(|e| WatchedError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| WatchedError::Database(e.to_string()))?;

        Ok(entries)
    }

    fn insert(&self, entry: NewWatchedEntry) -> Result<WatchedEntry, WatchedError> {
        entry.validate()?;

        let conn = self.conn()?;

        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();

        let genre_json =
            serde_json::to_string(&entry.genre).map_err(|e| WatchedError::Database(e.to_string()))?;
        let actors_json = serde_json::to_string(&entry.actors)
            .map_err(|e| WatchedError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO watched_movies (id, imdb_id, title, released, runtime, genre, actors, director, poster, imdb_rating, user_rating, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                entry.imdb_id,
                entry.title,
                entry.released.format("%Y-%m-%d").to_string(),
                entry.runtime,
                genre_json,
                actors_json,
                entry.director,
                entry.poster,
                entry.imdb_rating.map(f64::from),
                entry.user_rating.get(),
                entry.description,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                WatchedError::Duplicate(entry.imdb_id.clone())
            } else {
                WatchedError::Database(e.to_string())
            }
        })?;

        Ok(WatchedEntry {
            id,
            imdb_id: entry.imdb_id,
            title: entry.title,
            released: entry.released,
            runtime: entry.runtime,
            genre: entry.genre,
            actors: entry.actors,
            director: entry.director,
            poster: entry.poster,
            imdb_rating: entry.imdb_rating,
            user_rating: entry.user_rating,
            description: entry.description,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, imdb_id: &str) -> Result<Option<WatchedEntry>, WatchedError> {
        let conn = self.conn()?;

        conn.query_row(
            &format!(
                "SELECT {} FROM watched_movies WHERE imdb_id = ?",
                SELECT_COLUMNS
            ),
            params![imdb_id],
            Self::row_to_entry,
        )
        .optional()
        .map_err(|e| WatchedError::Database(e.to_string()))
    }

    fn delete_by_imdb_id(&self, imdb_id: &str) -> Result<bool, WatchedError> {
        let conn = self.conn()?;

        let deleted = conn
            .execute(
                "DELETE FROM watched_movies WHERE imdb_id = ?",
                params![imdb_id],
            )
            .map_err(|e| WatchedError::Database(e.to_string()))?;

        Ok(deleted > 0)
    }

    fn count(&self) -> Result<i64, WatchedError> {
        let conn = self.conn()?;

        conn.query_row("SELECT COUNT(*) FROM watched_movies", [], |row| row.get(0))
            .map_err(|e| WatchedError::Database(e.to_string()))
    }
}
