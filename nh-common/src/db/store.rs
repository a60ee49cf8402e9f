//! Therapy store: users, song catalog, recommendations and events
//!
//! Every call is bounded by a timeout. The convenience methods never
//! propagate a failure: writes return `false`, reads return `None` or an
//! empty list, and the failure text is kept for [`TherapyStore::last_error`].
//! The `fetch_*` reads return [`Error::StorageUnavailable`] instead, so a
//! caller can tell an outage apart from a missing record. Nothing retries.

use crate::db::models::{Event, Track, User};
use crate::recommend::{CategoryScore, CognitiveSummary, RecommendationRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;

/// Storage collaborator keyed by user identifier
#[async_trait]
pub trait TherapyStore: Send + Sync {
    /// Create or rename a user
    async fn upsert_user(&self, user_id: &str, name: &str) -> bool;

    /// Stored user, `Ok(None)` when unknown
    async fn fetch_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Replace the user's recommendation record wholesale
    async fn put_recommendations(
        &self,
        user_id: &str,
        categories: &[CategoryScore],
        cognitive_scores: Option<&CognitiveSummary>,
    ) -> bool;

    /// Stored record, `Ok(None)` when the user has none
    async fn fetch_recommendations(&self, user_id: &str) -> Result<Option<RecommendationRecord>>;

    async fn get_recommendations(&self, user_id: &str) -> Option<RecommendationRecord> {
        self.fetch_recommendations(user_id).await.ok().flatten()
    }

    async fn log_event(&self, user_id: &str, event_type: &str, payload: serde_json::Value)
        -> bool;

    /// The user's events, newest first
    async fn fetch_events(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Event>>;

    /// Insert or replace a catalog track
    async fn put_song(&self, track: &Track) -> bool;

    /// Catalog tracks in insertion order, optionally filtered by category.
    /// A limit of zero means no limit.
    async fn fetch_songs(&self, category: Option<&str>, limit: Option<usize>)
        -> Result<Vec<Track>>;

    async fn list_songs(&self, category: Option<&str>, limit: Option<usize>) -> Vec<Track> {
        self.fetch_songs(category, limit).await.unwrap_or_default()
    }

    async fn health_check(&self) -> bool;

    /// Text of the most recent failure
    fn last_error(&self) -> Option<String>;
}

/// SQLite-backed [`TherapyStore`]
pub struct SqliteStore {
    pool: SqlitePool,
    timeout: Duration,
    last_error: Mutex<Option<String>>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            last_error: Mutex::new(None),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn record_error(&self, message: String) {
        if let Ok(mut last) = self.last_error.lock() {
            *last = Some(message);
        }
    }

    /// Run a storage operation under the timeout, recording any failure
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        let message = match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {} ms", self.timeout.as_millis()),
        };
        error!("Store {} failed: {}", operation, message);
        self.record_error(message.clone());
        Err(Error::StorageUnavailable(format!("{} failed: {}", operation, message)))
    }

    /// [`Self::bounded`] for the calls that report failure as a falsy result
    async fn guarded<T, F>(&self, operation: &str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        self.bounded(operation, fut).await.ok()
    }

    async fn write_recommendations(
        &self,
        user_id: &str,
        categories: &[CategoryScore],
        cognitive_scores: Option<&CognitiveSummary>,
    ) -> Result<()> {
        let categories_json = serde_json::to_string(categories)?;
        let scores_json = cognitive_scores.map(serde_json::to_string).transpose()?;

        // Single statement so readers never see a partial record
        sqlx::query(
            r#"
            INSERT INTO recommendations (user_id, categories, cognitive_scores, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                categories = excluded.categories,
                cognitive_scores = excluded.cognitive_scores,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(categories_json)
        .bind(scores_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn read_recommendations(&self, user_id: &str) -> Result<Option<RecommendationRecord>> {
        let row = sqlx::query(
            "SELECT user_id, categories, cognitive_scores, updated_at
             FROM recommendations WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let categories: String = row.try_get("categories")?;
        let cognitive_scores: Option<String> = row.try_get("cognitive_scores")?;
        Ok(Some(RecommendationRecord {
            user_id: row.try_get("user_id")?,
            categories: serde_json::from_str(&categories)?,
            cognitive_scores: cognitive_scores
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        }))
    }

    async fn read_user(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT user_id, name, updated_at FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(User {
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn read_events(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT guid, user_id, event_type, payload, ts FROM events
             WHERE user_id = ? ORDER BY rowid DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(event_from_row).collect()
    }

    async fn read_songs(&self, category: Option<&str>, limit: Option<usize>) -> Result<Vec<Track>> {
        let limit = sql_limit(limit);
        let rows = match category {
            Some(category) => {
                sqlx::query(
                    "SELECT song_id, name, category, duration, bpm, key, url FROM songs
                     WHERE category = ? ORDER BY rowid LIMIT ?",
                )
                .bind(category)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT song_id, name, category, duration, bpm, key, url FROM songs
                     ORDER BY rowid LIMIT ?",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(track_from_row).collect()
    }
}

/// SQLite treats a negative LIMIT as unbounded
fn sql_limit(limit: Option<usize>) -> i64 {
    match limit {
        Some(n) if n > 0 => i64::try_from(n).unwrap_or(i64::MAX),
        _ => -1,
    }
}

fn track_from_row(row: &SqliteRow) -> Result<Track> {
    Ok(Track {
        id: row.try_get("song_id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        duration_secs: row.try_get("duration")?,
        bpm: row.try_get("bpm")?,
        key: row.try_get("key")?,
        url: row.try_get("url")?,
    })
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    let guid: String = row.try_get("guid")?;
    let payload: String = row.try_get("payload")?;
    Ok(Event {
        guid: Uuid::parse_str(&guid).map_err(|e| Error::Internal(e.to_string()))?,
        user_id: row.try_get("user_id")?,
        event_type: row.try_get("event_type")?,
        payload: serde_json::from_str(&payload)?,
        ts: row.try_get("ts")?,
    })
}

#[async_trait]
impl TherapyStore for SqliteStore {
    async fn upsert_user(&self, user_id: &str, name: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        let name = if name.trim().is_empty() { "User" } else { name };

        self.guarded("upsert_user", async {
            sqlx::query(
                r#"
                INSERT INTO users (user_id, name, updated_at) VALUES (?, ?, ?)
                ON CONFLICT(user_id) DO UPDATE SET
                    name = excluded.name,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(user_id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
            Ok::<_, Error>(())
        })
        .await
        .is_some()
    }

    async fn fetch_user(&self, user_id: &str) -> Result<Option<User>> {
        if user_id.is_empty() {
            return Ok(None);
        }
        self.bounded("fetch_user", self.read_user(user_id)).await
    }

    async fn put_recommendations(
        &self,
        user_id: &str,
        categories: &[CategoryScore],
        cognitive_scores: Option<&CognitiveSummary>,
    ) -> bool {
        if user_id.is_empty() {
            return false;
        }
        let saved = self
            .guarded(
                "put_recommendations",
                self.write_recommendations(user_id, categories, cognitive_scores),
            )
            .await
            .is_some();
        if saved {
            debug!(user_id, categories = categories.len(), "Saved recommendations");
        }
        saved
    }

    async fn fetch_recommendations(&self, user_id: &str) -> Result<Option<RecommendationRecord>> {
        if user_id.is_empty() {
            return Ok(None);
        }
        self.bounded("get_recommendations", self.read_recommendations(user_id))
            .await
    }

    async fn log_event(
        &self,
        user_id: &str,
        event_type: &str,
        payload: serde_json::Value,
    ) -> bool {
        if user_id.is_empty() {
            return false;
        }
        let payload = if payload.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            payload
        };

        self.guarded("log_event", async {
            sqlx::query(
                "INSERT INTO events (guid, user_id, event_type, payload, ts)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(event_type)
            .bind(serde_json::to_string(&payload)?)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
            Ok::<_, Error>(())
        })
        .await
        .is_some()
    }

    async fn fetch_events(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Event>> {
        if user_id.is_empty() {
            return Ok(Vec::new());
        }
        self.bounded("fetch_events", self.read_events(user_id, limit))
            .await
    }

    async fn put_song(&self, track: &Track) -> bool {
        let song_id = track.id.trim();
        if song_id.is_empty() {
            return false;
        }

        self.guarded("put_song", async {
            sqlx::query(
                r#"
                INSERT INTO songs (song_id, name, category, duration, bpm, key, url)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(song_id) DO UPDATE SET
                    name = excluded.name,
                    category = excluded.category,
                    duration = excluded.duration,
                    bpm = excluded.bpm,
                    key = excluded.key,
                    url = excluded.url
                "#,
            )
            .bind(song_id)
            .bind(&track.name)
            .bind(&track.category)
            .bind(track.duration_secs)
            .bind(track.bpm)
            .bind(&track.key)
            .bind(&track.url)
            .execute(&self.pool)
            .await?;
            Ok::<_, Error>(())
        })
        .await
        .is_some()
    }

    async fn fetch_songs(
        &self,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Track>> {
        let category = category.filter(|c| !c.is_empty());
        self.bounded("list_songs", self.read_songs(category, limit))
            .await
    }

    async fn health_check(&self) -> bool {
        self.guarded("health_check", async {
            sqlx::query("SELECT 1 FROM users LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
            Ok::<_, Error>(())
        })
        .await
        .is_some()
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }
}
