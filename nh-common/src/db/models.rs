//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "duration")]
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub bpm: Option<i64>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// Listening and session events (play, stop, login)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub guid: Uuid,
    pub user_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub ts: DateTime<Utc>,
}
