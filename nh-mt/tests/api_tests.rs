//! Integration tests for nh-mt API endpoints
//!
//! Each test builds the router over an in-memory SQLite store seeded with the
//! default catalog and drives it with `oneshot`.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use nh_common::classify::{ClassCode, ClassifierHandle, LinearModel};
use nh_common::db::{
    init_memory_database, seed_catalog, Event, SqliteStore, TherapyStore, Track, User,
};
use nh_common::recommend::{CategoryScore, CognitiveSummary, RecommendationRecord};
use nh_common::{Error, PipelineContext};
use nh_mt::{build_router, AppState, ServiceSettings};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot`

const BAND_HEADER: &str = "Beta_TP9_mean,Beta_AF7_mean,Beta_AF8_mean,Beta_TP10_mean,\
                           Theta_TP9_mean,Theta_AF7_mean,Theta_AF8_mean,Theta_TP10_mean";

/// Class 1 (Classical) follows beta power, class 2 (Rock) theta power
fn beta_theta_model() -> ClassifierHandle {
    LinearModel {
        classes: vec![ClassCode::Int(1), ClassCode::Int(2)],
        feature_names: None,
        weights: vec![
            vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
        ],
        intercepts: vec![0.0, 0.0],
        supports_confidence: true,
    }
    .into_handle()
}

fn csv_rows(rows: &[[f64; 2]]) -> String {
    let mut csv = format!("{}\n", BAND_HEADER);
    for [beta, theta] in rows {
        let mut cells = vec![beta.to_string(); 4];
        cells.extend(vec![theta.to_string(); 4]);
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    csv
}

async fn setup_store() -> Arc<SqliteStore> {
    let pool = init_memory_database().await.expect("Should create database");
    let store = Arc::new(SqliteStore::new(pool, Duration::from_secs(5)));
    seed_catalog(store.as_ref()).await;
    store
}

fn setup_app(
    store: Arc<dyn TherapyStore>,
    classifier: Option<ClassifierHandle>,
) -> axum::Router {
    let state = AppState::new(
        PipelineContext::new(classifier),
        store,
        ServiceSettings::default(),
    );
    build_router(state)
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn csv_request(uri: &str, csv: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/csv")
        .body(Body::from(csv))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(setup_store().await, None);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "nh-mt");
    assert_eq!(body["model_loaded"], false);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_build_info() {
    let app = setup_app(setup_store().await, None);
    let (status, body) = send(&app, test_request("GET", "/api/buildinfo")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["git_hash"].is_string());
}

// =============================================================================
// Batches and insights
// =============================================================================

#[tokio::test]
async fn test_upload_scores_batch() {
    let app = setup_app(setup_store().await, None);

    let (status, body) = send(
        &app,
        csv_request("/api/batches?patient_id=pat@example.com", csv_rows(&[[2.0, 4.0]; 3])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], 3);
    assert_eq!(body["patient_id"], "pat@example.com");
    assert_eq!(body["columns"].as_array().unwrap().len(), 8);
    assert_eq!(body["cognitive_scores"]["focus"], 5.0);

    let (status, body) = send(&app, test_request("GET", "/api/batches/current")).await;
    assert_eq!(status, StatusCode::OK);
    let row = &body["rows"][0];
    assert_eq!(row["bands"]["beta"], 2.0);
    assert_eq!(row["scores"]["focus"], 2.0);
    assert_eq!(row["normalized"]["focus"], 5.0);
    assert_eq!(body["classified"], false);
}

#[tokio::test]
async fn test_non_finite_scores_serialize_as_null() {
    let app = setup_app(setup_store().await, None);
    send(&app, csv_request("/api/batches", csv_rows(&[[0.0, 3.0], [1.0, 3.0]]))).await;

    let (_, body) = send(&app, test_request("GET", "/api/batches/current")).await;
    assert!(body["rows"][0]["scores"]["focus"].is_null());
    assert_eq!(body["rows"][1]["scores"]["focus"], 3.0);
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let app = setup_app(setup_store().await, None);
    let (status, body) = send(&app, csv_request("/api/batches", String::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_discard_batch() {
    let app = setup_app(setup_store().await, None);
    send(&app, csv_request("/api/batches", csv_rows(&[[1.0, 1.0]]))).await;

    let (status, _) = send(&app, test_request("DELETE", "/api/batches/current")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, test_request("GET", "/api/batches/current")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NO_BATCH");

    let (status, _) = send(&app, test_request("DELETE", "/api/batches/current")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insights() {
    let app = setup_app(setup_store().await, None);
    let (status, _) = send(&app, test_request("GET", "/api/insights")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, csv_request("/api/batches", csv_rows(&[[1.0, 1.0], [3.0, 1.0]]))).await;
    let (status, body) = send(&app, test_request("GET", "/api/insights")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], 2);
    assert_eq!(body["cognitive_scores"]["engagement"], 5.0);
    assert_eq!(body["engagement_achieved"], 5.0);
}

// =============================================================================
// Predictions
// =============================================================================

#[tokio::test]
async fn test_predictions_without_batch() {
    let app = setup_app(setup_store().await, Some(beta_theta_model()));
    let (status, body) = send(&app, test_request("POST", "/api/predictions")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NO_BATCH");
}

#[tokio::test]
async fn test_predictions_without_model() {
    let app = setup_app(setup_store().await, None);
    send(&app, csv_request("/api/batches", csv_rows(&[[1.0, 1.0]]))).await;

    let (status, body) = send(&app, test_request("POST", "/api/predictions")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "MISSING_MODEL");

    // Scoring is still available
    let (status, _) = send(&app, test_request("GET", "/api/insights")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_predictions_without_feature_columns() {
    let app = setup_app(setup_store().await, Some(beta_theta_model()));
    send(
        &app,
        csv_request("/api/batches", "timestamp,engagement_score\n2024-01-01,1\n".to_string()),
    )
    .await;

    let (status, body) = send(&app, test_request("POST", "/api/predictions")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "NO_FEATURE_COLUMNS");
}

#[tokio::test]
async fn test_predictions_persist_and_playlist() {
    let app = setup_app(setup_store().await, Some(beta_theta_model()));
    send(
        &app,
        csv_request("/api/batches?patient_id=pat@example.com", csv_rows(&[[6.0, 1.0]; 4])),
    )
    .await;

    let (status, body) = send(&app, test_request("POST", "/api/predictions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], true);
    assert_eq!(body["top_category"], "Classical");
    assert_eq!(body["summary"]["rows"], 4);
    assert_eq!(body["summary"]["latest"]["strength"], "strong");
    let total: f64 = body["ranking"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["score"].as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-6);

    let (status, body) = send(
        &app,
        test_request("GET", "/api/recommendations/pat@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"][0]["category"], "Classical");
    assert_eq!(body["cognitive_scores"]["engagement"], 5.0);

    let (status, body) = send(&app, test_request("GET", "/api/playlist/pat@example.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracks"].as_array().unwrap().len(), 6);
    assert_eq!(body["tracks"][0]["category"], "Classical");
    assert_eq!(body["tracks"][0]["track"]["name"], "Bach's Prelude");

    let (_, body) = send(
        &app,
        test_request("GET", "/api/playlist/pat@example.com?max_tracks=3"),
    )
    .await;
    assert_eq!(body["tracks"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_predictions_without_patient_are_not_saved() {
    let app = setup_app(setup_store().await, Some(beta_theta_model()));
    send(&app, csv_request("/api/batches", csv_rows(&[[6.0, 1.0]]))).await;

    let (status, body) = send(&app, test_request("POST", "/api/predictions")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["saved"].is_null());
}

#[tokio::test]
async fn test_storage_failure_is_reported_not_fatal() {
    let store = setup_store().await;
    let app = setup_app(store.clone(), Some(beta_theta_model()));
    send(
        &app,
        csv_request("/api/batches?patient_id=pat@example.com", csv_rows(&[[6.0, 1.0]])),
    )
    .await;

    store.pool().close().await;

    let (status, body) = send(&app, test_request("POST", "/api/predictions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], false);
    assert!(body["storage_error"].is_string());

    let (_, body) = send(&app, test_request("GET", "/health")).await;
    assert_eq!(body["status"], "degraded");
}

// =============================================================================
// Recommendations, songs, users
// =============================================================================

#[tokio::test]
async fn test_unknown_user_has_no_recommendations() {
    let app = setup_app(setup_store().await, None);
    let (status, body) = send(
        &app,
        test_request("GET", "/api/recommendations/nobody@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        test_request("GET", "/api/playlist/nobody@example.com?max_tracks=0"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_songs_catalog() {
    let app = setup_app(setup_store().await, None);

    let (status, body) = send(
        &app,
        test_request("GET", "/api/songs?category=Classical&limit=4"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/songs/r1",
            json!({"name": "Riff", "category": "Rock", "bpm": 120}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3");

    let (_, body) = send(&app, test_request("GET", "/api/songs?category=Rock")).await;
    assert_eq!(body[0]["id"], "r1");
    assert_eq!(body[0]["bpm"], 120);

    let (_, body) = send(&app, test_request("GET", "/api/songs")).await;
    assert_eq!(body.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_users_and_events() {
    let app = setup_app(setup_store().await, None);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/users", json!({"user_id": " "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            json!({"user_id": "pat@example.com", "name": "Pat"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], true);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/users/pat@example.com/events",
            json!({"event_type": "play", "payload": {"song_id": "1"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/users/pat@example.com/events",
            json!({"event_type": "dance"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, test_request("GET", "/api/users/pat@example.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Pat");

    let (status, _) = send(&app, test_request("GET", "/api/users/nobody@example.com")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        test_request("GET", "/api/users/pat@example.com/events"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], "play");
    assert_eq!(events[0]["payload"]["song_id"], "1");
}

// =============================================================================
// Storage outages on reads
// =============================================================================

/// Delegates to SQLite but fails every catalog read
struct CatalogOutageStore(SqliteStore);

#[async_trait]
impl TherapyStore for CatalogOutageStore {
    async fn upsert_user(&self, user_id: &str, name: &str) -> bool {
        self.0.upsert_user(user_id, name).await
    }

    async fn fetch_user(&self, user_id: &str) -> nh_common::Result<Option<User>> {
        self.0.fetch_user(user_id).await
    }

    async fn put_recommendations(
        &self,
        user_id: &str,
        categories: &[CategoryScore],
        cognitive_scores: Option<&CognitiveSummary>,
    ) -> bool {
        self.0
            .put_recommendations(user_id, categories, cognitive_scores)
            .await
    }

    async fn fetch_recommendations(
        &self,
        user_id: &str,
    ) -> nh_common::Result<Option<RecommendationRecord>> {
        self.0.fetch_recommendations(user_id).await
    }

    async fn log_event(&self, user_id: &str, event_type: &str, payload: Value) -> bool {
        self.0.log_event(user_id, event_type, payload).await
    }

    async fn fetch_events(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> nh_common::Result<Vec<Event>> {
        self.0.fetch_events(user_id, limit).await
    }

    async fn put_song(&self, track: &Track) -> bool {
        self.0.put_song(track).await
    }

    async fn fetch_songs(
        &self,
        _category: Option<&str>,
        _limit: Option<usize>,
    ) -> nh_common::Result<Vec<Track>> {
        Err(Error::StorageUnavailable("list_songs failed: disk I/O error".into()))
    }

    async fn health_check(&self) -> bool {
        self.0.health_check().await
    }

    fn last_error(&self) -> Option<String> {
        Some("disk I/O error".into())
    }
}

#[tokio::test]
async fn test_read_outage_is_not_reported_as_missing() {
    let store = setup_store().await;
    let app = setup_app(store.clone(), None);
    store.pool().close().await;

    for uri in [
        "/api/recommendations/pat@example.com",
        "/api/playlist/pat@example.com",
        "/api/songs",
        "/api/users/pat@example.com",
        "/api/users/pat@example.com/events",
    ] {
        let (status, body) = send(&app, test_request("GET", uri)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
        assert_eq!(body["error"]["code"], "STORAGE_UNAVAILABLE", "{}", uri);
    }
}

#[tokio::test]
async fn test_catalog_outage_fails_playlist() {
    let pool = init_memory_database().await.expect("Should create database");
    let inner = SqliteStore::new(pool, Duration::from_secs(5));
    let categories = [CategoryScore {
        category: "Classical".into(),
        score: 1.0,
    }];
    assert!(inner.put_recommendations("pat@example.com", &categories, None).await);
    let app = setup_app(Arc::new(CatalogOutageStore(inner)), None);

    let (status, _) = send(
        &app,
        test_request("GET", "/api/recommendations/pat@example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, test_request("GET", "/api/playlist/pat@example.com")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "STORAGE_UNAVAILABLE");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("list_songs failed"));
}
