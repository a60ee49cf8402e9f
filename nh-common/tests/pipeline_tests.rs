//! End-to-end pipeline: CSV batch → scores → predictions → ranking →
//! persisted recommendation → playlist

use nh_common::classify::{ClassCode, LinearModel};
use nh_common::db::{init_memory_database, seed_catalog, SqliteStore, TherapyStore};
use nh_common::eeg::{parse_csv, Band, Electrode};
use nh_common::recommend::{allocate, build_playlist, AllocationOptions, Catalog};
use nh_common::{Error, PipelineContext};
use std::time::Duration;

fn uniform_rows(beta: f64, theta: f64, rows: usize) -> String {
    let mut header = Vec::new();
    for band in [Band::Beta, Band::Theta] {
        for electrode in Electrode::ALL {
            header.push(format!("{}_{}_mean", band.as_str(), electrode.as_str()));
        }
    }
    let mut csv = header.join(",");
    csv.push('\n');
    for _ in 0..rows {
        let mut cells = vec![beta.to_string(); 4];
        cells.extend(vec![theta.to_string(); 4]);
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    csv
}

/// Two-class model over the eight beta/theta columns: class 1 favours
/// beta, class 2 favours theta
fn beta_theta_model() -> LinearModel {
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
}

#[test]
fn test_identical_rows_score_at_midpoint() {
    let mut ctx = PipelineContext::new(None);
    let scored = ctx.submit(parse_csv(&uniform_rows(2.0, 4.0, 3)).unwrap());

    for (bands, raw) in scored.bands.iter().zip(&scored.raw) {
        assert_eq!(bands.beta, 2.0);
        assert_eq!(bands.theta, 4.0);
        assert_eq!(raw.focus, 2.0);
        assert_eq!(raw.relaxation, -raw.engagement);
    }
    for normalized in &scored.normalized {
        assert_eq!(normalized.focus, 5.0);
        assert_eq!(normalized.engagement, 5.0);
        assert_eq!(normalized.relaxation, 5.0);
    }

    let summary = scored.cognitive_summary();
    assert_eq!(summary.engagement, Some(5.0));
    assert_eq!(summary.focus, Some(5.0));
}

#[test]
fn test_zero_beta_gives_infinite_focus() {
    let mut ctx = PipelineContext::new(None);
    let scored = ctx.submit(parse_csv(&uniform_rows(0.0, 3.0, 2)).unwrap());
    assert!(scored.raw.iter().all(|s| s.focus == f64::INFINITY));
    // All infinite: constant column
    assert!(scored.normalized.iter().all(|s| s.focus == 5.0));
}

#[test]
fn test_ranking_sums_to_one() {
    let csv = "Beta_TP9_mean,Beta_AF7_mean,Beta_AF8_mean,Beta_TP10_mean,\
               Theta_TP9_mean,Theta_AF7_mean,Theta_AF8_mean,Theta_TP10_mean\n\
               5,5,5,5,1,1,1,1\n\
               1,1,1,1,2,2,2,2\n\
               3,3,3,3,3,3,3,2\n";
    let mut ctx = PipelineContext::new(Some(beta_theta_model().into_handle()));
    ctx.submit(parse_csv(csv).unwrap());
    ctx.classify().unwrap();

    let ranking = ctx.ranking().unwrap();
    let total: f64 = ranking.iter().map(|r| r.score).sum();
    assert!((total - 1.0).abs() < 1e-6);
    assert_eq!(ranking[0].category, "Classical");
    assert!(ranking.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_unclassified_batch_has_empty_ranking() {
    let mut ctx = PipelineContext::new(None);
    assert!(matches!(ctx.ranking(), Err(Error::NoBatch)));
    ctx.submit(parse_csv(&uniform_rows(1.0, 1.0, 2)).unwrap());
    assert!(ctx.ranking().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_to_playlist() {
    let store = SqliteStore::new(init_memory_database().await.unwrap(), Duration::from_secs(5));
    assert_eq!(seed_catalog(&store).await, 9);

    let mut ctx = PipelineContext::new(Some(beta_theta_model().into_handle()));
    ctx.submit(parse_csv(&uniform_rows(6.0, 1.0, 4)).unwrap());
    ctx.classify().unwrap();

    let scored = ctx.current().unwrap();
    let ranking = scored.ranking();
    let summary = scored.cognitive_summary();
    assert!(store.put_recommendations("pat@example.com", &ranking, Some(&summary)).await);

    let record = store.get_recommendations("pat@example.com").await.unwrap();
    assert_eq!(record.categories, ranking);

    let catalog = Catalog::from_tracks(store.list_songs(None, None).await);
    let allocations = allocate(&record.categories, &catalog, AllocationOptions::default());
    let playlist = build_playlist(&allocations, &catalog, 6);

    assert_eq!(playlist.len(), 6);
    assert!(playlist.iter().all(|t| t.category == "Classical"));
    assert_eq!(playlist[0].track.name, "Bach's Prelude");
}
