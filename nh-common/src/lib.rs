//! # NeuroHarmony Common Library
//!
//! Shared code for the NeuroHarmony services including:
//! - EEG batch ingest, band aggregation and cognitive scoring
//! - Classifier feature selection and prediction adapter
//! - Recommendation ranking and playlist allocation
//! - Pipeline context tying the stages together
//! - Persistence collaborator (SQLite) and configuration loading

pub mod classify;
pub mod config;
pub mod db;
pub mod eeg;
pub mod error;
pub mod pipeline;
pub mod recommend;

pub use error::{Error, Result};
pub use pipeline::PipelineContext;
