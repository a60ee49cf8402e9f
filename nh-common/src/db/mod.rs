//! Database models and the therapy store

pub mod init;
pub mod models;
pub mod seed;
pub mod store;

pub use init::*;
pub use models::*;
pub use seed::{default_audio_url, seed_catalog, seed_tracks};
pub use store::{SqliteStore, TherapyStore};
