//! HTTP API handlers for nh-mt

pub mod batches;
pub mod health;
pub mod predictions;
pub mod recommendations;
pub mod songs;
pub mod users;

pub use batches::{discard_batch, get_current_batch, get_insights, upload_batch};
pub use health::{get_build_info, health_routes};
pub use predictions::run_predictions;
pub use recommendations::{get_playlist, get_recommendations};
pub use songs::{list_songs, put_song};
pub use users::{get_user, list_events, log_event, upsert_user};
