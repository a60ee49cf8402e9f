//! Recommendation aggregation
//!
//! Ranking of predicted categories, the persisted recommendation record and
//! proportional playlist allocation over the track catalog.

pub mod allocation;
pub mod catalog;
pub mod ranking;
pub mod record;

pub use allocation::{allocate, build_playlist, Allocation, AllocationOptions};
pub use catalog::{Catalog, PlaylistTrack, UNCATEGORIZED};
pub use ranking::{rank_predictions, CategoryScore};
pub use record::{CognitiveSummary, RecommendationRecord};
