//! Proportional playlist allocation
//!
//! Spreads a playlist of N tracks across ranked categories:
//! 1. Drop ranked categories that have no tracks in the catalog. Remaining
//!    scores are not renormalized unless configured.
//! 2. Walk the ranking in order; each category gets
//!    `max(1, round(score * N))` (ties to even), capped at the remaining
//!    budget and at the tracks it actually has. The last category takes
//!    whatever budget remains (at least 1).
//! 3. If availability caps left budget unassigned, top up categories in
//!    rank order from their spare tracks.
//!
//! The total allocated is exactly `min(N, tracks available in ranked
//! categories)`.

use super::catalog::{Catalog, PlaylistTrack};
use super::ranking::CategoryScore;
use crate::config::DEFAULT_PLAYLIST_SIZE;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationOptions {
    /// Target playlist size N
    pub playlist_size: usize,
    /// Rescale surviving scores to sum to 1 after catalog filtering
    pub renormalize_after_filter: bool,
}

impl Default for AllocationOptions {
    fn default() -> Self {
        Self {
            playlist_size: DEFAULT_PLAYLIST_SIZE,
            renormalize_after_filter: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub category: String,
    pub tracks: usize,
}

/// Allocate a playlist across the ranking
pub fn allocate(
    ranking: &[CategoryScore],
    catalog: &Catalog,
    options: AllocationOptions,
) -> Vec<Allocation> {
    let n = options.playlist_size;

    let mut ranked: Vec<(&str, f64, usize)> = ranking
        .iter()
        .filter(|r| catalog.contains(&r.category))
        .map(|r| (r.category.as_str(), r.score, catalog.available(&r.category)))
        .collect();
    if n == 0 || ranked.is_empty() {
        return Vec::new();
    }

    if options.renormalize_after_filter {
        let total: f64 = ranked.iter().map(|(_, s, _)| s).sum();
        if total > 0.0 {
            for entry in ranked.iter_mut() {
                entry.1 /= total;
            }
        }
    }

    let available: usize = ranked.iter().map(|(_, _, a)| a).sum();
    let mut remaining = n.min(available);
    let mut allocations: Vec<(Allocation, usize)> = Vec::new();

    let last = ranked.len() - 1;
    for (i, (category, score, avail)) in ranked.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        let wanted = if i == last {
            remaining.max(1)
        } else {
            let proportional = (score * n as f64).round_ties_even();
            // NaN and negatives saturate to 0
            (proportional as usize).max(1)
        };
        let count = wanted.min(remaining).min(*avail);
        remaining -= count;
        allocations.push((
            Allocation {
                category: category.to_string(),
                tracks: count,
            },
            *avail,
        ));
    }

    for (allocation, avail) in allocations.iter_mut() {
        if remaining == 0 {
            break;
        }
        let extra = (*avail - allocation.tracks).min(remaining);
        allocation.tracks += extra;
        remaining -= extra;
    }

    let allocations: Vec<Allocation> = allocations.into_iter().map(|(a, _)| a).collect();
    debug!(
        playlist_size = n,
        categories = allocations.len(),
        dropped = ranking.len() - ranked.len(),
        "Allocated playlist"
    );
    allocations
}

/// Materialize an allocation: the first `tracks` tracks of each category
pub fn build_playlist(
    allocations: &[Allocation],
    catalog: &Catalog,
    max_tracks: usize,
) -> Vec<PlaylistTrack> {
    allocations
        .iter()
        .flat_map(|a| {
            catalog
                .tracks(&a.category)
                .iter()
                .take(a.tracks)
                .map(move |track| PlaylistTrack {
                    track: track.clone(),
                    category: a.category.clone(),
                })
        })
        .take(max_tracks)
        .collect()
}
