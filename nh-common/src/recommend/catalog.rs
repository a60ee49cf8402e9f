//! Track catalog grouped by category

use crate::db::models::Track;
use serde::Serialize;

/// Category assigned to tracks that carry none
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Tracks grouped by category, categories in first-seen order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: Vec<(String, Vec<Track>)>,
}

impl Catalog {
    pub fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut catalog = Catalog::default();
        for track in tracks {
            let category = track
                .category
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            match catalog.categories.iter_mut().find(|(c, _)| *c == category) {
                Some((_, list)) => list.push(track),
                None => catalog.categories.push((category, vec![track])),
            }
        }
        catalog
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.available(category) > 0
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(c, _)| c.as_str())
    }

    pub fn tracks(&self, category: &str) -> &[Track] {
        self.categories
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, t)| t.as_slice())
            .unwrap_or(&[])
    }

    pub fn available(&self, category: &str) -> usize {
        self.tracks(category).len()
    }
}

/// A track placed in a playlist, tagged with its category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistTrack {
    pub track: Track,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, category: Option<&str>) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Track {}", id),
            category: category.map(str::to_string),
            duration_secs: None,
            bpm: None,
            key: None,
            url: None,
        }
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let catalog = Catalog::from_tracks(vec![
            track("1", Some("Rock")),
            track("2", Some("Classical")),
            track("3", Some("Rock")),
            track("4", None),
        ]);
        let categories: Vec<&str> = catalog.categories().collect();
        assert_eq!(categories, vec!["Rock", "Classical", UNCATEGORIZED]);
        assert_eq!(catalog.available("Rock"), 2);
        assert_eq!(catalog.tracks("Rock")[1].id, "3");
        assert!(!catalog.contains("Pop"));
    }
}
