//! Default song catalog

use super::models::Track;
use super::store::TherapyStore;
use tracing::{info, warn};

/// Fallback audio source per category; unknown categories get the Classical one
pub fn default_audio_url(category: &str) -> &'static str {
    match category {
        "Rock" => "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3",
        "Pop" => "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-3.mp3",
        "Rap" => "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-4.mp3",
        "R&B" => "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-5.mp3",
        _ => "https://archive.org/details/classical-music-mix-by-various-artists/12+-+Mozart+-+Rondo+a+la+Turc%2C+K331%2C+No.+3.mp3",
    }
}

// (id, name, duration seconds, bpm, key)
const CLASSICAL: [(&str, &str, i64, i64, &str); 9] = [
    ("1", "Bach's Prelude", 240, 72, "C Major"),
    ("2", "Mozart's Sonata", 280, 68, "G Major"),
    ("3", "Beethoven's Symphony", 320, 76, "F Major"),
    ("4", "Chopin's Nocturne", 200, 65, "D Major"),
    ("5", "Vivaldi's Spring", 260, 80, "A Major"),
    ("6", "Debussy's Clair de Lune", 220, 62, "E Major"),
    ("7", "Pachelbel's Canon", 300, 70, "B♭ Major"),
    ("8", "Schubert's Ave Maria", 180, 60, "C Major"),
    ("9", "Brahms' Lullaby", 160, 58, "G Major"),
];

/// The built-in starter catalog
pub fn seed_tracks() -> Vec<Track> {
    let category = "Classical";
    CLASSICAL
        .iter()
        .map(|(id, name, duration, bpm, key)| Track {
            id: id.to_string(),
            name: name.to_string(),
            category: Some(category.to_string()),
            duration_secs: Some(*duration),
            bpm: Some(*bpm),
            key: Some(key.to_string()),
            url: Some(default_audio_url(category).to_string()),
        })
        .collect()
}

/// Write the starter catalog when the song table is empty
///
/// Returns the number of tracks written. Nothing is written when the
/// catalog cannot be read.
pub async fn seed_catalog(store: &dyn TherapyStore) -> usize {
    match store.fetch_songs(None, Some(1)).await {
        Ok(existing) if existing.is_empty() => {}
        Ok(_) => return 0,
        Err(e) => {
            warn!("Skipping catalog seed: {}", e);
            return 0;
        }
    }

    let mut written = 0;
    for track in seed_tracks() {
        if store.put_song(&track).await {
            written += 1;
        }
    }
    info!("Seeded song catalog with {} tracks", written);
    written
}
