use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most songs a single playlist may hold.
pub const MAX_PLAYLIST_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub url: String,
    pub added_by: u64,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: i64,
    pub guild_id: u64,
    pub name: String,
    pub created_by: u64,
    /// Insertion order is play order.
    pub songs: Vec<Song>,
    pub created_at: DateTime<Utc>,
}

impl Playlist {
    pub fn is_full(&self) -> bool {
        self.songs.len() >= MAX_PLAYLIST_SIZE
    }
}
