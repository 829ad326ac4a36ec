use super::playlist_models::{Playlist, Song, MAX_PLAYLIST_SIZE};
use crate::core::store::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Playlist not found")]
    NotFound,
    #[error("Playlist is full ({MAX_PLAYLIST_SIZE} songs max)")]
    Full,
    #[error("Playlist names must not be empty")]
    InvalidName,
}

#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// Returns the new playlist id.
    async fn create_playlist(
        &self,
        guild_id: u64,
        name: &str,
        created_by: u64,
    ) -> Result<Option<i64>, StoreError>;
    async fn get_playlists(&self, guild_id: u64) -> Result<Vec<Playlist>, StoreError>;
    async fn get_playlist(&self, guild_id: u64, id: i64) -> Result<Option<Playlist>, StoreError>;
    /// Append a song unless the playlist already holds `max_songs`. The
    /// size check and the append are one atomic step. Returns `false` when
    /// the playlist does not exist or is full.
    async fn add_song_to_playlist(
        &self,
        guild_id: u64,
        id: i64,
        song: Song,
        max_songs: usize,
    ) -> Result<bool, StoreError>;
}

pub struct PlaylistService<S: PlaylistStore> {
    store: Arc<S>,
}

impl<S: PlaylistStore> PlaylistService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        guild_id: u64,
        name: &str,
        created_by: u64,
    ) -> Result<i64, PlaylistError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlaylistError::InvalidName);
        }
        self.store
            .create_playlist(guild_id, name, created_by)
            .await?
            .ok_or_else(|| StoreError::backend("playlist insert returned no id").into())
    }

    pub async fn list(&self, guild_id: u64) -> Result<Vec<Playlist>, PlaylistError> {
        Ok(self.store.get_playlists(guild_id).await?)
    }

    pub async fn get(&self, guild_id: u64, id: i64) -> Result<Playlist, PlaylistError> {
        self.store
            .get_playlist(guild_id, id)
            .await?
            .ok_or(PlaylistError::NotFound)
    }

    /// Append a song, refusing once the playlist holds the maximum.
    pub async fn add_song(
        &self,
        guild_id: u64,
        id: i64,
        title: &str,
        url: &str,
        added_by: u64,
    ) -> Result<Playlist, PlaylistError> {
        let playlist = self.get(guild_id, id).await?;
        if playlist.is_full() {
            return Err(PlaylistError::Full);
        }

        let song = Song {
            title: title.trim().to_string(),
            url: url.trim().to_string(),
            added_by,
            added_at: Utc::now(),
        };
        // Playlists are never deleted, so a refused append means another
        // add filled the last slot first.
        if !self
            .store
            .add_song_to_playlist(guild_id, id, song, MAX_PLAYLIST_SIZE)
            .await?
        {
            return Err(PlaylistError::Full);
        }

        self.get(guild_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryStore;

    fn make_service() -> PlaylistService<InMemoryStore> {
        PlaylistService::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn songs_keep_insertion_order() {
        let service = make_service();
        let id = service.create(1, "Focus", 7).await.unwrap();

        service.add_song(1, id, "First", "https://a", 7).await.unwrap();
        let playlist = service.add_song(1, id, "Second", "https://b", 8).await.unwrap();

        let titles: Vec<&str> = playlist.songs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(playlist.songs[1].added_by, 8);
    }

    #[tokio::test]
    async fn playlists_are_scoped_to_their_guild() {
        let service = make_service();
        let id = service.create(1, "Focus", 7).await.unwrap();

        assert!(matches!(service.get(2, id).await, Err(PlaylistError::NotFound)));
        assert!(matches!(
            service.add_song(2, id, "x", "https://x", 7).await,
            Err(PlaylistError::NotFound)
        ));
        assert_eq!(service.list(1).await.unwrap().len(), 1);
        assert!(service.list(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_playlist_rejects_more_songs() {
        let service = make_service();
        let id = service.create(1, "Huge", 7).await.unwrap();
        for i in 0..MAX_PLAYLIST_SIZE {
            service
                .add_song(1, id, &format!("Song {i}"), "https://x", 7)
                .await
                .unwrap();
        }

        assert!(matches!(
            service.add_song(1, id, "One more", "https://x", 7).await,
            Err(PlaylistError::Full)
        ));
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let service = make_service();
        assert!(matches!(
            service.create(1, "  ", 7).await,
            Err(PlaylistError::InvalidName)
        ));
    }
}
