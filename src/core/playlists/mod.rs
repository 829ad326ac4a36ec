pub mod playlist_models;
pub mod playlist_service;

pub use playlist_models::{Playlist, Song, MAX_PLAYLIST_SIZE};
pub use playlist_service::{PlaylistError, PlaylistService, PlaylistStore};
