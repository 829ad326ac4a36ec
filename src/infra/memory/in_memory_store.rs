// In-memory implementation of every store port.
//
// Backs the unit tests. Same semantics as the SQLite store: atomic steps use
// the DashMap entry API so concurrent tasks never observe a half-applied
// update.

use crate::core::custom_commands::{normalize_name, CommandStore, CustomCommand};
use crate::core::guilds::{Guild, GuildSettings, GuildStore};
use crate::core::leveling::{Member, MemberStore};
use crate::core::playlists::{Playlist, PlaylistStore, Song};
use crate::core::store::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// (guild_id, user_id)
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct MemberKey {
    guild_id: u64,
    user_id: u64,
}

/// (guild_id, lower-cased name)
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct CommandKey {
    guild_id: u64,
    name: String,
}

impl CommandKey {
    fn new(guild_id: u64, name: &str) -> Self {
        Self {
            guild_id,
            name: normalize_name(name),
        }
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    guilds: DashMap<u64, Guild>,
    members: DashMap<MemberKey, Member>,
    commands: DashMap<CommandKey, CustomCommand>,
    playlists: DashMap<i64, Playlist>,
    next_playlist_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuildStore for InMemoryStore {
    async fn get_guild(&self, guild_id: u64) -> Result<Option<Guild>, StoreError> {
        Ok(self.guilds.get(&guild_id).map(|entry| entry.clone()))
    }

    async fn create_guild(&self, guild: Guild) -> Result<bool, StoreError> {
        match self.guilds.entry(guild.guild_id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(guild);
                Ok(true)
            }
        }
    }

    async fn update_guild(
        &self,
        guild_id: u64,
        settings: &GuildSettings,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self.guilds.get_mut(&guild_id) {
            Some(mut guild) => {
                guild.apply(settings, now);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl MemberStore for InMemoryStore {
    async fn get_member(&self, guild_id: u64, user_id: u64) -> Result<Option<Member>, StoreError> {
        let key = MemberKey { guild_id, user_id };
        Ok(self.members.get(&key).map(|entry| entry.clone()))
    }

    async fn increment_xp(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Member, StoreError> {
        let key = MemberKey { guild_id, user_id };

        // The entry guard holds the shard lock, so increment and read-back
        // happen as one step.
        let member = self
            .members
            .entry(key)
            .and_modify(|member| {
                member.xp = member.xp.saturating_add(amount);
                member.messages_count += 1;
                member.last_message_time = now;
            })
            .or_insert_with(|| Member {
                guild_id,
                user_id,
                xp: amount,
                level: 0,
                messages_count: 1,
                last_message_time: now,
                joined_at: now,
            });

        Ok(member.clone())
    }

    async fn set_level(&self, guild_id: u64, user_id: u64, level: u32) -> Result<bool, StoreError> {
        let key = MemberKey { guild_id, user_id };
        match self.members.get_mut(&key) {
            Some(mut member) => {
                member.level = member.level.max(level);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn top_members(&self, guild_id: u64, limit: usize) -> Result<Vec<Member>, StoreError> {
        let mut members: Vec<Member> = self
            .members
            .iter()
            .filter(|entry| entry.key().guild_id == guild_id)
            .map(|entry| entry.value().clone())
            .collect();

        members.sort_by(|a, b| b.xp.cmp(&a.xp).then(a.user_id.cmp(&b.user_id)));
        members.truncate(limit);
        Ok(members)
    }
}

#[async_trait]
impl CommandStore for InMemoryStore {
    async fn get_custom_command(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<CustomCommand>, StoreError> {
        let key = CommandKey::new(guild_id, name);
        Ok(self.commands.get(&key).map(|entry| entry.clone()))
    }

    async fn create_custom_command(&self, mut command: CustomCommand) -> Result<bool, StoreError> {
        command.name = normalize_name(&command.name);
        match self.commands.entry(CommandKey::new(command.guild_id, &command.name)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(command);
                Ok(true)
            }
        }
    }

    async fn use_custom_command(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<CustomCommand>, StoreError> {
        let key = CommandKey::new(guild_id, name);
        Ok(self.commands.get_mut(&key).map(|mut command| {
            command.uses += 1;
            command.clone()
        }))
    }

    async fn list_custom_commands(&self, guild_id: u64) -> Result<Vec<CustomCommand>, StoreError> {
        let mut commands: Vec<CustomCommand> = self
            .commands
            .iter()
            .filter(|entry| entry.key().guild_id == guild_id)
            .map(|entry| entry.value().clone())
            .collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(commands)
    }

    async fn delete_custom_command(&self, guild_id: u64, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .commands
            .remove(&CommandKey::new(guild_id, name))
            .is_some())
    }
}

#[async_trait]
impl PlaylistStore for InMemoryStore {
    async fn create_playlist(
        &self,
        guild_id: u64,
        name: &str,
        created_by: u64,
    ) -> Result<Option<i64>, StoreError> {
        let id = self.next_playlist_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.playlists.insert(
            id,
            Playlist {
                id,
                guild_id,
                name: name.to_string(),
                created_by,
                songs: Vec::new(),
                created_at: Utc::now(),
            },
        );
        Ok(Some(id))
    }

    async fn get_playlists(&self, guild_id: u64) -> Result<Vec<Playlist>, StoreError> {
        let mut playlists: Vec<Playlist> = self
            .playlists
            .iter()
            .filter(|entry| entry.guild_id == guild_id)
            .map(|entry| entry.value().clone())
            .collect();
        playlists.sort_by_key(|p| p.id);
        Ok(playlists)
    }

    async fn get_playlist(&self, guild_id: u64, id: i64) -> Result<Option<Playlist>, StoreError> {
        Ok(self
            .playlists
            .get(&id)
            .filter(|entry| entry.guild_id == guild_id)
            .map(|entry| entry.clone()))
    }

    async fn add_song_to_playlist(
        &self,
        guild_id: u64,
        id: i64,
        song: Song,
        max_songs: usize,
    ) -> Result<bool, StoreError> {
        match self.playlists.get_mut(&id) {
            Some(mut playlist)
                if playlist.guild_id == guild_id && playlist.songs.len() < max_songs =>
            {
                playlist.songs.push(song);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
