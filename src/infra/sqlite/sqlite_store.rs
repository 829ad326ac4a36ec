// SQLite implementation of every store port.
//
// Unique keys are primary keys, so duplicate inserts are reported through
// `rows_affected` instead of errors. Counters are bumped with single
// statements using RETURNING, never read-modify-write from Rust.

use crate::core::custom_commands::{normalize_name, CommandStore, CustomCommand};
use crate::core::guilds::{Guild, GuildSettings, GuildStore};
use crate::core::leveling::{Member, MemberStore};
use crate::core::playlists::{Playlist, PlaylistStore, Song};
use crate::core::store::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const MEMBER_COLUMNS: &str =
    "guild_id, user_id, xp, level, messages_count, last_message_time, joined_at";
const COMMAND_COLUMNS: &str = "guild_id, name, response, created_by, uses, created_at";

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) the database, check the connection answers
    /// and bring the schema up to date.
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> anyhow::Result<Self> {
        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        info!("Connected to SQLite at {}", conn_str);

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guilds (
                guild_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                prefix TEXT NOT NULL DEFAULT '!',
                welcome_channel_id INTEGER,
                welcome_message TEXT,
                log_channel_id INTEGER,
                music_channel_id INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS members (
                guild_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 0,
                messages_count INTEGER NOT NULL DEFAULT 0,
                last_message_time TEXT NOT NULL,
                joined_at TEXT NOT NULL,
                PRIMARY KEY (guild_id, user_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_members_guild_xp ON members (guild_id, xp DESC);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS custom_commands (
                guild_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                response TEXT NOT NULL,
                created_by INTEGER NOT NULL,
                uses INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                PRIMARY KEY (guild_id, name)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS playlists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guild_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                created_by INTEGER NOT NULL,
                songs TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn guild_from_row(row: &SqliteRow) -> Result<Guild, sqlx::Error> {
    Ok(Guild {
        guild_id: row.try_get::<i64, _>("guild_id")? as u64,
        name: row.try_get("name")?,
        prefix: row.try_get("prefix")?,
        welcome_channel_id: row
            .try_get::<Option<i64>, _>("welcome_channel_id")?
            .map(|id| id as u64),
        welcome_message: row.try_get("welcome_message")?,
        log_channel_id: row
            .try_get::<Option<i64>, _>("log_channel_id")?
            .map(|id| id as u64),
        music_channel_id: row
            .try_get::<Option<i64>, _>("music_channel_id")?
            .map(|id| id as u64),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn member_from_row(row: &SqliteRow) -> Result<Member, sqlx::Error> {
    Ok(Member {
        guild_id: row.try_get::<i64, _>("guild_id")? as u64,
        user_id: row.try_get::<i64, _>("user_id")? as u64,
        xp: row.try_get::<i64, _>("xp")? as u64,
        level: row.try_get::<i64, _>("level")? as u32,
        messages_count: row.try_get::<i64, _>("messages_count")? as u64,
        last_message_time: row.try_get("last_message_time")?,
        joined_at: row.try_get("joined_at")?,
    })
}

fn command_from_row(row: &SqliteRow) -> Result<CustomCommand, sqlx::Error> {
    Ok(CustomCommand {
        guild_id: row.try_get::<i64, _>("guild_id")? as u64,
        name: row.try_get("name")?,
        response: row.try_get("response")?,
        created_by: row.try_get::<i64, _>("created_by")? as u64,
        uses: row.try_get::<i64, _>("uses")? as u64,
        created_at: row.try_get("created_at")?,
    })
}

fn playlist_from_row(row: &SqliteRow) -> Result<Playlist, StoreError> {
    let songs: String = row.try_get("songs").map_err(StoreError::backend)?;
    Ok(Playlist {
        id: row.try_get("id").map_err(StoreError::backend)?,
        guild_id: row.try_get::<i64, _>("guild_id").map_err(StoreError::backend)? as u64,
        name: row.try_get("name").map_err(StoreError::backend)?,
        created_by: row
            .try_get::<i64, _>("created_by")
            .map_err(StoreError::backend)? as u64,
        songs: serde_json::from_str::<Vec<Song>>(&songs)?,
        created_at: row.try_get("created_at").map_err(StoreError::backend)?,
    })
}

#[async_trait]
impl GuildStore for SqliteStore {
    async fn get_guild(&self, guild_id: u64) -> Result<Option<Guild>, StoreError> {
        let row = sqlx::query("SELECT * FROM guilds WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        row.as_ref()
            .map(guild_from_row)
            .transpose()
            .map_err(StoreError::backend)
    }

    async fn create_guild(&self, guild: Guild) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO guilds (guild_id, name, prefix, welcome_channel_id, welcome_message,
                                log_channel_id, music_channel_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(guild_id) DO NOTHING
            "#,
        )
        .bind(guild.guild_id as i64)
        .bind(&guild.name)
        .bind(&guild.prefix)
        .bind(guild.welcome_channel_id.map(|id| id as i64))
        .bind(&guild.welcome_message)
        .bind(guild.log_channel_id.map(|id| id as i64))
        .bind(guild.music_channel_id.map(|id| id as i64))
        .bind(guild.created_at)
        .bind(guild.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_guild(
        &self,
        guild_id: u64,
        settings: &GuildSettings,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE guilds SET updated_at = ");
        query.push_bind(now);

        if let Some(name) = &settings.name {
            query.push(", name = ").push_bind(name.clone());
        }
        if let Some(prefix) = &settings.prefix {
            query.push(", prefix = ").push_bind(prefix.clone());
        }
        if let Some(channel) = settings.welcome_channel_id {
            query
                .push(", welcome_channel_id = ")
                .push_bind(channel.map(|id| id as i64));
        }
        if let Some(message) = &settings.welcome_message {
            query.push(", welcome_message = ").push_bind(message.clone());
        }
        if let Some(channel) = settings.log_channel_id {
            query
                .push(", log_channel_id = ")
                .push_bind(channel.map(|id| id as i64));
        }
        if let Some(channel) = settings.music_channel_id {
            query
                .push(", music_channel_id = ")
                .push_bind(channel.map(|id| id as i64));
        }

        query.push(" WHERE guild_id = ").push_bind(guild_id as i64);

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MemberStore for SqliteStore {
    async fn get_member(&self, guild_id: u64, user_id: u64) -> Result<Option<Member>, StoreError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE guild_id = ? AND user_id = ?");
        let row = sqlx::query(&sql)
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        row.as_ref()
            .map(member_from_row)
            .transpose()
            .map_err(StoreError::backend)
    }

    async fn increment_xp(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Member, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO members (guild_id, user_id, xp, level, messages_count, last_message_time, joined_at)
            VALUES (?, ?, ?, 0, 1, ?, ?)
            ON CONFLICT(guild_id, user_id) DO UPDATE SET
                xp = xp + excluded.xp,
                messages_count = messages_count + 1,
                last_message_time = excluded.last_message_time
            RETURNING {MEMBER_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .bind(amount as i64)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        member_from_row(&row).map_err(StoreError::backend)
    }

    async fn set_level(&self, guild_id: u64, user_id: u64, level: u32) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE members SET level = MAX(level, ?) WHERE guild_id = ? AND user_id = ?")
            .bind(level as i64)
            .bind(guild_id as i64)
            .bind(user_id as i64)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn top_members(&self, guild_id: u64, limit: usize) -> Result<Vec<Member>, StoreError> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE guild_id = ? ORDER BY xp DESC, user_id ASC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(guild_id as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        rows.iter()
            .map(member_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::backend)
    }
}

#[async_trait]
impl CommandStore for SqliteStore {
    async fn get_custom_command(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<CustomCommand>, StoreError> {
        let sql = format!("SELECT {COMMAND_COLUMNS} FROM custom_commands WHERE guild_id = ? AND name = ?");
        let row = sqlx::query(&sql)
            .bind(guild_id as i64)
            .bind(normalize_name(name))
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        row.as_ref()
            .map(command_from_row)
            .transpose()
            .map_err(StoreError::backend)
    }

    async fn create_custom_command(&self, command: CustomCommand) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO custom_commands (guild_id, name, response, created_by, uses, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(guild_id, name) DO NOTHING
            "#,
        )
        .bind(command.guild_id as i64)
        .bind(normalize_name(&command.name))
        .bind(&command.response)
        .bind(command.created_by as i64)
        .bind(command.uses as i64)
        .bind(command.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn use_custom_command(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<CustomCommand>, StoreError> {
        let sql = format!(
            "UPDATE custom_commands SET uses = uses + 1 WHERE guild_id = ? AND name = ? RETURNING {COMMAND_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(guild_id as i64)
            .bind(normalize_name(name))
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        row.as_ref()
            .map(command_from_row)
            .transpose()
            .map_err(StoreError::backend)
    }

    async fn list_custom_commands(&self, guild_id: u64) -> Result<Vec<CustomCommand>, StoreError> {
        let sql = format!("SELECT {COMMAND_COLUMNS} FROM custom_commands WHERE guild_id = ? ORDER BY name");
        let rows = sqlx::query(&sql)
            .bind(guild_id as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        rows.iter()
            .map(command_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::backend)
    }

    async fn delete_custom_command(&self, guild_id: u64, name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM custom_commands WHERE guild_id = ? AND name = ?")
            .bind(guild_id as i64)
            .bind(normalize_name(name))
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PlaylistStore for SqliteStore {
    async fn create_playlist(
        &self,
        guild_id: u64,
        name: &str,
        created_by: u64,
    ) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO playlists (guild_id, name, created_by, songs, created_at)
            VALUES (?, ?, ?, '[]', ?)
            RETURNING id
            "#,
        )
        .bind(guild_id as i64)
        .bind(name)
        .bind(created_by as i64)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(|row| row.try_get::<i64, _>("id"))
            .transpose()
            .map_err(StoreError::backend)
    }

    async fn get_playlists(&self, guild_id: u64) -> Result<Vec<Playlist>, StoreError> {
        let rows = sqlx::query("SELECT * FROM playlists WHERE guild_id = ? ORDER BY id")
            .bind(guild_id as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        rows.iter().map(playlist_from_row).collect()
    }

    async fn get_playlist(&self, guild_id: u64, id: i64) -> Result<Option<Playlist>, StoreError> {
        let row = sqlx::query("SELECT * FROM playlists WHERE id = ? AND guild_id = ?")
            .bind(id)
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        row.as_ref().map(playlist_from_row).transpose()
    }

    async fn add_song_to_playlist(
        &self,
        guild_id: u64,
        id: i64,
        song: Song,
        max_songs: usize,
    ) -> Result<bool, StoreError> {
        let song = serde_json::to_string(&song)?;

        // Appending and checking the size inside one statement keeps
        // concurrent adds from overwriting songs or overfilling the list.
        let result = sqlx::query(
            "UPDATE playlists SET songs = json_insert(songs, '$[#]', json(?)) \
             WHERE id = ? AND guild_id = ? AND json_array_length(songs) < ?",
        )
        .bind(song)
        .bind(id)
        .bind(guild_id as i64)
        .bind(max_songs as i64)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::custom_commands::CustomCommandService;
    use crate::core::leveling::LevelingService;
    use crate::core::pipeline::{InboundMessage, MessagePipeline, PipelineSettings};
    use crate::core::playlists::{PlaylistError, PlaylistService, MAX_PLAYLIST_SIZE};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open_store() -> (SqliteStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.db");
        let store = SqliteStore::connect(path.to_str().unwrap(), Duration::from_secs(5))
            .await
            .unwrap();
        (store, dir)
    }

    fn command(guild_id: u64, name: &str, response: &str) -> CustomCommand {
        CustomCommand {
            guild_id,
            name: name.to_string(),
            response: response.to_string(),
            created_by: 42,
            uses: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn guild_create_is_idempotent_and_updates_are_partial() {
        let (store, _dir) = open_store().await;
        let now = Utc::now();

        assert!(store.create_guild(Guild::new(1, "Home", now)).await.unwrap());
        assert!(!store.create_guild(Guild::new(1, "Other", now)).await.unwrap());

        let settings = GuildSettings::default()
            .prefix("?")
            .welcome_channel(Some(55));
        assert!(store.update_guild(1, &settings, Utc::now()).await.unwrap());
        assert!(!store.update_guild(2, &settings, Utc::now()).await.unwrap());

        let guild = store.get_guild(1).await.unwrap().unwrap();
        assert_eq!(guild.name, "Home");
        assert_eq!(guild.prefix, "?");
        assert_eq!(guild.welcome_channel_id, Some(55));
        assert_eq!(guild.log_channel_id, None);

        let cleared = GuildSettings::default().welcome_channel(None);
        store.update_guild(1, &cleared, Utc::now()).await.unwrap();
        let guild = store.get_guild(1).await.unwrap().unwrap();
        assert_eq!(guild.welcome_channel_id, None);
        assert_eq!(guild.prefix, "?");
    }

    #[tokio::test]
    async fn increment_xp_upserts_and_returns_new_totals() {
        let (store, _dir) = open_store().await;
        let now = Utc::now();

        let first = store.increment_xp(1, 2, 60, now).await.unwrap();
        assert_eq!((first.xp, first.level, first.messages_count), (60, 0, 1));

        let second = store.increment_xp(1, 2, 50, Utc::now()).await.unwrap();
        assert_eq!((second.xp, second.messages_count), (110, 2));
        assert_eq!(second.joined_at, first.joined_at);

        assert!(store.set_level(1, 2, 1).await.unwrap());
        assert!(!store.set_level(1, 3, 1).await.unwrap());
        assert_eq!(store.get_member(1, 2).await.unwrap().unwrap().level, 1);
    }

    #[tokio::test]
    async fn add_xp_runs_on_sqlite() {
        let (store, _dir) = open_store().await;
        let store = Arc::new(store);
        let service = LevelingService::new(Arc::clone(&store));

        let first = service.add_xp(1, 2, 1).await.unwrap();
        assert_eq!((first.new_level, first.leveled_up), (0, false));
        let member = store.get_member(1, 2).await.unwrap().unwrap();
        assert_eq!((member.xp, member.level, member.messages_count), (1, 0, 1));

        service.add_xp(1, 2, 98).await.unwrap();
        let crossing = service.add_xp(1, 2, 1).await.unwrap();
        assert_eq!((crossing.new_level, crossing.leveled_up), (1, true));
        let member = store.get_member(1, 2).await.unwrap().unwrap();
        assert_eq!((member.xp, member.level), (100, 1));

        service.add_xp(1, 3, 95).await.unwrap();
        let up = service.add_xp(1, 3, 10).await.unwrap();
        assert_eq!((up.new_level, up.leveled_up), (1, true));
        let same = service.add_xp(1, 3, 1).await.unwrap();
        assert_eq!((same.new_level, same.leveled_up), (1, false));
        assert_eq!(store.get_member(1, 3).await.unwrap().unwrap().xp, 106);
    }

    #[tokio::test]
    async fn custom_command_service_runs_on_sqlite() {
        let (store, _dir) = open_store().await;
        let service = CustomCommandService::new(Arc::new(store));

        assert!(service.create(1, "Rules", "Read #rules", 42).await.unwrap());
        assert!(!service.create(1, "rules", "Something else", 43).await.unwrap());

        let found = service.get(1, "RULES").await.unwrap().unwrap();
        assert_eq!(found.response, "Read #rules");
        assert_eq!(found.created_by, 42);
    }

    #[tokio::test]
    async fn pipeline_runs_on_sqlite() {
        let (store, _dir) = open_store().await;
        let store = Arc::new(store);
        let leveling = Arc::new(LevelingService::new(Arc::clone(&store)));
        let commands = Arc::new(CustomCommandService::new(Arc::clone(&store)));
        commands.create(1, "rules", "Read #rules", 42).await.unwrap();
        let pipeline = MessagePipeline::new(leveling, commands, PipelineSettings::default());

        let message = InboundMessage {
            author_id: 2,
            author_is_bot: false,
            guild_id: Some(1),
            content: "!rules".to_string(),
        };
        let outcome = pipeline.process(&message).await;

        assert_eq!(outcome.command_response.as_deref(), Some("Read #rules"));
        assert_eq!(outcome.level_up, None);
        assert_eq!(store.get_member(1, 2).await.unwrap().unwrap().xp, 1);
        assert_eq!(store.get_custom_command(1, "rules").await.unwrap().unwrap().uses, 1);
    }

    #[tokio::test]
    async fn set_level_never_lowers() {
        let (store, _dir) = open_store().await;
        store.increment_xp(1, 2, 205, Utc::now()).await.unwrap();
        assert!(store.set_level(1, 2, 2).await.unwrap());
        assert!(store.set_level(1, 2, 1).await.unwrap());
        assert_eq!(store.get_member(1, 2).await.unwrap().unwrap().level, 2);
    }

    #[tokio::test]
    async fn concurrent_increments_all_land() {
        let (store, _dir) = open_store().await;
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment_xp(1, 2, 5, Utc::now()).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let member = store.get_member(1, 2).await.unwrap().unwrap();
        assert_eq!(member.xp, 100);
        assert_eq!(member.messages_count, 20);
    }

    #[tokio::test]
    async fn top_members_orders_by_xp() {
        let (store, _dir) = open_store().await;
        store.increment_xp(1, 10, 5, Utc::now()).await.unwrap();
        store.increment_xp(1, 11, 50, Utc::now()).await.unwrap();
        store.increment_xp(1, 12, 20, Utc::now()).await.unwrap();
        store.increment_xp(2, 13, 500, Utc::now()).await.unwrap();

        let top: Vec<u64> = store
            .top_members(1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.user_id)
            .collect();
        assert_eq!(top, vec![11, 12]);
    }

    #[tokio::test]
    async fn custom_commands_are_case_insensitive_and_unique() {
        let (store, _dir) = open_store().await;

        assert!(store.create_custom_command(command(1, "Rules", "Be nice")).await.unwrap());
        assert!(!store.create_custom_command(command(1, "rules", "Other")).await.unwrap());

        let found = store.get_custom_command(1, "RULES").await.unwrap().unwrap();
        assert_eq!(found.name, "rules");
        assert_eq!(found.response, "Be nice");
        assert!(store.get_custom_command(2, "rules").await.unwrap().is_none());

        let used = store.use_custom_command(1, "Rules").await.unwrap().unwrap();
        assert_eq!(used.uses, 1);
        assert!(store.use_custom_command(1, "missing").await.unwrap().is_none());

        assert!(store.delete_custom_command(1, "RULES").await.unwrap());
        assert!(store.list_custom_commands(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn playlist_songs_round_trip_through_json_column() {
        let (store, _dir) = open_store().await;
        let id = store.create_playlist(1, "Focus", 7).await.unwrap().unwrap();

        let song = Song {
            title: "Track".to_string(),
            url: "https://example.com/track".to_string(),
            added_by: 7,
            added_at: Utc::now(),
        };
        assert!(store.add_song_to_playlist(1, id, song.clone(), 50).await.unwrap());
        assert!(!store.add_song_to_playlist(2, id, song.clone(), 50).await.unwrap());

        let playlist = store.get_playlist(1, id).await.unwrap().unwrap();
        assert_eq!(playlist.songs, vec![song]);
        assert!(store.get_playlist(2, id).await.unwrap().is_none());
        assert_eq!(store.get_playlists(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn append_refuses_a_full_playlist() {
        let (store, _dir) = open_store().await;
        let id = store.create_playlist(1, "Short", 7).await.unwrap().unwrap();
        let song = Song {
            title: "Track".to_string(),
            url: "https://example.com/track".to_string(),
            added_by: 7,
            added_at: Utc::now(),
        };

        assert!(store.add_song_to_playlist(1, id, song.clone(), 2).await.unwrap());
        assert!(store.add_song_to_playlist(1, id, song.clone(), 2).await.unwrap());
        assert!(!store.add_song_to_playlist(1, id, song, 2).await.unwrap());
        assert_eq!(store.get_playlist(1, id).await.unwrap().unwrap().songs.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_adds_never_overfill_a_playlist() {
        let (store, _dir) = open_store().await;
        let service = Arc::new(PlaylistService::new(Arc::new(store)));
        let id = service.create(1, "Almost full", 7).await.unwrap();
        for i in 0..MAX_PLAYLIST_SIZE - 1 {
            service
                .add_song(1, id, &format!("Song {i}"), "https://x", 7)
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..5 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .add_song(1, id, &format!("Late {i}"), "https://x", 8)
                    .await
            }));
        }
        let mut added = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => added += 1,
                Err(err) => assert!(matches!(err, PlaylistError::Full)),
            }
        }

        assert_eq!(added, 1);
        let playlist = service.get(1, id).await.unwrap();
        assert_eq!(playlist.songs.len(), MAX_PLAYLIST_SIZE);
    }
}
