// Per-message side effects: leveling and custom command dispatch.
//
// The pipeline works on a plain `InboundMessage` and returns what should be
// sent back. The Discord layer does the translation both ways.

use super::command_cache::CommandCache;
use crate::core::custom_commands::{normalize_name, CommandStore, CustomCommandService};
use crate::core::leveling::{LevelingService, MemberStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// The parts of a chat message the pipeline cares about.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub author_id: u64,
    pub author_is_bot: bool,
    pub guild_id: Option<u64>,
    pub content: String,
}

/// Replies produced for one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOutcome {
    /// Set when the author just reached a new level.
    pub level_up: Option<u32>,
    /// Canned response of the custom command the message invoked.
    pub command_response: Option<String>,
}

impl MessageOutcome {
    pub fn is_empty(&self) -> bool {
        self.level_up.is_none() && self.command_response.is_none()
    }
}

/// Tunables, usually filled from the bot config.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub prefix: String,
    pub xp_per_message: u64,
    pub store_timeout: Duration,
    pub cache_ttl: Option<Duration>,
    pub cache_max_per_guild: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            prefix: crate::core::guilds::DEFAULT_PREFIX.to_string(),
            xp_per_message: 1,
            store_timeout: Duration::from_secs(5),
            cache_ttl: None,
            cache_max_per_guild: 256,
        }
    }
}

pub struct MessagePipeline<S: MemberStore + CommandStore> {
    leveling: Arc<LevelingService<S>>,
    commands: Arc<CustomCommandService<S>>,
    cache: CommandCache,
    settings: PipelineSettings,
}

impl<S: MemberStore + CommandStore> MessagePipeline<S> {
    pub fn new(
        leveling: Arc<LevelingService<S>>,
        commands: Arc<CustomCommandService<S>>,
        settings: PipelineSettings,
    ) -> Self {
        let cache = CommandCache::new(settings.cache_ttl, settings.cache_max_per_guild);
        Self {
            leveling,
            commands,
            cache,
            settings,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.settings.prefix
    }

    /// Drop a cached command, e.g. after it was removed from the store.
    pub fn forget_command(&self, guild_id: u64, name: &str) {
        self.cache.forget(guild_id, &normalize_name(name));
    }

    /// Run the leveling and custom command steps for one message.
    ///
    /// Store failures and timeouts are logged and only skip the step they
    /// happened in; they never surface to the caller.
    pub async fn process(&self, message: &InboundMessage) -> MessageOutcome {
        let mut outcome = MessageOutcome::default();

        if message.author_is_bot {
            return outcome;
        }
        let Some(guild_id) = message.guild_id else {
            return outcome;
        };
        let user_id = message.author_id;

        let progress = self
            .bounded(
                "add_xp",
                self.leveling
                    .add_xp(guild_id, user_id, self.settings.xp_per_message),
            )
            .await;
        if let Some(progress) = progress {
            if progress.leveled_up {
                tracing::info!(guild_id, user_id, level = progress.new_level, "Member leveled up");
                outcome.level_up = Some(progress.new_level);
            }
        }

        if let Some(name) = command_name(&message.content, &self.settings.prefix) {
            if let Some(response) = self.resolve_command(guild_id, &name).await {
                tracing::debug!(guild_id, command = %name, "Custom command dispatched");
                outcome.command_response = Some(response);
                self.bounded("use_custom_command", self.commands.record_use(guild_id, &name))
                    .await;
            }
        }

        outcome
    }

    /// Cache first, store on miss; store hits are cached before returning.
    async fn resolve_command(&self, guild_id: u64, name: &str) -> Option<String> {
        if let Some(command) = self.cache.get(guild_id, name) {
            return Some(command.response);
        }

        let command = self
            .bounded("get_custom_command", self.commands.get(guild_id, name))
            .await??;
        let response = command.response.clone();
        self.cache.insert(guild_id, command);
        Some(response)
    }

    /// Await a store operation under the configured timeout. Errors and
    /// timeouts are logged and turned into `None`.
    async fn bounded<T, E, F>(&self, operation: &'static str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.settings.store_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                tracing::warn!(operation, error = %err, "Store operation failed, skipping");
                None
            }
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.settings.store_timeout.as_millis() as u64,
                    "Store operation timed out, skipping"
                );
                None
            }
        }
    }
}

/// Extract the custom command name from a message: the first
/// whitespace-delimited token, prefix stripped, lower-cased.
pub fn command_name(content: &str, prefix: &str) -> Option<String> {
    if prefix.is_empty() || !content.starts_with(prefix) {
        return None;
    }
    let token = content.split_whitespace().next()?;
    let name = token.strip_prefix(prefix)?.to_lowercase();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::custom_commands::CustomCommand;
    use crate::core::leveling::Member;
    use crate::core::store::StoreError;
    use crate::infra::memory::InMemoryStore;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps the in-memory store, counting command lookups and optionally
    /// failing or stalling member writes.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryStore,
        command_lookups: AtomicUsize,
        fail_members: bool,
        stall_members: bool,
    }

    impl CountingStore {
        fn lookups(&self) -> usize {
            self.command_lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MemberStore for CountingStore {
        async fn get_member(&self, guild_id: u64, user_id: u64) -> Result<Option<Member>, StoreError> {
            if self.fail_members {
                return Err(StoreError::backend("members offline"));
            }
            if self.stall_members {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            self.inner.get_member(guild_id, user_id).await
        }

        async fn increment_xp(
            &self,
            guild_id: u64,
            user_id: u64,
            amount: u64,
            now: DateTime<Utc>,
        ) -> Result<Member, StoreError> {
            self.inner.increment_xp(guild_id, user_id, amount, now).await
        }

        async fn set_level(&self, guild_id: u64, user_id: u64, level: u32) -> Result<bool, StoreError> {
            self.inner.set_level(guild_id, user_id, level).await
        }

        async fn top_members(&self, guild_id: u64, limit: usize) -> Result<Vec<Member>, StoreError> {
            self.inner.top_members(guild_id, limit).await
        }
    }

    #[async_trait]
    impl CommandStore for CountingStore {
        async fn get_custom_command(
            &self,
            guild_id: u64,
            name: &str,
        ) -> Result<Option<CustomCommand>, StoreError> {
            self.command_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.get_custom_command(guild_id, name).await
        }

        async fn create_custom_command(&self, command: CustomCommand) -> Result<bool, StoreError> {
            self.inner.create_custom_command(command).await
        }

        async fn use_custom_command(
            &self,
            guild_id: u64,
            name: &str,
        ) -> Result<Option<CustomCommand>, StoreError> {
            self.inner.use_custom_command(guild_id, name).await
        }

        async fn list_custom_commands(&self, guild_id: u64) -> Result<Vec<CustomCommand>, StoreError> {
            self.inner.list_custom_commands(guild_id).await
        }

        async fn delete_custom_command(&self, guild_id: u64, name: &str) -> Result<bool, StoreError> {
            self.inner.delete_custom_command(guild_id, name).await
        }
    }

    const GUILD: u64 = 500;
    const USER: u64 = 42;

    fn build(store: CountingStore, settings: PipelineSettings) -> (Arc<CountingStore>, MessagePipeline<CountingStore>) {
        let store = Arc::new(store);
        let pipeline = MessagePipeline::new(
            Arc::new(LevelingService::new(Arc::clone(&store))),
            Arc::new(CustomCommandService::new(Arc::clone(&store))),
            settings,
        );
        (store, pipeline)
    }

    fn message(content: &str) -> InboundMessage {
        InboundMessage {
            author_id: USER,
            author_is_bot: false,
            guild_id: Some(GUILD),
            content: content.to_string(),
        }
    }

    async fn seed_rules(store: &CountingStore) {
        let created = store
            .inner
            .create_custom_command(CustomCommand {
                guild_id: GUILD,
                name: "rules".to_string(),
                response: "Read #rules".to_string(),
                created_by: 1,
                uses: 0,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(created);
    }

    #[test]
    fn command_name_extraction() {
        assert_eq!(command_name("!Rules please", "!"), Some("rules".to_string()));
        assert_eq!(command_name("!rules", "!"), Some("rules".to_string()));
        assert_eq!(command_name("rules", "!"), None);
        assert_eq!(command_name("!", "!"), None);
        assert_eq!(command_name("! rules", "!"), None);
        assert_eq!(command_name("?faq", "?"), Some("faq".to_string()));
    }

    #[tokio::test]
    async fn first_message_creates_member_without_level_up() {
        let (store, pipeline) = build(CountingStore::default(), PipelineSettings::default());

        let outcome = pipeline.process(&message("hello there")).await;
        assert!(outcome.is_empty());

        let member = store.inner.get_member(GUILD, USER).await.unwrap().unwrap();
        assert_eq!((member.xp, member.level), (1, 0));
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn reaching_100_xp_reports_level_one() {
        let (store, pipeline) = build(CountingStore::default(), PipelineSettings::default());
        store.inner.increment_xp(GUILD, USER, 99, Utc::now()).await.unwrap();

        let outcome = pipeline.process(&message("one more")).await;
        assert_eq!(outcome.level_up, Some(1));

        let member = store.inner.get_member(GUILD, USER).await.unwrap().unwrap();
        assert_eq!((member.xp, member.level), (100, 1));
    }

    #[tokio::test]
    async fn custom_command_dispatches_and_still_awards_xp() {
        let (store, pipeline) = build(CountingStore::default(), PipelineSettings::default());
        seed_rules(&store).await;

        let outcome = pipeline.process(&message("!rules")).await;
        assert_eq!(outcome.command_response.as_deref(), Some("Read #rules"));
        assert_eq!(outcome.level_up, None);

        let member = store.inner.get_member(GUILD, USER).await.unwrap().unwrap();
        assert_eq!(member.xp, 1);

        let command = store.inner.get_custom_command(GUILD, "rules").await.unwrap().unwrap();
        assert_eq!(command.uses, 1);
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let (store, pipeline) = build(CountingStore::default(), PipelineSettings::default());
        seed_rules(&store).await;

        pipeline.process(&message("!rules")).await;
        assert_eq!(store.lookups(), 1);

        let outcome = pipeline.process(&message("!RULES now")).await;
        assert_eq!(outcome.command_response.as_deref(), Some("Read #rules"));
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn misses_are_not_cached() {
        let (store, pipeline) = build(CountingStore::default(), PipelineSettings::default());

        assert!(pipeline.process(&message("!nope")).await.command_response.is_none());
        assert!(pipeline.process(&message("!nope")).await.command_response.is_none());
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn expired_entries_go_back_to_the_store() {
        let settings = PipelineSettings {
            cache_ttl: Some(Duration::ZERO),
            ..PipelineSettings::default()
        };
        let (store, pipeline) = build(CountingStore::default(), settings);
        seed_rules(&store).await;

        pipeline.process(&message("!rules")).await;
        pipeline.process(&message("!rules")).await;
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn forgotten_command_is_looked_up_again() {
        let (store, pipeline) = build(CountingStore::default(), PipelineSettings::default());
        seed_rules(&store).await;

        pipeline.process(&message("!rules")).await;
        pipeline.forget_command(GUILD, "Rules");
        pipeline.process(&message("!rules")).await;
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn bots_and_direct_messages_are_ignored() {
        let (store, pipeline) = build(CountingStore::default(), PipelineSettings::default());
        seed_rules(&store).await;

        let mut from_bot = message("!rules");
        from_bot.author_is_bot = true;
        assert!(pipeline.process(&from_bot).await.is_empty());

        let mut direct = message("!rules");
        direct.guild_id = None;
        assert!(pipeline.process(&direct).await.is_empty());

        assert!(store.inner.get_member(GUILD, USER).await.unwrap().is_none());
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn member_store_failure_skips_only_leveling() {
        let store = CountingStore {
            fail_members: true,
            ..CountingStore::default()
        };
        let (store, pipeline) = build(store, PipelineSettings::default());
        seed_rules(&store).await;

        let outcome = pipeline.process(&message("!rules")).await;
        assert_eq!(outcome.level_up, None);
        assert_eq!(outcome.command_response.as_deref(), Some("Read #rules"));
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let store = CountingStore {
            stall_members: true,
            ..CountingStore::default()
        };
        let settings = PipelineSettings {
            store_timeout: Duration::from_millis(20),
            ..PipelineSettings::default()
        };
        let (store, pipeline) = build(store, settings);

        let outcome = pipeline.process(&message("hello")).await;
        assert!(outcome.is_empty());
        assert!(store.inner.get_member(GUILD, USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn custom_prefix_is_honoured() {
        let settings = PipelineSettings {
            prefix: "?".to_string(),
            ..PipelineSettings::default()
        };
        let (store, pipeline) = build(CountingStore::default(), settings);
        seed_rules(&store).await;

        assert!(pipeline.process(&message("!rules")).await.command_response.is_none());
        assert_eq!(
            pipeline.process(&message("?rules")).await.command_response.as_deref(),
            Some("Read #rules")
        );
    }
}
