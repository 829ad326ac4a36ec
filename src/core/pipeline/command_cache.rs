// Per-process read cache for custom command lookups.
//
// Layout: guild id -> command name -> cached record. The store stays the
// source of truth; a cached entry can be stale. Invalidation policy:
// - entries expire after `ttl` when one is configured (none by default, so an
//   entry lives until restart),
// - each guild holds at most `max_per_guild` entries, the oldest is evicted,
// - `forget` drops one entry explicitly (used when a command is removed).
// Misses are never cached.

use crate::core::custom_commands::CustomCommand;
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedCommand {
    command: CustomCommand,
    cached_at: Instant,
}

pub struct CommandCache {
    entries: DashMap<u64, HashMap<String, CachedCommand>>,
    ttl: Option<Duration>,
    max_per_guild: usize,
}

impl CommandCache {
    pub fn new(ttl: Option<Duration>, max_per_guild: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_per_guild: max_per_guild.max(1),
        }
    }

    fn is_fresh(&self, entry: &CachedCommand) -> bool {
        match self.ttl {
            Some(ttl) => entry.cached_at.elapsed() < ttl,
            None => true,
        }
    }

    pub fn get(&self, guild_id: u64, name: &str) -> Option<CustomCommand> {
        let guild = self.entries.get(&guild_id)?;
        guild
            .get(name)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.command.clone())
    }

    pub fn insert(&self, guild_id: u64, command: CustomCommand) {
        let mut guild = self.entries.entry(guild_id).or_default();

        if !guild.contains_key(&command.name) && guild.len() >= self.max_per_guild {
            let oldest = guild
                .iter()
                .min_by_key(|(_, entry)| entry.cached_at)
                .map(|(name, _)| name.clone());
            if let Some(oldest) = oldest {
                guild.remove(&oldest);
            }
        }

        guild.insert(
            command.name.clone(),
            CachedCommand {
                command,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn forget(&self, guild_id: u64, name: &str) {
        if let Some(mut guild) = self.entries.get_mut(&guild_id) {
            guild.remove(name);
        }
    }

    #[cfg(test)]
    pub fn len(&self, guild_id: u64) -> usize {
        self.entries.get(&guild_id).map(|g| g.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn command(name: &str) -> CustomCommand {
        CustomCommand {
            guild_id: 1,
            name: name.to_string(),
            response: format!("{name} response"),
            created_by: 9,
            uses: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_then_get() {
        let cache = CommandCache::new(None, 16);
        assert!(cache.get(1, "rules").is_none());

        cache.insert(1, command("rules"));
        assert_eq!(cache.get(1, "rules").unwrap().response, "rules response");
        assert!(cache.get(2, "rules").is_none());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = CommandCache::new(Some(Duration::ZERO), 16);
        cache.insert(1, command("rules"));
        assert!(cache.get(1, "rules").is_none());
    }

    #[test]
    fn full_guild_evicts_oldest() {
        let cache = CommandCache::new(None, 2);
        cache.insert(1, command("a"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(1, command("b"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert(1, command("c"));

        assert_eq!(cache.len(1), 2);
        assert!(cache.get(1, "a").is_none());
        assert!(cache.get(1, "b").is_some());
        assert!(cache.get(1, "c").is_some());
    }

    #[test]
    fn forget_drops_one_entry() {
        let cache = CommandCache::new(None, 16);
        cache.insert(1, command("a"));
        cache.insert(1, command("b"));

        cache.forget(1, "a");
        assert!(cache.get(1, "a").is_none());
        assert!(cache.get(1, "b").is_some());
    }
}
