// Leveling: per-member XP and level progression.
//
// No Discord types in here. The service owns the add-XP algorithm and uses
// the MemberStore port for the actual reads and atomic writes.

use crate::core::store::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// XP needed per level. Level is always `xp / XP_PER_LEVEL`.
pub const XP_PER_LEVEL: u64 = 100;

/// Progression state of one user inside one guild.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub guild_id: u64,
    pub user_id: u64,
    pub xp: u64,
    pub level: u32,
    pub messages_count: u64,
    pub last_message_time: DateTime<Utc>,
    pub joined_at: DateTime<Utc>,
}

/// Result of an XP award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub new_level: u32,
    pub leveled_up: bool,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LevelingError {
    #[error("Invalid user or guild ID")]
    InvalidId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn get_member(&self, guild_id: u64, user_id: u64) -> Result<Option<Member>, StoreError>;

    /// Atomically add `amount` XP, bump the message count and stamp
    /// `last_message_time = now`, creating the member (level 0,
    /// `joined_at = now`) in the same operation when it does not exist.
    /// Returns the record as it is after the increment.
    async fn increment_xp(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Member, StoreError>;

    /// Raise the stored level to `level`. A lower value never replaces a
    /// higher one, so a late write from a concurrent award cannot pull the
    /// level below `xp / 100`. Returns whether the member exists.
    async fn set_level(&self, guild_id: u64, user_id: u64, level: u32) -> Result<bool, StoreError>;

    /// Members of a guild ordered by XP, highest first.
    async fn top_members(&self, guild_id: u64, limit: usize) -> Result<Vec<Member>, StoreError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct LevelingService<S: MemberStore> {
    store: Arc<S>,
}

impl<S: MemberStore> LevelingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn validate_ids(guild_id: u64, user_id: u64) -> Result<(), LevelingError> {
        if guild_id == 0 || user_id == 0 {
            Err(LevelingError::InvalidId)
        } else {
            Ok(())
        }
    }

    pub fn level_for_xp(xp: u64) -> u32 {
        (xp / XP_PER_LEVEL).min(u32::MAX as u64) as u32
    }

    /// Total XP at which `level` starts.
    pub fn xp_for_level(level: u32) -> u64 {
        level as u64 * XP_PER_LEVEL
    }

    /// Award `amount` XP for one message and report level transitions.
    ///
    /// Three steps, in this order:
    /// 1. read the level recorded before this call (0 for a new member),
    /// 2. atomic increment-and-fetch (creates the member when missing),
    /// 3. recompute the level and persist it only when it went up.
    ///
    /// Steps 1 and 2 are separate round-trips, so two concurrent messages from
    /// the same user can both observe the old level and both report the same
    /// level-up, or a level-up can be reported against a stale read. The
    /// stored level itself never drifts: `set_level` only ever raises it.
    pub async fn add_xp(
        &self,
        guild_id: u64,
        user_id: u64,
        amount: u64,
    ) -> Result<LevelProgress, LevelingError> {
        Self::validate_ids(guild_id, user_id)?;

        let old_level = self
            .store
            .get_member(guild_id, user_id)
            .await?
            .map(|member| member.level)
            .unwrap_or(0);

        let member = self
            .store
            .increment_xp(guild_id, user_id, amount, Utc::now())
            .await?;

        let new_level = Self::level_for_xp(member.xp);
        if new_level > old_level {
            self.store.set_level(guild_id, user_id, new_level).await?;
            tracing::debug!(guild_id, user_id, old_level, new_level, xp = member.xp, "Level up");
            return Ok(LevelProgress {
                new_level,
                leveled_up: true,
            });
        }

        Ok(LevelProgress {
            new_level,
            leveled_up: false,
        })
    }

    pub async fn get_member(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<Member>, LevelingError> {
        Self::validate_ids(guild_id, user_id)?;
        Ok(self.store.get_member(guild_id, user_id).await?)
    }

    pub async fn leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<Member>, LevelingError> {
        if guild_id == 0 {
            return Err(LevelingError::InvalidId);
        }
        Ok(self.store.top_members(guild_id, limit).await?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
