//! Storage traits for fireboard entries and runtime bot state.

use crate::DatabaseResult;
use async_trait::async_trait;
use hearth_core::{ChannelId, FireboardEntry, MessageId, NewFireboardEntry};
use serde::Serialize;

/// Result of [`EntryStore::create_or_get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    /// The stored entry: ours if `created`, otherwise the existing one.
    pub entry: FireboardEntry,
    /// Whether this call inserted the row.
    pub created: bool,
}

/// Columns an update may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryChanges {
    /// New source channel (backfill for legacy rows).
    pub source_channel_id: Option<ChannelId>,
    /// New mirror message after recreation.
    pub mirror_message_id: Option<MessageId>,
    /// Fresh qualifying count.
    pub valid_reaction_count: Option<i32>,
}

impl EntryChanges {
    /// Changes setting only the reaction count.
    pub fn count(count: i32) -> Self {
        Self {
            valid_reaction_count: Some(count),
            ..Self::default()
        }
    }

    /// Also set the source channel.
    pub fn with_source_channel(mut self, channel_id: ChannelId) -> Self {
        self.source_channel_id = Some(channel_id);
        self
    }

    /// Also set the mirror message.
    pub fn with_mirror(mut self, mirror_message_id: MessageId) -> Self {
        self.mirror_message_id = Some(mirror_message_id);
        self
    }

    /// Whether nothing would change.
    pub fn is_empty(&self) -> bool {
        self.source_channel_id.is_none()
            && self.mirror_message_id.is_none()
            && self.valid_reaction_count.is_none()
    }
}

/// Listing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryQuery {
    /// Order by creation time, newest first.
    pub newest_first: bool,
    /// Maximum number of rows.
    pub limit: Option<i64>,
}

impl EntryQuery {
    /// Every entry, oldest first.
    pub fn all() -> Self {
        Self {
            newest_first: false,
            limit: None,
        }
    }

    /// The `limit` most recent entries.
    pub fn recent(limit: i64) -> Self {
        Self {
            newest_first: true,
            limit: Some(limit),
        }
    }
}

/// Aggregate counts over the entry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EntryStats {
    /// Number of stored entries.
    pub total_entries: i64,
    /// Entries created in the last seven days.
    pub recent_entries: i64,
}

/// Window for [`EntryStats::recent_entries`].
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Persistence for fireboard entries.
///
/// The store never changes state on its own; the fireboard engine is its only
/// writer. Implementations must make [`create_or_get`](Self::create_or_get)
/// atomic per source message: concurrent calls for the same message leave
/// exactly one row, and every caller gets that row back.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Entry for a source message.
    async fn get(&self, source_message_id: MessageId) -> DatabaseResult<Option<FireboardEntry>>;

    /// Entry whose mirror is the given message.
    async fn find_by_mirror(
        &self,
        mirror_message_id: MessageId,
    ) -> DatabaseResult<Option<FireboardEntry>>;

    /// Insert an entry, or return the existing one for the same source message.
    async fn create_or_get(&self, entry: NewFireboardEntry) -> DatabaseResult<CreateOutcome>;

    /// Apply changes to an entry. Returns whether a row was affected.
    async fn update(
        &self,
        source_message_id: MessageId,
        changes: EntryChanges,
    ) -> DatabaseResult<bool>;

    /// Delete by stored handle. Deleting a missing entry returns `Ok(false)`.
    async fn delete(&self, entry: &FireboardEntry) -> DatabaseResult<bool>;

    /// List entries by creation time.
    async fn list(&self, query: EntryQuery) -> DatabaseResult<Vec<FireboardEntry>>;

    /// Total and recent entry counts.
    async fn stats(&self) -> DatabaseResult<EntryStats>;
}

/// Small key-value table for runtime state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a value.
    async fn get_state(&self, name: &str) -> DatabaseResult<Option<String>>;

    /// Insert or overwrite a value.
    async fn set_state(&self, name: &str, value: &str) -> DatabaseResult<()>;

    /// Remove a value. Returns whether it existed.
    async fn remove_state(&self, name: &str) -> DatabaseResult<bool>;
}
