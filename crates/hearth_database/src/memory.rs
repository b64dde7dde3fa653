//! In-memory implementation of the entry and state stores.
//!
//! Backs the engine and role-mapper test suites. Every operation holds a
//! single lock, which makes create-or-get atomic and enforces the same
//! uniqueness rules as the PostgreSQL constraints.

use crate::{
    CreateOutcome, DatabaseResult, EntryChanges, EntryQuery, EntryStats, EntryStore,
    RECENT_WINDOW_DAYS, StateStore,
};
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta, Utc};
use hearth_core::{FireboardEntry, MessageId, NewFireboardEntry};
use hearth_error::{DatabaseError, DatabaseErrorKind};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    entries: BTreeMap<MessageId, FireboardEntry>,
    state: HashMap<String, String>,
}

/// Process-local store.
#[derive(Debug)]
pub struct MemoryEntryStore {
    tables: Mutex<Tables>,
    available: AtomicBool,
}

impl Default for MemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEntryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables {
                next_id: 1,
                ..Tables::default()
            }),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: while unavailable every call fails with a
    /// connection error.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Insert an entry with a fixed creation time, bypassing the trait.
    pub async fn insert_at(
        &self,
        entry: NewFireboardEntry,
        created_at: NaiveDateTime,
    ) -> FireboardEntry {
        let mut tables = self.tables.lock().await;
        let stored = Self::build(&mut tables, &entry, created_at);
        tables.entries.insert(entry.source_message_id, stored.clone());
        stored
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.tables.lock().await.entries.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check(&self) -> DatabaseResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DatabaseError::new(DatabaseErrorKind::Connection(
                "in-memory store marked unavailable".to_string(),
            )))
        }
    }

    fn build(tables: &mut Tables, entry: &NewFireboardEntry, now: NaiveDateTime) -> FireboardEntry {
        let id = tables.next_id;
        tables.next_id += 1;
        FireboardEntry::new(
            id,
            entry.source_message_id,
            entry.source_channel_id,
            entry.mirror_message_id,
            entry.author_id,
            entry.valid_reaction_count.max(0),
            now,
            now,
        )
    }

    fn mirror_taken(tables: &Tables, mirror: MessageId, except: Option<MessageId>) -> bool {
        tables.entries.values().any(|entry| {
            *entry.mirror_message_id() == mirror && Some(*entry.source_message_id()) != except
        })
    }

    fn duplicate_mirror(mirror: MessageId) -> DatabaseError {
        DatabaseError::new(DatabaseErrorKind::Query(format!(
            "duplicate key value violates unique constraint \
             \"fireboard_entries_mirror_message_id_key\" ({})",
            mirror
        )))
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn get(&self, source_message_id: MessageId) -> DatabaseResult<Option<FireboardEntry>> {
        self.check()?;
        Ok(self.tables.lock().await.entries.get(&source_message_id).cloned())
    }

    async fn find_by_mirror(
        &self,
        mirror_message_id: MessageId,
    ) -> DatabaseResult<Option<FireboardEntry>> {
        self.check()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .entries
            .values()
            .find(|entry| *entry.mirror_message_id() == mirror_message_id)
            .cloned())
    }

    async fn create_or_get(&self, entry: NewFireboardEntry) -> DatabaseResult<CreateOutcome> {
        self.check()?;
        let mut tables = self.tables.lock().await;

        if let Some(existing) = tables.entries.get(&entry.source_message_id) {
            return Ok(CreateOutcome {
                entry: existing.clone(),
                created: false,
            });
        }
        if Self::mirror_taken(&tables, entry.mirror_message_id, None) {
            return Err(Self::duplicate_mirror(entry.mirror_message_id));
        }

        let stored = Self::build(&mut tables, &entry, Utc::now().naive_utc());
        tables.entries.insert(entry.source_message_id, stored.clone());
        Ok(CreateOutcome {
            entry: stored,
            created: true,
        })
    }

    async fn update(
        &self,
        source_message_id: MessageId,
        changes: EntryChanges,
    ) -> DatabaseResult<bool> {
        self.check()?;
        let mut tables = self.tables.lock().await;

        if let Some(mirror) = changes.mirror_message_id {
            if Self::mirror_taken(&tables, mirror, Some(source_message_id)) {
                return Err(Self::duplicate_mirror(mirror));
            }
        }

        let Some(current) = tables.entries.get(&source_message_id) else {
            return Ok(false);
        };
        let updated = FireboardEntry::new(
            *current.id(),
            *current.source_message_id(),
            changes.source_channel_id.or(*current.source_channel_id()),
            changes
                .mirror_message_id
                .unwrap_or(*current.mirror_message_id()),
            *current.author_id(),
            changes
                .valid_reaction_count
                .map(|count| count.max(0))
                .unwrap_or(*current.valid_reaction_count()),
            *current.created_at(),
            Utc::now().naive_utc(),
        );
        tables.entries.insert(source_message_id, updated);
        Ok(true)
    }

    async fn delete(&self, entry: &FireboardEntry) -> DatabaseResult<bool> {
        self.check()?;
        let mut tables = self.tables.lock().await;
        let key = tables
            .entries
            .iter()
            .find(|(_, stored)| stored.id() == entry.id())
            .map(|(key, _)| *key);
        Ok(key.and_then(|key| tables.entries.remove(&key)).is_some())
    }

    async fn list(&self, query: EntryQuery) -> DatabaseResult<Vec<FireboardEntry>> {
        self.check()?;
        let tables = self.tables.lock().await;
        let mut entries: Vec<FireboardEntry> = tables.entries.values().cloned().collect();
        entries.sort_by_key(|entry| (*entry.created_at(), *entry.id()));
        if query.newest_first {
            entries.reverse();
        }
        if let Some(limit) = query.limit {
            entries.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(entries)
    }

    async fn stats(&self) -> DatabaseResult<EntryStats> {
        self.check()?;
        let tables = self.tables.lock().await;
        let since = Utc::now().naive_utc() - TimeDelta::days(RECENT_WINDOW_DAYS);
        let recent = tables
            .entries
            .values()
            .filter(|entry| *entry.created_at() > since)
            .count();
        Ok(EntryStats {
            total_entries: tables.entries.len() as i64,
            recent_entries: recent as i64,
        })
    }
}

#[async_trait]
impl StateStore for MemoryEntryStore {
    async fn get_state(&self, name: &str) -> DatabaseResult<Option<String>> {
        self.check()?;
        Ok(self.tables.lock().await.state.get(name).cloned())
    }

    async fn set_state(&self, name: &str, value: &str) -> DatabaseResult<()> {
        self.check()?;
        self.tables
            .lock()
            .await
            .state
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_state(&self, name: &str) -> DatabaseResult<bool> {
        self.check()?;
        Ok(self.tables.lock().await.state.remove(name).is_some())
    }
}
