//! PostgreSQL implementation of the entry and state stores.

use crate::models::{EntryChangeset, EntryRow, NewEntryRow, StateRow};
use crate::schema::{bot_state, fireboard_entries};
use crate::{
    CreateOutcome, DatabaseResult, EntryChanges, EntryQuery, EntryStats, EntryStore, PgPool,
    RECENT_WINDOW_DAYS, StateStore,
};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use hearth_core::{ChannelId, FireboardEntry, MessageId, NewFireboardEntry};
use hearth_error::{DatabaseError, DatabaseErrorKind};
use tracing::{debug, instrument};

/// Diesel-backed store.
///
/// Diesel is synchronous, so every query runs on the blocking thread pool
/// with a connection checked out of the r2d2 pool.
#[derive(Clone)]
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run<T, F>(&self, op: F) -> DatabaseResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            op(&mut conn)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Task(e.to_string())))?
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    #[instrument(skip(self))]
    async fn get(&self, source_message_id: MessageId) -> DatabaseResult<Option<FireboardEntry>> {
        self.run(move |conn| {
            fireboard_entries::table
                .filter(fireboard_entries::source_message_id.eq(source_message_id.to_db()))
                .select(EntryRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(FireboardEntry::from))
                .map_err(DatabaseError::from)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn find_by_mirror(
        &self,
        mirror_message_id: MessageId,
    ) -> DatabaseResult<Option<FireboardEntry>> {
        self.run(move |conn| {
            fireboard_entries::table
                .filter(fireboard_entries::mirror_message_id.eq(mirror_message_id.to_db()))
                .select(EntryRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(FireboardEntry::from))
                .map_err(DatabaseError::from)
        })
        .await
    }

    /// Uses `INSERT ... ON CONFLICT (source_message_id) DO NOTHING`; a caller
    /// that loses the race reads back the winner's row.
    #[instrument(skip(self, entry), fields(source_message_id = %entry.source_message_id))]
    async fn create_or_get(&self, entry: NewFireboardEntry) -> DatabaseResult<CreateOutcome> {
        self.run(move |conn| {
            let row = NewEntryRow::new(&entry, Utc::now().naive_utc());

            let inserted: Option<EntryRow> = diesel::insert_into(fireboard_entries::table)
                .values(&row)
                .on_conflict(fireboard_entries::source_message_id)
                .do_nothing()
                .returning(EntryRow::as_returning())
                .get_result(conn)
                .optional()?;

            if let Some(row) = inserted {
                return Ok(CreateOutcome {
                    entry: row.into(),
                    created: true,
                });
            }

            debug!("Entry already exists, returning stored row");
            let existing: EntryRow = fireboard_entries::table
                .filter(fireboard_entries::source_message_id.eq(row.source_message_id))
                .select(EntryRow::as_select())
                .first(conn)?;
            Ok(CreateOutcome {
                entry: existing.into(),
                created: false,
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn update(
        &self,
        source_message_id: MessageId,
        changes: EntryChanges,
    ) -> DatabaseResult<bool> {
        self.run(move |conn| {
            let changeset = EntryChangeset {
                source_channel_id: changes.source_channel_id.map(ChannelId::to_db),
                mirror_message_id: changes.mirror_message_id.map(MessageId::to_db),
                valid_reaction_count: changes.valid_reaction_count.map(|count| count.max(0)),
                updated_at: Utc::now().naive_utc(),
            };
            let affected = diesel::update(
                fireboard_entries::table
                    .filter(fireboard_entries::source_message_id.eq(source_message_id.to_db())),
            )
            .set(&changeset)
            .execute(conn)?;
            Ok(affected > 0)
        })
        .await
    }

    #[instrument(skip(self, entry), fields(id = *entry.id(), source_message_id = %entry.source_message_id()))]
    async fn delete(&self, entry: &FireboardEntry) -> DatabaseResult<bool> {
        let id = *entry.id();
        self.run(move |conn| {
            let affected = diesel::delete(fireboard_entries::table.find(id)).execute(conn)?;
            Ok(affected > 0)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list(&self, query: EntryQuery) -> DatabaseResult<Vec<FireboardEntry>> {
        self.run(move |conn| {
            let mut statement = fireboard_entries::table
                .select(EntryRow::as_select())
                .into_boxed();
            statement = if query.newest_first {
                statement.order((
                    fireboard_entries::created_at.desc(),
                    fireboard_entries::id.desc(),
                ))
            } else {
                statement.order((
                    fireboard_entries::created_at.asc(),
                    fireboard_entries::id.asc(),
                ))
            };
            if let Some(limit) = query.limit {
                statement = statement.limit(limit);
            }
            let rows: Vec<EntryRow> = statement.load(conn)?;
            Ok(rows.into_iter().map(FireboardEntry::from).collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> DatabaseResult<EntryStats> {
        self.run(|conn| {
            let since = Utc::now().naive_utc() - TimeDelta::days(RECENT_WINDOW_DAYS);
            let total_entries: i64 = fireboard_entries::table.count().get_result(conn)?;
            let recent_entries: i64 = fireboard_entries::table
                .filter(fireboard_entries::created_at.gt(since))
                .count()
                .get_result(conn)?;
            Ok(EntryStats {
                total_entries,
                recent_entries,
            })
        })
        .await
    }
}

#[async_trait]
impl StateStore for PgEntryStore {
    #[instrument(skip(self))]
    async fn get_state(&self, name: &str) -> DatabaseResult<Option<String>> {
        let name = name.to_string();
        self.run(move |conn| {
            bot_state::table
                .find(name)
                .select(bot_state::value)
                .first::<String>(conn)
                .optional()
                .map_err(DatabaseError::from)
        })
        .await
    }

    #[instrument(skip(self, value))]
    async fn set_state(&self, name: &str, value: &str) -> DatabaseResult<()> {
        let row = StateRow {
            name: name.to_string(),
            value: value.to_string(),
            updated_at: Utc::now().naive_utc(),
        };
        self.run(move |conn| {
            diesel::insert_into(bot_state::table)
                .values(&row)
                .on_conflict(bot_state::name)
                .do_update()
                .set((
                    bot_state::value.eq(&row.value),
                    bot_state::updated_at.eq(row.updated_at),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn remove_state(&self, name: &str) -> DatabaseResult<bool> {
        let name = name.to_string();
        self.run(move |conn| {
            let affected = diesel::delete(bot_state::table.find(name)).execute(conn)?;
            Ok(affected > 0)
        })
        .await
    }
}
