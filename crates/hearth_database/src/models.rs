//! Diesel row types.

use crate::schema::{bot_state, fireboard_entries};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use hearth_core::{ChannelId, FireboardEntry, MessageId, NewFireboardEntry, UserId};

/// Database row for the fireboard_entries table.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = fireboard_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EntryRow {
    pub id: i64,
    pub source_message_id: i64,
    pub source_channel_id: Option<i64>,
    pub mirror_message_id: i64,
    pub author_id: i64,
    pub valid_reaction_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<EntryRow> for FireboardEntry {
    fn from(row: EntryRow) -> Self {
        FireboardEntry::new(
            row.id,
            MessageId::from_db(row.source_message_id),
            row.source_channel_id.map(ChannelId::from_db),
            MessageId::from_db(row.mirror_message_id),
            UserId::from_db(row.author_id),
            row.valid_reaction_count,
            row.created_at,
            row.updated_at,
        )
    }
}

/// Insertable struct for the fireboard_entries table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = fireboard_entries)]
pub struct NewEntryRow {
    pub source_message_id: i64,
    pub source_channel_id: Option<i64>,
    pub mirror_message_id: i64,
    pub author_id: i64,
    pub valid_reaction_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewEntryRow {
    pub fn new(entry: &NewFireboardEntry, now: NaiveDateTime) -> Self {
        Self {
            source_message_id: entry.source_message_id.to_db(),
            source_channel_id: entry.source_channel_id.map(ChannelId::to_db),
            mirror_message_id: entry.mirror_message_id.to_db(),
            author_id: entry.author_id.to_db(),
            valid_reaction_count: entry.valid_reaction_count.max(0),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for the fireboard_entries table; `None` leaves a column alone.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = fireboard_entries)]
pub struct EntryChangeset {
    pub source_channel_id: Option<i64>,
    pub mirror_message_id: Option<i64>,
    pub valid_reaction_count: Option<i32>,
    pub updated_at: NaiveDateTime,
}

/// Database row for the bot_state table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = bot_state)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StateRow {
    pub name: String,
    pub value: String,
    pub updated_at: NaiveDateTime,
}
