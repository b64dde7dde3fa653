//! The fireboard engine.
//!
//! Mirrors messages that collect enough qualifying reactions into a
//! designated channel and keeps each mirror in sync with its source. Every
//! pass reads reaction state fresh from the platform, so the outcome depends
//! only on the current state of the source message, never on which event
//! triggered the pass.
//!
//! Per source message the engine moves between two states, *absent* and
//! *present*:
//!
//! | trigger | recount | entry | action |
//! |---|---|---|---|
//! | reaction add, refresh | at or above threshold | absent | send mirror, store entry |
//! | any | at or above threshold | present | edit mirror (recreate if missing), update count |
//! | any | below threshold | present | delete mirror and entry |
//! | reaction remove | any | absent | nothing |
//! | source deleted | | present | delete mirror and entry |

use crate::{ChatPlatform, Dispatch, PlatformResult, ProcessingSlots, ReactionHandler};
use async_trait::async_trait;
use hearth_core::{
    ChannelId, FireboardEntry, FireboardSettings, MessageId, MessageSnapshot, NewFireboardEntry,
    ReactionAction, ReactionEvent, ValidReaction, calculate_total_count, compute_valid_reactions,
    emoji_matches, render,
};
use hearth_database::{EntryChanges, EntryQuery, EntryStats, EntryStore};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of a single-message refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    /// A new mirror was posted.
    #[display("added")]
    Added,
    /// The existing mirror was brought up to date.
    #[display("updated")]
    Updated,
    /// The mirror and its entry were removed.
    #[display("deleted")]
    Deleted,
    /// The message does not qualify and has no entry.
    #[display("not eligible")]
    NotEligible,
    /// The message does not exist and has no entry.
    #[display("not found")]
    NotFound,
    /// Nothing was done: feature off, message busy, or a transient failure.
    #[display("skipped")]
    Skipped,
}

/// Totals from a full refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, derive_more::Display)]
#[display("{} refreshed, {} removed", refreshed, removed)]
pub struct RefreshSummary {
    /// Entries whose mirror was edited or recreated.
    pub refreshed: usize,
    /// Entries removed because the source is gone or fell below threshold.
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    ReactionAdd,
    ReactionRemove,
    Refresh,
}

impl Trigger {
    // Only an add or an explicit refresh may put a message on the board.
    fn may_create(self) -> bool {
        !matches!(self, Self::ReactionRemove)
    }
}

/// Mirrors popular messages and keeps mirrors in sync.
///
/// # Example
///
/// ```rust,ignore
/// let engine = FireboardEngine::new(settings, store, platform);
/// let summary = engine.refresh_all_entries().await;
/// println!("{summary}");
/// ```
pub struct FireboardEngine {
    settings: FireboardSettings,
    store: Arc<dyn EntryStore>,
    platform: Arc<dyn ChatPlatform>,
    slots: ProcessingSlots<MessageId>,
    destination: OnceCell<ChannelId>,
}

impl FireboardEngine {
    /// Create an engine. Nothing is resolved until the first event.
    pub fn new(
        settings: FireboardSettings,
        store: Arc<dyn EntryStore>,
        platform: Arc<dyn ChatPlatform>,
    ) -> Self {
        Self {
            settings,
            store,
            platform,
            slots: ProcessingSlots::new(),
            destination: OnceCell::new(),
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &FireboardSettings {
        &self.settings
    }

    /// Per-message processing slots.
    pub fn slots(&self) -> &ProcessingSlots<MessageId> {
        &self.slots
    }

    /// Handle a reaction being added. Never claims the event.
    pub async fn handle_reaction_add(&self, event: &ReactionEvent) -> Dispatch {
        self.process_reaction(event, Trigger::ReactionAdd).await;
        Dispatch::NotApplicable
    }

    /// Handle a reaction being removed. Never claims the event.
    pub async fn handle_reaction_remove(&self, event: &ReactionEvent) -> Dispatch {
        self.process_reaction(event, Trigger::ReactionRemove).await;
        Dispatch::NotApplicable
    }

    /// Remove the mirror of a deleted source message.
    ///
    /// Waits for any pass in flight on the same message instead of dropping
    /// the deletion. A deleted mirror only logs; its entry stays and the next
    /// pass recreates it.
    #[instrument(skip(self), fields(%channel_id, %message_id))]
    pub async fn handle_message_delete(&self, channel_id: ChannelId, message_id: MessageId) {
        let Some(destination) = self.destination().await else {
            return;
        };

        if channel_id == destination {
            match self.store.find_by_mirror(message_id).await {
                Ok(Some(entry)) => info!(
                    source_message_id = %entry.source_message_id(),
                    "Mirror message deleted, it will be recreated on the next pass"
                ),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Failed to look up deleted mirror"),
            }
            return;
        }

        let _slot = self.slots.acquire(message_id).await;
        match self.store.get(message_id).await {
            Ok(Some(entry)) => {
                self.remove_entry(destination, &entry).await;
            }
            Ok(None) => debug!("Deleted message was not on the fireboard"),
            Err(e) => error!(error = %e, "Failed to read fireboard entry"),
        }
    }

    /// Re-count a message after a moderator cleared its reactions.
    ///
    /// `emoji` names the single cleared emoji, or is `None` when every reaction
    /// was removed. No further event follows a clear, so this waits for any
    /// pass in flight instead of dropping.
    #[instrument(skip(self), fields(%channel_id, %message_id))]
    pub async fn handle_reactions_cleared(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: Option<&str>,
    ) -> RefreshStatus {
        if emoji.is_some_and(|emoji| !self.tracks(emoji)) {
            return RefreshStatus::Skipped;
        }
        let Some(destination) = self.destination().await else {
            return RefreshStatus::Skipped;
        };
        if channel_id == destination {
            return RefreshStatus::Skipped;
        }

        let _slot = self.slots.acquire(message_id).await;
        let status = self
            .process_change(destination, channel_id, message_id, Trigger::ReactionRemove)
            .await;
        debug!(%status, "Reactions cleared");
        status
    }

    /// [`handle_message_delete`](Self::handle_message_delete) for each message.
    pub async fn handle_message_delete_bulk(&self, channel_id: ChannelId, messages: &[MessageId]) {
        debug!(%channel_id, count = messages.len(), "Bulk delete");
        for message_id in messages {
            self.handle_message_delete(channel_id, *message_id).await;
        }
    }

    /// Re-sync every stored entry with its source.
    ///
    /// Missing sources remove their entry, missing mirrors are recreated, and
    /// entries that fell below threshold are removed. Entries that are busy or
    /// hit a transient failure count toward neither total.
    #[instrument(skip_all)]
    pub async fn refresh_all_entries(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        let Some(destination) = self.destination().await else {
            return summary;
        };

        let entries = match self.store.list(EntryQuery::all()).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "Failed to list fireboard entries");
                return summary;
            }
        };
        info!(entries = entries.len(), "Refreshing fireboard entries");

        for entry in entries {
            let message_id = *entry.source_message_id();
            let Some(_slot) = self.slots.try_acquire(message_id) else {
                debug!(%message_id, "Entry busy, skipping");
                continue;
            };
            match self.refresh_entry(destination, message_id).await {
                RefreshStatus::Updated => summary.refreshed += 1,
                RefreshStatus::Deleted => summary.removed += 1,
                _ => {}
            }
        }

        info!(
            refreshed = summary.refreshed,
            removed = summary.removed,
            "Fireboard refresh complete"
        );
        summary
    }

    /// Re-evaluate one message and apply whatever its current state calls for.
    #[instrument(skip(self), fields(%channel_id, %message_id))]
    pub async fn refresh_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> RefreshStatus {
        let Some(destination) = self.destination().await else {
            return RefreshStatus::Skipped;
        };
        if channel_id == destination {
            debug!("Refusing to mirror a message from the fireboard channel");
            return RefreshStatus::Skipped;
        }
        let Some(_slot) = self.slots.try_acquire(message_id) else {
            debug!("Message already being processed");
            return RefreshStatus::Skipped;
        };

        let status = self
            .process_change(destination, channel_id, message_id, Trigger::Refresh)
            .await;
        info!(%status, "Refreshed message");
        status
    }

    /// Reaction breakdown for a message.
    ///
    /// `exclude_author` overrides the configured setting when given.
    pub fn valid_reactions(
        &self,
        message: &MessageSnapshot,
        exclude_author: Option<bool>,
    ) -> Vec<ValidReaction> {
        compute_valid_reactions(
            message,
            self.settings.emojis(),
            exclude_author.unwrap_or(*self.settings.exclude_author()),
        )
    }

    /// Emoji that count as votes, in priority order.
    pub fn valid_emoji_list(&self) -> &[String] {
        self.settings.emojis()
    }

    /// Post a mirror for a message with an already computed breakdown.
    ///
    /// Returns `false` without side effects when the breakdown is below
    /// threshold, the message already has an entry, or it is being processed.
    #[instrument(skip_all, fields(message_id = %message.id))]
    pub async fn add_to_fireboard(
        &self,
        message: &MessageSnapshot,
        valid_reactions: &[ValidReaction],
    ) -> bool {
        let Some(destination) = self.destination().await else {
            return false;
        };
        let total = calculate_total_count(valid_reactions);
        if total < *self.settings.threshold() {
            debug!(total, "Below threshold");
            return false;
        }
        let Some(_slot) = self.slots.try_acquire(message.id) else {
            debug!("Message already being processed");
            return false;
        };

        match self.store.get(message.id).await {
            Ok(None) => {}
            Ok(Some(_)) => {
                debug!("Message already on the fireboard");
                return false;
            }
            Err(e) => {
                error!(error = %e, "Failed to read fireboard entry");
                return false;
            }
        }

        self.create_mirror(destination, message, valid_reactions)
            .await
            == RefreshStatus::Added
    }

    /// Entry counts, or `None` if the store is unavailable.
    pub async fn stats(&self) -> Option<EntryStats> {
        self.store
            .stats()
            .await
            .inspect_err(|e| error!(error = %e, "Failed to read fireboard stats"))
            .ok()
    }

    /// Most recently created entries.
    pub async fn recent_entries(&self, limit: i64) -> Vec<FireboardEntry> {
        self.store
            .list(EntryQuery::recent(limit))
            .await
            .inspect_err(|e| error!(error = %e, "Failed to list recent entries"))
            .unwrap_or_default()
    }

    fn tracks(&self, emoji: &str) -> bool {
        self.settings
            .emojis()
            .iter()
            .any(|valid| emoji_matches(valid, emoji))
    }

    // Destination channel, resolved once. A failed lookup is retried on the
    // next call.
    async fn destination(&self) -> Option<ChannelId> {
        if !*self.settings.enabled() {
            return None;
        }
        let Some(configured) = *self.settings.channel_id() else {
            debug!("Fireboard has no destination channel configured");
            return None;
        };

        let resolved = self
            .destination
            .get_or_try_init(|| async {
                self.platform
                    .fetch_channel(configured)
                    .await
                    .map(|channel| channel.id)
            })
            .await;

        match resolved {
            Ok(channel_id) => Some(*channel_id),
            Err(e) => {
                warn!(channel_id = %configured, error = %e, "Fireboard channel could not be resolved");
                None
            }
        }
    }

    #[instrument(
        skip_all,
        fields(message_id = %event.message_id, channel_id = %event.channel_id, emoji = %event.emoji)
    )]
    async fn process_reaction(&self, event: &ReactionEvent, trigger: Trigger) -> RefreshStatus {
        if !self.tracks(&event.emoji) {
            return RefreshStatus::Skipped;
        }
        let Some(destination) = self.destination().await else {
            return RefreshStatus::Skipped;
        };
        if event.channel_id == destination {
            debug!("Ignoring reaction inside the fireboard channel");
            return RefreshStatus::Skipped;
        }
        let Some(_slot) = self.slots.try_acquire(event.message_id) else {
            debug!("Message already being processed, dropping event");
            return RefreshStatus::Skipped;
        };

        let status = self
            .process_change(destination, event.channel_id, event.message_id, trigger)
            .await;
        debug!(%status, "Reaction processed");
        status
    }

    // Caller holds the message's slot.
    async fn process_change(
        &self,
        destination: ChannelId,
        channel_id: ChannelId,
        message_id: MessageId,
        trigger: Trigger,
    ) -> RefreshStatus {
        let existing = match self.store.get(message_id).await {
            Ok(existing) => existing,
            Err(e) => {
                error!(error = %e, "Failed to read fireboard entry");
                return RefreshStatus::Skipped;
            }
        };

        // A refresh names its channel by hand, so a tracked source is only gone
        // once the stored channel and a guild search both miss it.
        let fetched = match (&existing, trigger) {
            (Some(entry), Trigger::Refresh) => {
                let channel = (*entry.source_channel_id()).or(Some(channel_id));
                self.locate_source(channel, message_id).await
            }
            _ => self.platform.fetch_message(channel_id, message_id).await,
        };

        let source = match fetched {
            Ok(source) => source,
            Err(e) if e.is_not_found() => {
                return match existing {
                    Some(entry) => self.remove_entry(destination, &entry).await,
                    None => RefreshStatus::NotFound,
                };
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch source message");
                return RefreshStatus::Skipped;
            }
        };

        self.reconcile(destination, existing, &source, trigger).await
    }

    // Caller holds the message's slot.
    async fn refresh_entry(&self, destination: ChannelId, message_id: MessageId) -> RefreshStatus {
        let entry = match self.store.get(message_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return RefreshStatus::Skipped,
            Err(e) => {
                error!(%message_id, error = %e, "Failed to read fireboard entry");
                return RefreshStatus::Skipped;
            }
        };

        let source = match self.locate_source(*entry.source_channel_id(), message_id).await {
            Ok(source) => source,
            Err(e) if e.is_not_found() => {
                info!(%message_id, "Source message gone, removing entry");
                return self.remove_entry(destination, &entry).await;
            }
            Err(e) => {
                warn!(%message_id, error = %e, "Failed to fetch source message");
                return RefreshStatus::Skipped;
            }
        };

        self.reconcile(destination, Some(entry), &source, Trigger::Refresh)
            .await
    }

    // Try the stored channel first, then search every channel.
    async fn locate_source(
        &self,
        channel_id: Option<ChannelId>,
        message_id: MessageId,
    ) -> PlatformResult<MessageSnapshot> {
        if let Some(channel_id) = channel_id {
            match self.platform.fetch_message(channel_id, message_id).await {
                Ok(source) => return Ok(source),
                Err(e) if e.is_not_found() => {
                    debug!(%message_id, %channel_id, "Not in stored channel, searching");
                }
                Err(e) => return Err(e),
            }
        }
        self.platform.search_message(message_id).await
    }

    async fn reconcile(
        &self,
        destination: ChannelId,
        existing: Option<FireboardEntry>,
        source: &MessageSnapshot,
        trigger: Trigger,
    ) -> RefreshStatus {
        let reactions = self.valid_reactions(source, None);
        let qualifies = calculate_total_count(&reactions) >= *self.settings.threshold();

        match (existing, qualifies) {
            (Some(entry), true) => {
                self.update_mirror(destination, &entry, source, &reactions)
                    .await
            }
            (Some(entry), false) => self.remove_entry(destination, &entry).await,
            (None, true) if trigger.may_create() => {
                self.create_mirror(destination, source, &reactions).await
            }
            (None, _) => RefreshStatus::NotEligible,
        }
    }

    async fn create_mirror(
        &self,
        destination: ChannelId,
        source: &MessageSnapshot,
        reactions: &[ValidReaction],
    ) -> RefreshStatus {
        let total = calculate_total_count(reactions);
        let content = render(source, reactions, &self.settings);

        let mirror_message_id = match self.platform.send_mirror(destination, &content).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Failed to post mirror");
                return RefreshStatus::Skipped;
            }
        };

        let entry = NewFireboardEntry {
            source_message_id: source.id,
            source_channel_id: Some(source.channel_id),
            mirror_message_id,
            author_id: source.author.id,
            valid_reaction_count: count_column(total),
        };

        match self.store.create_or_get(entry).await {
            Ok(outcome) if outcome.created => {
                info!(%mirror_message_id, total, "Added message to fireboard");
                RefreshStatus::Added
            }
            Ok(outcome) => {
                info!(
                    existing_mirror = %outcome.entry.mirror_message_id(),
                    "Entry was created concurrently, discarding duplicate mirror"
                );
                self.discard_mirror(destination, mirror_message_id).await;
                RefreshStatus::Skipped
            }
            Err(e) => {
                error!(error = %e, "Failed to store fireboard entry");
                self.discard_mirror(destination, mirror_message_id).await;
                RefreshStatus::Skipped
            }
        }
    }

    async fn update_mirror(
        &self,
        destination: ChannelId,
        entry: &FireboardEntry,
        source: &MessageSnapshot,
        reactions: &[ValidReaction],
    ) -> RefreshStatus {
        let total = calculate_total_count(reactions);
        let content = render(source, reactions, &self.settings);
        let mirror_message_id = *entry.mirror_message_id();

        let mut changes = EntryChanges::count(count_column(total));
        if *entry.source_channel_id() != Some(source.channel_id) {
            changes = changes.with_source_channel(source.channel_id);
        }

        let mut recreated = None;
        match self
            .platform
            .edit_mirror(destination, mirror_message_id, &content)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                info!(%mirror_message_id, "Mirror message missing, recreating");
                match self.platform.send_mirror(destination, &content).await {
                    Ok(id) => {
                        changes = changes.with_mirror(id);
                        recreated = Some(id);
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to recreate mirror");
                        return RefreshStatus::Skipped;
                    }
                }
            }
            Err(e) => {
                warn!(%mirror_message_id, error = %e, "Failed to edit mirror");
                return RefreshStatus::Skipped;
            }
        }

        match self.store.update(source.id, changes).await {
            Ok(true) => {
                debug!(total, "Updated fireboard entry");
                RefreshStatus::Updated
            }
            Ok(false) => {
                warn!("Entry disappeared during update");
                if let Some(id) = recreated {
                    self.discard_mirror(destination, id).await;
                }
                RefreshStatus::Skipped
            }
            Err(e) => {
                error!(error = %e, "Failed to update fireboard entry");
                if let Some(id) = recreated {
                    self.discard_mirror(destination, id).await;
                }
                RefreshStatus::Skipped
            }
        }
    }

    // A mirror that cannot be deleted keeps its entry so a later pass retries.
    async fn remove_entry(&self, destination: ChannelId, entry: &FireboardEntry) -> RefreshStatus {
        let mirror_message_id = *entry.mirror_message_id();
        match self
            .platform
            .delete_message(destination, mirror_message_id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!(%mirror_message_id, "Mirror already gone"),
            Err(e) => {
                warn!(%mirror_message_id, error = %e, "Failed to delete mirror, keeping entry");
                return RefreshStatus::Skipped;
            }
        }

        match self.store.delete(entry).await {
            Ok(_) => {
                info!(source_message_id = %entry.source_message_id(), "Removed message from fireboard");
                RefreshStatus::Deleted
            }
            Err(e) => {
                error!(error = %e, "Failed to delete fireboard entry");
                RefreshStatus::Skipped
            }
        }
    }

    async fn discard_mirror(&self, destination: ChannelId, mirror_message_id: MessageId) {
        match self
            .platform
            .delete_message(destination, mirror_message_id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => warn!(%mirror_message_id, error = %e, "Failed to delete orphan mirror"),
        }
    }
}

fn count_column(total: u32) -> i32 {
    i32::try_from(total).unwrap_or(i32::MAX)
}

#[async_trait]
impl ReactionHandler for FireboardEngine {
    fn name(&self) -> &'static str {
        "fireboard"
    }

    async fn on_reaction(&self, event: &ReactionEvent) -> Dispatch {
        match event.action {
            ReactionAction::Add => self.handle_reaction_add(event).await,
            ReactionAction::Remove => self.handle_reaction_remove(event).await,
        }
    }
}
