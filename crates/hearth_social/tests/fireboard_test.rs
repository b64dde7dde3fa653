//! Fireboard engine behaviour against a scripted Discord.

mod support;

use async_trait::async_trait;
use hearth_core::{
    ChannelId, FireboardEntry, FireboardSettings, FireboardSettingsBuilder, MessageId,
    NewFireboardEntry, ReactionAction, ReactionEvent, UserId, render,
};
use hearth_database::{
    CreateOutcome, DatabaseResult, EntryChanges, EntryQuery, EntryStats, EntryStore,
    MemoryEntryStore,
};
use hearth_error::{DatabaseError, DatabaseErrorKind};
use hearth_social::{ChatPlatform, Dispatch, FireboardEngine, RefreshStatus, RefreshSummary};
use std::sync::Arc;
use std::time::Duration;
use support::*;

struct Harness {
    discord: Arc<FakeDiscord>,
    store: Arc<MemoryEntryStore>,
    engine: FireboardEngine,
}

fn harness(settings: FireboardSettings) -> Harness {
    let discord = Arc::new(FakeDiscord::new());
    let store = Arc::new(MemoryEntryStore::new());
    let engine = FireboardEngine::new(settings, store.clone(), discord.clone());
    Harness {
        discord,
        store,
        engine,
    }
}

fn event(
    action: ReactionAction,
    channel_id: ChannelId,
    message_id: MessageId,
    user_id: UserId,
    emoji: &str,
) -> ReactionEvent {
    ReactionEvent {
        action,
        message_id,
        channel_id,
        guild_id: Some(GUILD),
        user_id,
        user_is_bot: false,
        emoji: emoji.to_string(),
    }
}

impl Harness {
    async fn react(&self, message_id: MessageId, user: UserId, emoji: &str) -> Dispatch {
        self.discord.react(message_id, emoji, user);
        let add = event(ReactionAction::Add, GENERAL, message_id, user, emoji);
        self.engine.handle_reaction_add(&add).await
    }

    async fn unreact(&self, message_id: MessageId, user: UserId, emoji: &str) -> Dispatch {
        self.discord.unreact(message_id, emoji, user);
        let remove = event(ReactionAction::Remove, GENERAL, message_id, user, emoji);
        self.engine.handle_reaction_remove(&remove).await
    }

    async fn entry(&self, message_id: MessageId) -> Option<FireboardEntry> {
        self.store.get(message_id).await.expect("store available")
    }

    // Source message in #general with three counted 🔥 votes and a mirror.
    async fn on_board(&self, id: u64) -> (MessageId, FireboardEntry) {
        let message_id = self.discord.post(GENERAL, id, "hot take");
        for user in [BOB, CAROL, DAVE] {
            self.react(message_id, user, "🔥").await;
        }
        let entry = self.entry(message_id).await.expect("entry created");
        (message_id, entry)
    }
}

#[tokio::test]
async fn test_scenario_mirror_lifecycle() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");

    assert_eq!(h.react(message_id, BOB, "🔥").await, Dispatch::NotApplicable);
    h.react(message_id, CAROL, "🔥").await;
    assert!(h.discord.mirrors().is_empty());
    assert!(h.entry(message_id).await.is_none());

    h.react(message_id, DAVE, "🔥").await;
    let entry = h.entry(message_id).await.expect("entry created at threshold");
    assert_eq!(*entry.valid_reaction_count(), 3);
    assert_eq!(*entry.source_channel_id(), Some(GENERAL));
    let mirror = h.discord.mirror(*entry.mirror_message_id()).expect("mirror posted");
    assert_eq!(mirror.channel_id, FIREBOARD);
    assert_eq!(mirror.content.content, "🔥 **3** | <#100>");

    // The author's own vote does not count.
    h.react(message_id, AUTHOR, "🔥").await;
    let entry = h.entry(message_id).await.expect("entry kept");
    assert_eq!(*entry.valid_reaction_count(), 3);
    assert_eq!(h.discord.mirrors().len(), 1);

    h.unreact(message_id, BOB, "🔥").await;
    assert!(h.entry(message_id).await.is_none());
    assert!(h.discord.mirrors().is_empty());
    assert_eq!(h.discord.deleted(), vec![*entry.mirror_message_id()]);
}

#[tokio::test]
async fn test_scenario_remove_and_re_add_posts_new_mirror() {
    let h = harness(fireboard_settings(3, &["👍", "🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");

    h.react(message_id, BOB, "👍").await;
    h.react(message_id, CAROL, "👍").await;
    h.react(message_id, DAVE, "🔥").await;
    let first = h.entry(message_id).await.expect("created at threshold");
    let mirror = h.discord.mirror(*first.mirror_message_id()).expect("mirror");
    let breakdown = &mirror.content.embed.fields[0];
    assert_eq!(breakdown.value, "👍 2 • 🔥 1");

    h.unreact(message_id, BOB, "👍").await;
    assert!(h.entry(message_id).await.is_none());

    h.react(message_id, BOB, "👍").await;
    let second = h.entry(message_id).await.expect("re-created");
    assert_ne!(second.mirror_message_id(), first.mirror_message_id());
    assert_eq!(h.discord.mirrors().len(), 1);
}

#[tokio::test]
async fn test_source_delete_with_mirror_already_gone() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, entry) = h.on_board(1_000).await;
    h.discord.delete_externally(*entry.mirror_message_id());

    h.engine.handle_message_delete(GENERAL, message_id).await;
    h.engine.handle_message_delete(GENERAL, message_id).await;

    assert!(h.entry(message_id).await.is_none());
    assert!(h.discord.deleted().is_empty());
}

#[tokio::test]
async fn test_mirror_is_edited_in_place_as_votes_grow() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, entry) = h.on_board(1_000).await;

    h.react(message_id, ERIN, "🔥").await;

    let updated = h.entry(message_id).await.expect("entry kept");
    assert_eq!(updated.mirror_message_id(), entry.mirror_message_id());
    assert_eq!(*updated.valid_reaction_count(), 4);
    let mirror = h.discord.mirror(*entry.mirror_message_id()).expect("mirror kept");
    assert_eq!(mirror.edits, 1);
    assert!(mirror.content.content.contains("**4**"));
}

#[tokio::test]
async fn test_one_vote_per_user_across_emojis() {
    let h = harness(fireboard_settings(2, &["🔥", "⭐"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");

    h.react(message_id, BOB, "🔥").await;
    h.react(message_id, BOB, "⭐").await;
    assert!(h.entry(message_id).await.is_none());

    h.react(message_id, CAROL, "⭐").await;
    let entry = h.entry(message_id).await.expect("two distinct voters");
    assert_eq!(*entry.valid_reaction_count(), 2);
}

#[tokio::test]
async fn test_unconfigured_emoji_is_ignored() {
    let h = harness(fireboard_settings(1, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");

    h.react(message_id, BOB, "😀").await;

    assert!(h.discord.mirrors().is_empty());
}

#[tokio::test]
async fn test_remove_never_creates_an_entry() {
    let h = harness(fireboard_settings(2, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");
    for user in [BOB, CAROL, DAVE] {
        h.discord.react(message_id, "🔥", user);
    }

    h.unreact(message_id, DAVE, "🔥").await;

    assert!(h.entry(message_id).await.is_none());
    assert!(h.discord.mirrors().is_empty());
}

#[tokio::test]
async fn test_missing_mirror_is_recreated_and_repointed() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, entry) = h.on_board(1_000).await;
    h.discord.delete_externally(*entry.mirror_message_id());

    h.react(message_id, ERIN, "🔥").await;

    let updated = h.entry(message_id).await.expect("entry kept");
    assert_ne!(updated.mirror_message_id(), entry.mirror_message_id());
    assert!(h.discord.mirror(*updated.mirror_message_id()).is_some());
    assert_eq!(h.discord.mirrors().len(), 1);
}

#[tokio::test]
async fn test_source_delete_removes_mirror_and_entry() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, entry) = h.on_board(1_000).await;

    h.engine.handle_message_delete(GENERAL, message_id).await;

    assert!(h.entry(message_id).await.is_none());
    assert_eq!(h.discord.deleted(), vec![*entry.mirror_message_id()]);
}

#[tokio::test]
async fn test_delete_of_unmirrored_message_is_a_no_op() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "quiet");

    h.engine.handle_message_delete(GENERAL, message_id).await;

    assert!(h.discord.deleted().is_empty());
}

#[tokio::test]
async fn test_bulk_delete_removes_each_entry() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (first, _) = h.on_board(1_000).await;
    let (second, _) = h.on_board(1_001).await;
    let bystander = h.discord.post(GENERAL, 1_002, "unrelated");

    h.engine
        .handle_message_delete_bulk(GENERAL, &[first, second, bystander])
        .await;

    assert!(h.store.is_empty().await);
    assert_eq!(h.discord.deleted().len(), 2);
}

#[tokio::test]
async fn test_deleted_mirror_keeps_entry_until_refresh() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, entry) = h.on_board(1_000).await;

    h.discord.delete_externally(*entry.mirror_message_id());
    h.engine
        .handle_message_delete(FIREBOARD, *entry.mirror_message_id())
        .await;
    assert!(h.entry(message_id).await.is_some());

    let summary = h.engine.refresh_all_entries().await;

    assert_eq!(
        summary,
        RefreshSummary {
            refreshed: 1,
            removed: 0
        }
    );
    let updated = h.entry(message_id).await.expect("entry kept");
    assert!(h.discord.mirror(*updated.mirror_message_id()).is_some());
}

#[tokio::test]
async fn test_refresh_all_removes_entries_with_missing_source() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, entry) = h.on_board(1_000).await;
    h.discord.delete_externally(message_id);

    let summary = h.engine.refresh_all_entries().await;

    assert_eq!(
        summary,
        RefreshSummary {
            refreshed: 0,
            removed: 1
        }
    );
    assert!(h.store.is_empty().await);
    assert_eq!(h.discord.deleted(), vec![*entry.mirror_message_id()]);
}

#[tokio::test]
async fn test_refresh_all_removes_entries_below_threshold() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, _) = h.on_board(1_000).await;
    // Votes vanish while the bot is offline.
    h.discord.unreact(message_id, "🔥", BOB);
    h.discord.unreact(message_id, "🔥", CAROL);

    let summary = h.engine.refresh_all_entries().await;

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.refreshed, 0);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_refresh_all_follows_moved_source_and_backfills_channel() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, _) = h.on_board(1_000).await;
    h.discord.move_message(message_id, MEMES);

    let summary = h.engine.refresh_all_entries().await;

    assert_eq!(summary.refreshed, 1);
    assert_eq!(h.discord.searches(), 1);
    let entry = h.entry(message_id).await.expect("entry kept");
    assert_eq!(*entry.source_channel_id(), Some(MEMES));
}

#[tokio::test]
async fn test_refresh_all_backfills_legacy_entry_without_channel() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "old post");
    for user in [BOB, CAROL, DAVE] {
        h.discord.react(message_id, "🔥", user);
    }
    let source = h
        .discord
        .fetch_message(GENERAL, message_id)
        .await
        .expect("source");
    let reactions = h.engine.valid_reactions(&source, None);
    let mirror_id = h
        .discord
        .send_mirror(FIREBOARD, &render(&source, &reactions, h.engine.settings()))
        .await
        .expect("mirror");
    h.store
        .create_or_get(NewFireboardEntry {
            source_message_id: message_id,
            source_channel_id: None,
            mirror_message_id: mirror_id,
            author_id: AUTHOR,
            valid_reaction_count: 3,
        })
        .await
        .expect("legacy row");

    let summary = h.engine.refresh_all_entries().await;

    assert_eq!(summary.refreshed, 1);
    let entry = h.entry(message_id).await.expect("entry kept");
    assert_eq!(*entry.source_channel_id(), Some(GENERAL));
    assert_eq!(*entry.mirror_message_id(), mirror_id);
}

#[tokio::test]
async fn test_refresh_all_skips_busy_entries() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, _) = h.on_board(1_000).await;

    let _guard = h.engine.slots().try_acquire(message_id).expect("slot free");
    let summary = h.engine.refresh_all_entries().await;

    assert_eq!(summary, RefreshSummary::default());
}

#[tokio::test]
async fn test_refresh_message_statuses() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let popular = h.discord.post(GENERAL, 1_000, "popular");
    for user in [BOB, CAROL, DAVE] {
        h.discord.react(popular, "🔥", user);
    }
    let quiet = h.discord.post(GENERAL, 1_001, "quiet");
    h.discord.react(quiet, "🔥", BOB);

    assert_eq!(
        h.engine.refresh_message(GENERAL, MessageId::new(4_242)).await,
        RefreshStatus::NotFound
    );
    assert_eq!(
        h.engine.refresh_message(GENERAL, quiet).await,
        RefreshStatus::NotEligible
    );
    assert_eq!(
        h.engine.refresh_message(GENERAL, popular).await,
        RefreshStatus::Added
    );
    assert_eq!(
        h.engine.refresh_message(GENERAL, popular).await,
        RefreshStatus::Updated
    );

    h.discord.delete_externally(popular);
    assert_eq!(
        h.engine.refresh_message(GENERAL, popular).await,
        RefreshStatus::Deleted
    );
}

#[tokio::test]
async fn test_clearing_all_reactions_removes_mirror() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, entry) = h.on_board(1_000).await;
    for user in [BOB, CAROL, DAVE] {
        h.discord.unreact(message_id, "🔥", user);
    }

    let status = h
        .engine
        .handle_reactions_cleared(GENERAL, message_id, None)
        .await;

    assert_eq!(status, RefreshStatus::Deleted);
    assert!(h.entry(message_id).await.is_none());
    assert_eq!(h.discord.deleted(), vec![*entry.mirror_message_id()]);
}

#[tokio::test]
async fn test_clearing_one_emoji_updates_remaining_count() {
    let h = harness(fireboard_settings(3, &["🔥", "👍"]));
    let (message_id, _) = h.on_board(1_000).await;
    for user in [BOB, CAROL, DAVE, ERIN] {
        h.react(message_id, user, "👍").await;
    }
    for user in [BOB, CAROL, DAVE] {
        h.discord.unreact(message_id, "🔥", user);
    }

    let status = h
        .engine
        .handle_reactions_cleared(GENERAL, message_id, Some("🔥"))
        .await;

    assert_eq!(status, RefreshStatus::Updated);
    let entry = h.entry(message_id).await.expect("entry kept");
    assert_eq!(*entry.valid_reaction_count(), 4);
}

#[tokio::test]
async fn test_clearing_untracked_emoji_is_ignored() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, _) = h.on_board(1_000).await;

    let status = h
        .engine
        .handle_reactions_cleared(GENERAL, message_id, Some("😂"))
        .await;

    assert_eq!(status, RefreshStatus::Skipped);
    assert!(h.entry(message_id).await.is_some());
}

#[tokio::test]
async fn test_clearing_reactions_never_creates_an_entry() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "popular");
    for user in [BOB, CAROL, DAVE] {
        h.discord.react(message_id, "🔥", user);
    }

    let status = h
        .engine
        .handle_reactions_cleared(GENERAL, message_id, Some("👍"))
        .await;

    assert_eq!(status, RefreshStatus::Skipped);
    assert_eq!(
        h.engine
            .handle_reactions_cleared(GENERAL, message_id, None)
            .await,
        RefreshStatus::NotEligible
    );
    assert!(h.discord.mirrors().is_empty());
}

#[tokio::test]
async fn test_refresh_with_wrong_channel_keeps_live_entry() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, entry) = h.on_board(1_000).await;

    let status = h.engine.refresh_message(MEMES, message_id).await;

    assert_eq!(status, RefreshStatus::Updated);
    let kept = h.entry(message_id).await.expect("entry kept");
    assert_eq!(*kept.mirror_message_id(), *entry.mirror_message_id());
    assert_eq!(*kept.source_channel_id(), Some(GENERAL));
    assert!(h.discord.deleted().is_empty());
    assert!(h.discord.mirror(*entry.mirror_message_id()).is_some());
}

#[tokio::test]
async fn test_refresh_with_wrong_channel_finds_moved_source() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, _) = h.on_board(1_000).await;
    h.discord.move_message(message_id, MEMES);

    let status = h.engine.refresh_message(GENERAL, message_id).await;

    assert_eq!(status, RefreshStatus::Updated);
    assert_eq!(h.discord.searches(), 1);
    let entry = h.entry(message_id).await.expect("entry kept");
    assert_eq!(*entry.source_channel_id(), Some(MEMES));
}

#[tokio::test]
async fn test_repeated_refresh_renders_identical_content() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, entry) = h.on_board(1_000).await;
    let before = h
        .discord
        .mirror(*entry.mirror_message_id())
        .expect("mirror")
        .content;

    h.engine.refresh_message(GENERAL, message_id).await;
    h.engine.refresh_message(GENERAL, message_id).await;

    let after = h.discord.mirror(*entry.mirror_message_id()).expect("mirror");
    assert_eq!(after.content, before);
    assert_eq!(after.edits, 2);
}

#[tokio::test]
async fn test_reactions_inside_fireboard_channel_are_ignored() {
    let h = harness(fireboard_settings(1, &["🔥"]));
    let message_id = h.discord.post(FIREBOARD, 1_000, "a mirror");
    h.discord.react(message_id, "🔥", BOB);

    let add = event(ReactionAction::Add, FIREBOARD, message_id, BOB, "🔥");
    h.engine.handle_reaction_add(&add).await;

    assert!(h.discord.mirrors().is_empty());
    assert_eq!(
        h.engine.refresh_message(FIREBOARD, message_id).await,
        RefreshStatus::Skipped
    );
}

#[tokio::test]
async fn test_disabled_fireboard_does_nothing() {
    let settings = FireboardSettingsBuilder::default()
        .enabled(false)
        .channel_id(Some(FIREBOARD))
        .threshold(1u32)
        .build()
        .expect("settings");
    let h = harness(settings);
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");

    h.react(message_id, BOB, "🔥").await;

    assert!(h.discord.mirrors().is_empty());
    assert_eq!(h.discord.channel_lookups(), 0);
    assert_eq!(
        h.engine.refresh_message(GENERAL, message_id).await,
        RefreshStatus::Skipped
    );
    assert_eq!(h.engine.refresh_all_entries().await, RefreshSummary::default());
}

#[tokio::test]
async fn test_destination_failure_is_not_cached() {
    let h = harness(fireboard_settings(1, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");
    h.discord.react(message_id, "🔥", BOB);
    h.discord.remove_channel(FIREBOARD);

    assert_eq!(
        h.engine.refresh_message(GENERAL, message_id).await,
        RefreshStatus::Skipped
    );

    h.discord.add_channel(FIREBOARD, "fireboard");
    assert_eq!(
        h.engine.refresh_message(GENERAL, message_id).await,
        RefreshStatus::Added
    );
    h.engine.refresh_message(GENERAL, message_id).await;
    assert_eq!(h.discord.channel_lookups(), 2);
}

#[tokio::test]
async fn test_busy_message_drops_reaction_event() {
    let h = harness(fireboard_settings(1, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");

    let guard = h.engine.slots().try_acquire(message_id).expect("slot free");
    h.react(message_id, BOB, "🔥").await;
    assert!(h.discord.mirrors().is_empty());

    drop(guard);
    h.react(message_id, CAROL, "🔥").await;
    assert_eq!(h.discord.mirrors().len(), 1);
}

#[tokio::test]
async fn test_concurrent_reactions_post_one_mirror() {
    let h = harness(fireboard_settings(1, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");
    h.discord.react(message_id, "🔥", BOB);
    h.discord.react(message_id, "🔥", CAROL);
    h.discord.set_fetch_delay(Duration::from_millis(30));

    let first = event(ReactionAction::Add, GENERAL, message_id, BOB, "🔥");
    let second = event(ReactionAction::Add, GENERAL, message_id, CAROL, "🔥");
    tokio::join!(
        h.engine.handle_reaction_add(&first),
        h.engine.handle_reaction_add(&second)
    );

    assert_eq!(h.discord.mirrors().len(), 1);
    assert_eq!(h.store.len().await, 1);
    assert!(h.engine.slots().is_empty());
}

#[tokio::test]
async fn test_delete_waits_for_in_flight_pass() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, _) = h.on_board(1_000).await;

    let guard = h.engine.slots().try_acquire(message_id).expect("slot free");
    let release = async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);
    };
    tokio::join!(h.engine.handle_message_delete(GENERAL, message_id), release);

    assert!(h.entry(message_id).await.is_none());
}

#[tokio::test]
async fn test_unavailable_store_leaves_platform_untouched() {
    let h = harness(fireboard_settings(1, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");
    h.store.set_available(false);

    h.react(message_id, BOB, "🔥").await;

    assert!(h.discord.mirrors().is_empty());
    assert_eq!(h.engine.stats().await, None);
    assert!(h.engine.recent_entries(5).await.is_empty());
}

#[tokio::test]
async fn test_transient_edit_failure_leaves_entry_unchanged() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, _) = h.on_board(1_000).await;

    h.discord.fail("edit_mirror");
    h.react(message_id, ERIN, "🔥").await;
    let entry = h.entry(message_id).await.expect("entry kept");
    assert_eq!(*entry.valid_reaction_count(), 3);
    assert_eq!(h.discord.mirrors().len(), 1);

    h.discord.recover("edit_mirror");
    assert_eq!(
        h.engine.refresh_message(GENERAL, message_id).await,
        RefreshStatus::Updated
    );
    let entry = h.entry(message_id).await.expect("entry kept");
    assert_eq!(*entry.valid_reaction_count(), 4);
}

#[tokio::test]
async fn test_undeletable_mirror_keeps_entry_for_retry() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let (message_id, _) = h.on_board(1_000).await;

    h.discord.fail("delete_message");
    h.unreact(message_id, BOB, "🔥").await;
    assert!(h.entry(message_id).await.is_some());

    h.discord.recover("delete_message");
    let summary = h.engine.refresh_all_entries().await;
    assert_eq!(summary.removed, 1);
    assert!(h.store.is_empty().await);
    assert!(h.discord.mirrors().is_empty());
}

#[tokio::test]
async fn test_failed_send_creates_nothing() {
    let h = harness(fireboard_settings(1, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");
    h.discord.fail("send_mirror");

    h.react(message_id, BOB, "🔥").await;

    assert!(h.store.is_empty().await);
}

/// Store that hides existing entries from `get`, to force the create race.
struct BlindStore {
    inner: Arc<MemoryEntryStore>,
    fail_create: bool,
}

#[async_trait]
impl EntryStore for BlindStore {
    async fn get(&self, _source_message_id: MessageId) -> DatabaseResult<Option<FireboardEntry>> {
        Ok(None)
    }

    async fn find_by_mirror(
        &self,
        mirror_message_id: MessageId,
    ) -> DatabaseResult<Option<FireboardEntry>> {
        self.inner.find_by_mirror(mirror_message_id).await
    }

    async fn create_or_get(&self, entry: NewFireboardEntry) -> DatabaseResult<CreateOutcome> {
        if self.fail_create {
            return Err(DatabaseError::new(DatabaseErrorKind::Connection(
                "connection reset".to_string(),
            )));
        }
        self.inner.create_or_get(entry).await
    }

    async fn update(
        &self,
        source_message_id: MessageId,
        changes: EntryChanges,
    ) -> DatabaseResult<bool> {
        self.inner.update(source_message_id, changes).await
    }

    async fn delete(&self, entry: &FireboardEntry) -> DatabaseResult<bool> {
        self.inner.delete(entry).await
    }

    async fn list(&self, query: EntryQuery) -> DatabaseResult<Vec<FireboardEntry>> {
        self.inner.list(query).await
    }

    async fn stats(&self) -> DatabaseResult<EntryStats> {
        self.inner.stats().await
    }
}

#[tokio::test]
async fn test_lost_create_race_deletes_orphan_mirror() {
    let discord = Arc::new(FakeDiscord::new());
    let inner = Arc::new(MemoryEntryStore::new());
    let message_id = discord.post(GENERAL, 1_000, "hot take");
    discord.react(message_id, "🔥", BOB);
    inner
        .create_or_get(NewFireboardEntry {
            source_message_id: message_id,
            source_channel_id: Some(GENERAL),
            mirror_message_id: MessageId::new(77),
            author_id: AUTHOR,
            valid_reaction_count: 1,
        })
        .await
        .expect("winner");
    let store = Arc::new(BlindStore {
        inner: inner.clone(),
        fail_create: false,
    });
    let engine = FireboardEngine::new(fireboard_settings(1, &["🔥"]), store, discord.clone());

    let add = event(ReactionAction::Add, GENERAL, message_id, BOB, "🔥");
    engine.handle_reaction_add(&add).await;

    assert!(discord.mirrors().is_empty());
    assert_eq!(discord.deleted().len(), 1);
    let entry = inner.get(message_id).await.expect("store").expect("winner kept");
    assert_eq!(*entry.mirror_message_id(), MessageId::new(77));
}

#[tokio::test]
async fn test_failed_store_write_deletes_posted_mirror() {
    let discord = Arc::new(FakeDiscord::new());
    let inner = Arc::new(MemoryEntryStore::new());
    let message_id = discord.post(GENERAL, 1_000, "hot take");
    discord.react(message_id, "🔥", BOB);
    let store = Arc::new(BlindStore {
        inner: inner.clone(),
        fail_create: true,
    });
    let engine = FireboardEngine::new(fireboard_settings(1, &["🔥"]), store, discord.clone());

    assert_eq!(
        engine.refresh_message(GENERAL, message_id).await,
        RefreshStatus::Skipped
    );
    assert!(discord.mirrors().is_empty());
    assert!(inner.is_empty().await);
}

#[tokio::test]
async fn test_add_to_fireboard_checks_threshold_and_existing_entry() {
    let h = harness(fireboard_settings(2, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");
    h.discord.react(message_id, "🔥", BOB);
    let source = h
        .discord
        .fetch_message(GENERAL, message_id)
        .await
        .expect("source");
    let reactions = h.engine.valid_reactions(&source, None);
    assert!(!h.engine.add_to_fireboard(&source, &reactions).await);

    h.discord.react(message_id, "🔥", CAROL);
    let source = h
        .discord
        .fetch_message(GENERAL, message_id)
        .await
        .expect("source");
    let reactions = h.engine.valid_reactions(&source, None);
    assert!(h.engine.add_to_fireboard(&source, &reactions).await);
    assert!(!h.engine.add_to_fireboard(&source, &reactions).await);
    assert_eq!(h.discord.mirrors().len(), 1);
}

#[tokio::test]
async fn test_valid_reactions_author_override() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    let message_id = h.discord.post(GENERAL, 1_000, "hot take");
    h.discord.react(message_id, "🔥", AUTHOR);
    h.discord.react(message_id, "🔥", BOB);
    let source = h
        .discord
        .fetch_message(GENERAL, message_id)
        .await
        .expect("source");

    assert_eq!(h.engine.valid_reactions(&source, None)[0].count, 1);
    assert_eq!(h.engine.valid_reactions(&source, Some(false))[0].count, 2);
    assert_eq!(h.engine.valid_emoji_list(), ["🔥".to_string()]);
}

#[tokio::test]
async fn test_stats_and_recent_entries() {
    let h = harness(fireboard_settings(3, &["🔥"]));
    h.on_board(1_000).await;
    let (newest, _) = h.on_board(1_001).await;

    let stats = h.engine.stats().await.expect("stats");
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.recent_entries, 2);

    let recent = h.engine.recent_entries(1).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(*recent[0].source_message_id(), newest);
}
