//! Scripted in-memory Discord used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hearth_core::{
    AuthorSnapshot, ChannelId, ChannelSnapshot, FireboardSettings, FireboardSettingsBuilder,
    GuildId, MessageId, MessageSnapshot, MirrorContent, ReactionSnapshot, RoleId, UserId,
};
use hearth_error::{PlatformError, PlatformErrorKind};
use hearth_social::{ChatPlatform, PlatformResult};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const GUILD: GuildId = GuildId::new(1);
pub const GENERAL: ChannelId = ChannelId::new(100);
pub const MEMES: ChannelId = ChannelId::new(101);
pub const FIREBOARD: ChannelId = ChannelId::new(500);
pub const ROLES: ChannelId = ChannelId::new(600);

pub const AUTHOR: UserId = UserId::new(10);
pub const BOB: UserId = UserId::new(11);
pub const CAROL: UserId = UserId::new(12);
pub const DAVE: UserId = UserId::new(13);
pub const ERIN: UserId = UserId::new(14);

/// A mirror as the fake channel holds it.
#[derive(Debug, Clone)]
pub struct PostedMirror {
    pub channel_id: ChannelId,
    pub content: MirrorContent,
    pub edits: usize,
}

#[derive(Default)]
struct State {
    next_id: u64,
    channels: HashMap<ChannelId, ChannelSnapshot>,
    messages: HashMap<MessageId, MessageSnapshot>,
    mirrors: HashMap<MessageId, PostedMirror>,
    texts: HashMap<MessageId, (ChannelId, String)>,
    deleted: Vec<MessageId>,
    bot_reactions: Vec<(MessageId, String)>,
    guild_roles: HashSet<RoleId>,
    member_roles: HashMap<UserId, HashSet<RoleId>>,
    role_changes: usize,
    failing: HashSet<&'static str>,
    fetch_delay: Option<Duration>,
    channel_lookups: usize,
    searches: usize,
}

/// In-memory [`ChatPlatform`].
pub struct FakeDiscord {
    state: Mutex<State>,
}

impl FakeDiscord {
    /// A guild with two text channels, the fireboard and a roles channel.
    pub fn new() -> Self {
        let fake = Self {
            state: Mutex::new(State {
                next_id: 9_000,
                ..State::default()
            }),
        };
        for (id, name) in [
            (GENERAL, "general"),
            (MEMES, "memes"),
            (FIREBOARD, "fireboard"),
            (ROLES, "roles"),
        ] {
            fake.add_channel(id, name);
        }
        fake
    }

    pub fn add_channel(&self, id: ChannelId, name: &str) {
        self.state.lock().channels.insert(
            id,
            ChannelSnapshot {
                id,
                guild_id: Some(GUILD),
                name: name.to_string(),
            },
        );
    }

    pub fn remove_channel(&self, id: ChannelId) {
        self.state.lock().channels.remove(&id);
    }

    /// Post a source message by [`AUTHOR`].
    pub fn post(&self, channel_id: ChannelId, id: u64, content: &str) -> MessageId {
        let id = MessageId::new(id);
        self.state.lock().messages.insert(
            id,
            MessageSnapshot {
                id,
                channel_id,
                guild_id: Some(GUILD),
                author: AuthorSnapshot {
                    id: AUTHOR,
                    display_name: "Author".to_string(),
                    avatar_url: None,
                    bot: false,
                },
                content: content.to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
                attachments: Vec::new(),
                reactions: Vec::new(),
            },
        );
        id
    }

    pub fn react(&self, message_id: MessageId, emoji: &str, user: UserId) {
        let mut state = self.state.lock();
        let message = state.messages.get_mut(&message_id).expect("message exists");
        match message.reactions.iter_mut().find(|r| r.emoji == emoji) {
            Some(reaction) if !reaction.users.contains(&user) => reaction.users.push(user),
            Some(_) => {}
            None => message
                .reactions
                .push(ReactionSnapshot::new(emoji, vec![user])),
        }
    }

    pub fn unreact(&self, message_id: MessageId, emoji: &str, user: UserId) {
        let mut state = self.state.lock();
        let message = state.messages.get_mut(&message_id).expect("message exists");
        for reaction in &mut message.reactions {
            if reaction.emoji == emoji {
                reaction.users.retain(|u| *u != user);
            }
        }
        message.reactions.retain(|r| !r.users.is_empty());
    }

    /// Move a message to another channel, as if the stored channel were stale.
    pub fn move_message(&self, message_id: MessageId, channel_id: ChannelId) {
        let mut state = self.state.lock();
        if let Some(message) = state.messages.get_mut(&message_id) {
            message.channel_id = channel_id;
        }
    }

    /// Delete a message as a user would, without going through the bot.
    pub fn delete_externally(&self, message_id: MessageId) {
        let mut state = self.state.lock();
        state.messages.remove(&message_id);
        state.mirrors.remove(&message_id);
    }

    /// Make an operation fail with a transient error.
    pub fn fail(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.state.lock().failing.remove(operation);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        self.state.lock().fetch_delay = Some(delay);
    }

    pub fn add_guild_role(&self, role: RoleId) {
        self.state.lock().guild_roles.insert(role);
    }

    pub fn give_role(&self, user: UserId, role: RoleId) {
        self.state
            .lock()
            .member_roles
            .entry(user)
            .or_default()
            .insert(role);
    }

    pub fn has_role(&self, user: UserId, role: RoleId) -> bool {
        self.state
            .lock()
            .member_roles
            .get(&user)
            .is_some_and(|roles| roles.contains(&role))
    }

    pub fn role_changes(&self) -> usize {
        self.state.lock().role_changes
    }

    pub fn mirrors(&self) -> HashMap<MessageId, PostedMirror> {
        self.state.lock().mirrors.clone()
    }

    pub fn mirror(&self, id: MessageId) -> Option<PostedMirror> {
        self.state.lock().mirrors.get(&id).cloned()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.state.lock().deleted.clone()
    }

    pub fn text(&self, id: MessageId) -> Option<(ChannelId, String)> {
        self.state.lock().texts.get(&id).cloned()
    }

    pub fn bot_reactions(&self) -> Vec<(MessageId, String)> {
        self.state.lock().bot_reactions.clone()
    }

    pub fn channel_lookups(&self) -> usize {
        self.state.lock().channel_lookups
    }

    pub fn searches(&self) -> usize {
        self.state.lock().searches
    }

    fn check(&self, operation: &'static str) -> PlatformResult<()> {
        if self.state.lock().failing.contains(operation) {
            Err(PlatformError::new(PlatformErrorKind::Remote(format!(
                "{operation} unavailable"
            ))))
        } else {
            Ok(())
        }
    }

    fn next_id(&self) -> MessageId {
        let mut state = self.state.lock();
        state.next_id += 1;
        MessageId::new(state.next_id)
    }
}

#[async_trait]
impl ChatPlatform for FakeDiscord {
    async fn fetch_channel(&self, channel_id: ChannelId) -> PlatformResult<ChannelSnapshot> {
        self.state.lock().channel_lookups += 1;
        self.check("fetch_channel")?;
        self.state
            .lock()
            .channels
            .get(&channel_id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("channel {channel_id}")))
    }

    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> PlatformResult<MessageSnapshot> {
        let delay = self.state.lock().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check("fetch_message")?;
        let state = self.state.lock();
        if !state.channels.contains_key(&channel_id) {
            return Err(PlatformError::not_found(format!("channel {channel_id}")));
        }
        state
            .messages
            .get(&message_id)
            .filter(|message| message.channel_id == channel_id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("message {message_id}")))
    }

    async fn search_message(&self, message_id: MessageId) -> PlatformResult<MessageSnapshot> {
        self.state.lock().searches += 1;
        self.check("search_message")?;
        self.state
            .lock()
            .messages
            .get(&message_id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("message {message_id}")))
    }

    async fn send_mirror(
        &self,
        channel_id: ChannelId,
        content: &MirrorContent,
    ) -> PlatformResult<MessageId> {
        self.check("send_mirror")?;
        let id = self.next_id();
        self.state.lock().mirrors.insert(
            id,
            PostedMirror {
                channel_id,
                content: content.clone(),
                edits: 0,
            },
        );
        Ok(id)
    }

    async fn edit_mirror(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
        content: &MirrorContent,
    ) -> PlatformResult<()> {
        self.check("edit_mirror")?;
        let mut state = self.state.lock();
        let mirror = state
            .mirrors
            .get_mut(&message_id)
            .ok_or_else(|| PlatformError::not_found(format!("message {message_id}")))?;
        mirror.content = content.clone();
        mirror.edits += 1;
        Ok(())
    }

    async fn send_text(&self, channel_id: ChannelId, text: &str) -> PlatformResult<MessageId> {
        self.check("send_text")?;
        let id = self.next_id();
        self.state
            .lock()
            .texts
            .insert(id, (channel_id, text.to_string()));
        Ok(id)
    }

    async fn delete_message(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
    ) -> PlatformResult<()> {
        self.check("delete_message")?;
        let mut state = self.state.lock();
        if state.mirrors.remove(&message_id).is_none() && state.texts.remove(&message_id).is_none()
        {
            return Err(PlatformError::not_found(format!("message {message_id}")));
        }
        state.deleted.push(message_id);
        Ok(())
    }

    async fn add_reaction(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> PlatformResult<()> {
        self.check("add_reaction")?;
        self.state
            .lock()
            .bot_reactions
            .push((message_id, emoji.to_string()));
        Ok(())
    }

    async fn member_roles(&self, _guild_id: GuildId, user_id: UserId) -> PlatformResult<Vec<RoleId>> {
        self.check("member_roles")?;
        Ok(self
            .state
            .lock()
            .member_roles
            .get(&user_id)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn add_member_role(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()> {
        self.check("add_member_role")?;
        let mut state = self.state.lock();
        state.role_changes += 1;
        state.member_roles.entry(user_id).or_default().insert(role_id);
        Ok(())
    }

    async fn remove_member_role(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> PlatformResult<()> {
        self.check("remove_member_role")?;
        let mut state = self.state.lock();
        state.role_changes += 1;
        if let Some(roles) = state.member_roles.get_mut(&user_id) {
            roles.remove(&role_id);
        }
        Ok(())
    }

    async fn role_exists(&self, _guild_id: GuildId, role_id: RoleId) -> PlatformResult<bool> {
        self.check("role_exists")?;
        Ok(self.state.lock().guild_roles.contains(&role_id))
    }
}

/// Fireboard settings pointing at [`FIREBOARD`].
pub fn fireboard_settings(threshold: u32, emojis: &[&str]) -> FireboardSettings {
    FireboardSettingsBuilder::default()
        .enabled(true)
        .channel_id(Some(FIREBOARD))
        .threshold(threshold)
        .emojis(emojis.iter().map(|e| e.to_string()).collect::<Vec<_>>())
        .exclude_author(true)
        .build()
        .expect("valid settings")
}
