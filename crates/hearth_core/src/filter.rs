//! Reaction filtering.
//!
//! Turns the raw reactions on a message into the qualifying breakdown the
//! fireboard uses. Each user is one vote: a user who reacted with several
//! valid emoji is counted once, under the first of them in configured order.

use crate::{MessageSnapshot, UserId, ValidReaction};
use std::collections::HashSet;

/// Whether a configured emoji matches an emoji found on a message.
///
/// Unicode emoji compare exactly. Custom emoji (`<:name:id>`, `<a:name:id>`)
/// also match when configured by bare name or by ID.
///
/// # Examples
///
/// ```
/// use hearth_core::emoji_matches;
///
/// assert!(emoji_matches("🔥", "🔥"));
/// assert!(emoji_matches("pog", "<:pog:123>"));
/// assert!(emoji_matches("123", "<a:pog:123>"));
/// assert!(!emoji_matches("👍", "🔥"));
/// ```
pub fn emoji_matches(configured: &str, actual: &str) -> bool {
    let configured = configured.trim();
    if configured == actual {
        return true;
    }

    match parse_custom_emoji(actual) {
        Some((name, id)) => configured == name || configured == id,
        None => false,
    }
}

/// Split `<:name:id>` / `<a:name:id>` into `(name, id)`.
fn parse_custom_emoji(emoji: &str) -> Option<(&str, &str)> {
    let inner = emoji.strip_prefix('<')?.strip_suffix('>')?;
    let inner = inner.strip_prefix('a').unwrap_or(inner);
    let inner = inner.strip_prefix(':')?;
    let (name, id) = inner.split_once(':')?;
    if name.is_empty() || id.is_empty() {
        return None;
    }
    Some((name, id))
}

/// Compute the qualifying reactions on a message.
///
/// Walks `valid_emojis` in order. For each one present on the message, every
/// reacting user not yet counted under an earlier emoji adds one to its count.
/// With `exclude_author` the author is skipped before the one-vote check, so
/// their reactions neither count nor claim a vote.
///
/// Returns one entry per emoji with at least one counted user, in configured
/// order, carrying the emoji as it appears on the message.
#[tracing::instrument(
    skip(message, valid_emojis),
    fields(message_id = %message.id, reactions = message.reactions.len())
)]
pub fn compute_valid_reactions(
    message: &MessageSnapshot,
    valid_emojis: &[String],
    exclude_author: bool,
) -> Vec<ValidReaction> {
    let author = message.author.id;
    let mut counted: HashSet<UserId> = HashSet::new();
    let mut breakdown = Vec::new();

    for valid in valid_emojis {
        let Some(reaction) = message
            .reactions
            .iter()
            .find(|reaction| emoji_matches(valid, &reaction.emoji))
        else {
            continue;
        };

        let mut count = 0u32;
        for user in &reaction.users {
            if exclude_author && *user == author {
                continue;
            }
            if counted.insert(*user) {
                count += 1;
            }
        }

        if count > 0 {
            breakdown.push(ValidReaction::new(reaction.emoji.clone(), count));
        }
    }

    tracing::trace!(
        emojis = breakdown.len(),
        voters = counted.len(),
        "Computed valid reactions"
    );
    breakdown
}

/// Total of a reaction breakdown.
pub fn calculate_total_count(reactions: &[ValidReaction]) -> u32 {
    reactions.iter().map(|reaction| reaction.count).sum()
}
