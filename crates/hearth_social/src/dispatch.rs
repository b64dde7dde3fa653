//! Reaction handler contract.

use async_trait::async_trait;
use hearth_core::ReactionEvent;

/// What a handler did with a reaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Dispatch {
    /// The event belonged to this handler; later handlers must not see it.
    #[display("claimed")]
    Claimed,
    /// The event is not this handler's concern.
    #[display("not applicable")]
    NotApplicable,
}

impl Dispatch {
    /// Whether the event was claimed.
    pub fn is_claimed(self) -> bool {
        matches!(self, Self::Claimed)
    }
}

/// A component that reacts to reaction add/remove events.
///
/// Handlers are tried in priority order by the
/// [`EventRouter`](crate::EventRouter) until one returns [`Dispatch::Claimed`].
#[async_trait]
pub trait ReactionHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Handle one reaction event.
    async fn on_reaction(&self, event: &ReactionEvent) -> Dispatch;
}
