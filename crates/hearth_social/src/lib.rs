//! Fireboard, reaction roles and Discord integration for Hearth.
//!
//! # Architecture
//!
//! - **platform**: the [`ChatPlatform`] trait every remote call goes through
//! - **slots**: per-message exclusion for fireboard passes
//! - **fireboard**: the [`FireboardEngine`] state machine
//! - **roles**: the [`RoleMapper`] for the reaction-role menu
//! - **router**: the [`EventRouter`] that orders handlers
//! - **discord**: Serenity adapter, event handler and client (feature `discord`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dispatch;
mod fireboard;
mod platform;
mod roles;
mod router;
mod slots;

#[cfg(feature = "discord")]
pub mod discord;

pub use dispatch::{Dispatch, ReactionHandler};
pub use fireboard::{FireboardEngine, RefreshStatus, RefreshSummary};
pub use platform::{ChatPlatform, PlatformResult};
pub use roles::{MENU_STATE_KEY, MenuLocation, RoleMapper};
pub use router::EventRouter;
pub use slots::{ProcessingSlots, SlotGuard};
