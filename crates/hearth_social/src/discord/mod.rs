//! Discord integration over Serenity.
//!
//! ## Adapter
//! - **platform**: [`SerenityPlatform`], the [`ChatPlatform`](crate::ChatPlatform)
//!   implementation over Serenity's HTTP client
//! - **convert**: Serenity models to and from Hearth snapshots
//!
//! ## Gateway
//! - **handler**: [`HearthHandler`], Serenity's `EventHandler` feeding the router
//! - **client**: [`HearthBot`], client setup and lifecycle
//!
//! # Usage
//!
//! ```rust,ignore
//! let platform = Arc::new(SerenityPlatform::new(&token));
//! let engine = Arc::new(FireboardEngine::new(settings, store, platform));
//! let router = Arc::new(EventRouter::new(engine));
//!
//! let mut bot = HearthBot::new(&token, HearthHandler::new(router, true)).await?;
//! bot.start().await?;
//! ```

mod client;
mod convert;
mod handler;
mod platform;

pub use client::HearthBot;
pub use convert::{emoji_key, mirror_embed, reaction_type};
pub use handler::HearthHandler;
pub use platform::SerenityPlatform;
