//! Discord snowflake identifiers.
//!
//! Snowflakes are `u64` on the wire and `BIGINT` in PostgreSQL. They never
//! exceed `i64::MAX`, so the database conversions are lossless.

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
            derive_more::Display,
            derive_more::From,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw snowflake.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Raw snowflake value.
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Value as stored in a `BIGINT` column.
            pub const fn to_db(self) -> i64 {
                self.0 as i64
            }

            /// Rebuild from a `BIGINT` column.
            pub const fn from_db(value: i64) -> Self {
                Self(value as u64)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }
    };
}

snowflake!(
    /// Identifier of a Discord message.
    MessageId
);
snowflake!(
    /// Identifier of a Discord channel.
    ChannelId
);
snowflake!(
    /// Identifier of a Discord user.
    UserId
);
snowflake!(
    /// Identifier of a Discord guild (server).
    GuildId
);
snowflake!(
    /// Identifier of a guild role.
    RoleId
);
