//! Typed entity ids.
//!
//! Every entity table is keyed by a sequential u64 allocated by its
//! owning store. Five id spaces coexist, so each gets its own newtype
//! rather than a shared alias; mixing a `PostId` into a follower set
//! should not compile.

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw id value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifies a user account.
    UserId
);
entity_id!(
    /// Identifies a post.
    PostId
);
entity_id!(
    /// Identifies a hashtag record.
    HashtagId
);
entity_id!(
    /// Identifies a comment.
    CommentId
);
entity_id!(
    /// Identifies a notification.
    NotificationId
);
