//! Graph events.
//!
//! Every entity creation and edge creation produces one of these.
//! The notification feed consumes the edge events synchronously; the
//! trending aggregator and search catalog consume their slice of the
//! stream asynchronously.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storroz_core::{CommentId, HashtagId, PostId, UserId};

/// An event emitted by a committed entity or edge mutation.
///
/// Externally tagged; internal tagging would not survive bincode if
/// events ever land in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphEvent {
    UserCreated {
        id: UserId,
        username: String,
    },
    PostCreated {
        id: PostId,
        content: String,
    },
    HashtagCreated {
        id: HashtagId,
        name: String,
    },
    FollowCreated {
        follower: UserId,
        following: UserId,
        at: DateTime<Utc>,
    },
    LikeCreated {
        user: UserId,
        post: PostId,
        /// Author of the liked post; the notification recipient.
        post_author: UserId,
        at: DateTime<Utc>,
    },
    CommentCreated {
        id: CommentId,
        author: UserId,
        post: PostId,
        /// Author of the commented post; the notification recipient.
        post_author: UserId,
        at: DateTime<Utc>,
    },
    HashtagTagged {
        post: PostId,
        hashtag: HashtagId,
        at: DateTime<Utc>,
    },
}
