//! Entity records.
//!
//! These mirror the persisted tables: users, posts, hashtags,
//! comments, and notifications. Records are plain data; invariants
//! (uniqueness, referential existence) are enforced by the stores
//! that own them.

use crate::ids::{CommentId, HashtagId, NotificationId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Globally unique handle.
    pub username: String,
    /// Globally unique contact address.
    pub email: String,
    /// Opaque to this core; verification happens at the boundary.
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    /// Whether the profile is visible only to approved followers.
    pub private: bool,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Mutable slice of a user profile.
///
/// `None` fields are left unchanged. Username, email, and the
/// verified flag are not updatable through this path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub private: Option<bool>,
}

/// The media kind of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Photo,
    Video,
    Text,
}

impl std::fmt::Display for PostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Text => "text",
        };
        write!(f, "{}", s)
    }
}

/// A post authored by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    pub kind: PostKind,
    pub content: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub author: UserId,
    pub kind: PostKind,
    pub content: String,
    pub location: Option<String>,
}

/// A hashtag record. The name is stored case-normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hashtag {
    pub id: HashtagId,
    pub name: String,
}

/// A comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: UserId,
    pub post: PostId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// What kind of activity produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    Like,
    Comment,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Follow => "follow",
            Self::Like => "like",
            Self::Comment => "comment",
        };
        write!(f, "{}", s)
    }
}

/// The entity a notification points at.
///
/// Externally tagged so it serializes under non-self-describing
/// formats; snapshots pass through bincode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    User(UserId),
    Post(PostId),
    Comment(CommentId),
}

/// A notification produced by edge fan-out.
///
/// `recipient` is never `actor`; self-directed activity is suppressed
/// before a record is created. The read flag moves unread-to-read
/// exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub actor: UserId,
    pub kind: NotificationKind,
    pub subject: Subject,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}
