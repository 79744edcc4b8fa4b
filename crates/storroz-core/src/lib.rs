//! Storroz Core - Entity records and shared primitives
//!
//! This crate defines the vocabulary the rest of Storroz speaks:
//! typed entity ids, the entity records themselves (users, posts,
//! hashtags, comments, notifications), the error taxonomy every core
//! operation reports through, and the tokenizer the search index and
//! hashtag normalization share.
//!
//! Nothing here holds state. The stores and indexes live in
//! `storroz-graph`; the concurrency boundary lives in
//! `storroz-service`.

mod entity;
mod error;
mod ids;
pub mod token;

pub use entity::{
    Comment, Hashtag, NewPost, NewUser, Notification, NotificationKind, Post, PostKind,
    ProfileUpdate, Subject, User,
};
pub use error::{CoreError, Result};
pub use ids::{CommentId, HashtagId, NotificationId, PostId, UserId};
