//! The entity store.
//!
//! Owns User, Post, and Hashtag records and keeps the uniqueness
//! indexes (username, email, normalized hashtag name) in lockstep
//! with the record maps. Ids are sequential and never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use storroz_core::token::normalize_hashtag;
use storroz_core::{
    CoreError, Hashtag, HashtagId, NewPost, NewUser, Post, PostId, ProfileUpdate, Result, User,
    UserId,
};
use tracing::debug;

/// Holds user, post, and hashtag records with uniqueness indexes.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    users: HashMap<UserId, User>,
    posts: HashMap<PostId, Post>,
    hashtags: HashMap<HashtagId, Hashtag>,

    /// Maps usernames to user ids.
    by_username: HashMap<String, UserId>,
    /// Maps email addresses to user ids.
    by_email: HashMap<String, UserId>,
    /// Maps normalized hashtag names to hashtag ids.
    by_hashtag_name: HashMap<String, HashtagId>,

    next_user: u64,
    next_post: u64,
    next_hashtag: u64,
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a user record.
    ///
    /// Fails with `Conflict` if the username or email is taken. All
    /// checks run before any mutation.
    pub fn create_user(&mut self, new: NewUser, at: DateTime<Utc>) -> Result<UserId> {
        if self.by_username.contains_key(&new.username) {
            return Err(CoreError::Conflict(format!(
                "username '{}' already exists",
                new.username
            )));
        }
        if self.by_email.contains_key(&new.email) {
            return Err(CoreError::Conflict(format!(
                "email '{}' already exists",
                new.email
            )));
        }

        self.next_user += 1;
        let id = UserId(self.next_user);

        self.by_username.insert(new.username.clone(), id);
        self.by_email.insert(new.email.clone(), id);
        self.users.insert(
            id,
            User {
                id,
                username: new.username,
                email: new.email,
                password_hash: new.password_hash,
                profile_picture: None,
                bio: None,
                private: false,
                verified: false,
                created_at: at,
            },
        );

        debug!(user = %id, "created user");
        Ok(id)
    }

    /// Gets a user by id.
    pub fn get_user(&self, id: UserId) -> Result<&User> {
        self.users
            .get(&id)
            .ok_or_else(|| CoreError::not_found("user", id))
    }

    /// Looks up a user by username.
    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.by_username.get(username).and_then(|id| self.users.get(id))
    }

    /// Applies a profile update. `None` fields are left unchanged.
    pub fn update_profile(&mut self, id: UserId, update: ProfileUpdate) -> Result<()> {
        let user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("user", id))?;

        if let Some(bio) = update.bio {
            user.bio = Some(bio);
        }
        if let Some(picture) = update.profile_picture {
            user.profile_picture = Some(picture);
        }
        if let Some(private) = update.private {
            user.private = private;
        }
        Ok(())
    }

    /// Creates a post. Fails with `NotFound` if the author is unknown.
    pub fn create_post(&mut self, new: NewPost, at: DateTime<Utc>) -> Result<PostId> {
        if !self.users.contains_key(&new.author) {
            return Err(CoreError::not_found("user", new.author));
        }

        self.next_post += 1;
        let id = PostId(self.next_post);

        self.posts.insert(
            id,
            Post {
                id,
                author: new.author,
                kind: new.kind,
                content: new.content,
                location: new.location,
                created_at: at,
            },
        );

        debug!(post = %id, author = %new.author, "created post");
        Ok(id)
    }

    /// Gets a post by id.
    pub fn get_post(&self, id: PostId) -> Result<&Post> {
        self.posts
            .get(&id)
            .ok_or_else(|| CoreError::not_found("post", id))
    }

    /// Updates a post's content and/or location.
    pub fn update_post_content(
        &mut self,
        id: PostId,
        content: Option<String>,
        location: Option<String>,
    ) -> Result<()> {
        let post = self
            .posts
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("post", id))?;

        if let Some(content) = content {
            post.content = content;
        }
        if let Some(location) = location {
            post.location = Some(location);
        }
        Ok(())
    }

    /// Interns a hashtag by name, case-insensitively.
    ///
    /// Returns the id and whether a new record was created. Names
    /// differing only in case or a leading '#' resolve to one record.
    pub fn intern_hashtag(&mut self, name: &str) -> Result<(HashtagId, bool)> {
        let normalized = normalize_hashtag(name)
            .ok_or_else(|| CoreError::InvalidArgument(format!("empty hashtag name '{}'", name)))?;

        if let Some(&id) = self.by_hashtag_name.get(&normalized) {
            return Ok((id, false));
        }

        self.next_hashtag += 1;
        let id = HashtagId(self.next_hashtag);
        self.by_hashtag_name.insert(normalized.clone(), id);
        self.hashtags.insert(id, Hashtag { id, name: normalized });

        debug!(hashtag = %id, "created hashtag");
        Ok((id, true))
    }

    /// Gets a hashtag by id.
    pub fn get_hashtag(&self, id: HashtagId) -> Result<&Hashtag> {
        self.hashtags
            .get(&id)
            .ok_or_else(|| CoreError::not_found("hashtag", id))
    }

    /// Looks up a hashtag by name (normalized before lookup).
    pub fn hashtag_by_name(&self, name: &str) -> Option<&Hashtag> {
        let normalized = normalize_hashtag(name)?;
        self.by_hashtag_name
            .get(&normalized)
            .and_then(|id| self.hashtags.get(id))
    }

    /// True if the user id exists.
    pub fn user_exists(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// True if the post id exists.
    pub fn post_exists(&self, id: PostId) -> bool {
        self.posts.contains_key(&id)
    }

    /// Returns the number of users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Returns the number of posts.
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    /// Returns the number of hashtags.
    pub fn hashtag_count(&self) -> usize {
        self.hashtags.len()
    }
}
