//! The relationship graph.
//!
//! Maintains forward and reverse adjacency sets for each edge type
//! (follow, like, tag) plus comment records, so both directions of
//! any relationship resolve in time proportional to degree. A
//! mutation inserts or removes both sides of an index pair before
//! returning; no intermediate state ever escapes a method.
//!
//! Endpoint existence is validated by the caller against the
//! `EntityStore` before edges are added; this structure enforces the
//! edge-local invariants (no self-follow, at most one edge per pair).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use storroz_core::{Comment, CommentId, CoreError, HashtagId, PostId, Result, UserId};
use tracing::debug;

/// One entry in a follower or following listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEntry {
    pub user: UserId,
    pub since: DateTime<Utc>,
}

/// Like and comment counts for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: usize,
    pub comments: usize,
}

/// Adjacency indexes for every edge type.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SocialGraph {
    /// Forward follow index: who does X follow.
    following: HashMap<UserId, BTreeSet<UserId>>,
    /// Reverse follow index: who follows X.
    followers: HashMap<UserId, BTreeSet<UserId>>,
    /// Creation stamp per (follower, following) edge.
    follow_stamps: HashMap<(UserId, UserId), DateTime<Utc>>,

    /// Forward like index: which posts has X liked.
    liked_posts: HashMap<UserId, BTreeSet<PostId>>,
    /// Reverse like index: who liked post X.
    likers: HashMap<PostId, BTreeSet<UserId>>,
    like_stamps: HashMap<(UserId, PostId), DateTime<Utc>>,

    comments: HashMap<CommentId, Comment>,
    /// Comment ids per post in creation order.
    post_comments: HashMap<PostId, Vec<CommentId>>,
    next_comment: u64,

    /// Forward tag index: which hashtags does post X carry.
    post_tags: HashMap<PostId, BTreeSet<HashtagId>>,
    /// Reverse tag index: which posts carry hashtag X.
    tagged_posts: HashMap<HashtagId, BTreeSet<PostId>>,
}

impl SocialGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Follow edges ──────────────────────────────────────────────

    /// Adds a follow edge.
    ///
    /// Fails `InvalidArgument` on self-follow, `Conflict` if the edge
    /// already exists. Both index directions are updated together.
    pub fn add_follow(
        &mut self,
        follower: UserId,
        following: UserId,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if follower == following {
            return Err(CoreError::InvalidArgument(format!(
                "user {} cannot follow themselves",
                follower
            )));
        }
        if self.is_following(follower, following) {
            return Err(CoreError::Conflict(format!(
                "{} already follows {}",
                follower, following
            )));
        }

        self.following.entry(follower).or_default().insert(following);
        self.followers.entry(following).or_default().insert(follower);
        self.follow_stamps.insert((follower, following), at);

        debug!(%follower, %following, "follow edge created");
        Ok(())
    }

    /// Removes a follow edge. Fails `NotFound` if absent.
    pub fn remove_follow(&mut self, follower: UserId, following: UserId) -> Result<()> {
        if !self.is_following(follower, following) {
            return Err(CoreError::not_found("follow edge", follower));
        }

        if let Some(set) = self.following.get_mut(&follower) {
            set.remove(&following);
        }
        if let Some(set) = self.followers.get_mut(&following) {
            set.remove(&follower);
        }
        self.follow_stamps.remove(&(follower, following));
        Ok(())
    }

    /// True if `follower` follows `following`.
    pub fn is_following(&self, follower: UserId, following: UserId) -> bool {
        self.following
            .get(&follower)
            .is_some_and(|set| set.contains(&following))
    }

    /// Who follows `user`, with edge creation stamps.
    pub fn followers_of(&self, user: UserId) -> Vec<FollowEntry> {
        self.followers
            .get(&user)
            .map(|set| {
                set.iter()
                    .map(|&follower| FollowEntry {
                        user: follower,
                        since: self.follow_stamps[&(follower, user)],
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Who `user` follows, with edge creation stamps.
    pub fn following_of(&self, user: UserId) -> Vec<FollowEntry> {
        self.following
            .get(&user)
            .map(|set| {
                set.iter()
                    .map(|&following| FollowEntry {
                        user: following,
                        since: self.follow_stamps[&(user, following)],
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // ── Like edges ────────────────────────────────────────────────

    /// Adds a like edge. Self-like is permitted; duplicate likes
    /// fail `Conflict`.
    pub fn add_like(&mut self, user: UserId, post: PostId, at: DateTime<Utc>) -> Result<()> {
        if self.has_liked(user, post) {
            return Err(CoreError::Conflict(format!(
                "{} already liked post {}",
                user, post
            )));
        }

        self.liked_posts.entry(user).or_default().insert(post);
        self.likers.entry(post).or_default().insert(user);
        self.like_stamps.insert((user, post), at);

        debug!(%user, %post, "like edge created");
        Ok(())
    }

    /// Removes a like edge. Fails `NotFound` if absent.
    pub fn remove_like(&mut self, user: UserId, post: PostId) -> Result<()> {
        if !self.has_liked(user, post) {
            return Err(CoreError::not_found("like edge", post));
        }

        if let Some(set) = self.liked_posts.get_mut(&user) {
            set.remove(&post);
        }
        if let Some(set) = self.likers.get_mut(&post) {
            set.remove(&user);
        }
        self.like_stamps.remove(&(user, post));
        Ok(())
    }

    /// True if `user` has liked `post`.
    pub fn has_liked(&self, user: UserId, post: PostId) -> bool {
        self.liked_posts
            .get(&user)
            .is_some_and(|set| set.contains(&post))
    }

    /// Who liked `post`.
    pub fn likers_of(&self, post: PostId) -> Vec<UserId> {
        self.likers
            .get(&post)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    // ── Comments ──────────────────────────────────────────────────

    /// Records a comment. The caller has already validated that both
    /// the author and post exist.
    pub fn add_comment(
        &mut self,
        author: UserId,
        post: PostId,
        content: String,
        at: DateTime<Utc>,
    ) -> CommentId {
        self.next_comment += 1;
        let id = CommentId(self.next_comment);

        self.comments.insert(
            id,
            Comment {
                id,
                author,
                post,
                content,
                created_at: at,
            },
        );
        self.post_comments.entry(post).or_default().push(id);

        debug!(comment = %id, %author, %post, "comment created");
        id
    }

    /// Comments on `post` in chronological order.
    pub fn comments_of(&self, post: PostId) -> Vec<&Comment> {
        self.post_comments
            .get(&post)
            .map(|ids| ids.iter().map(|id| &self.comments[id]).collect())
            .unwrap_or_default()
    }

    /// Like and comment counts for a post.
    pub fn engagement_of(&self, post: PostId) -> Engagement {
        Engagement {
            likes: self.likers.get(&post).map_or(0, BTreeSet::len),
            comments: self.post_comments.get(&post).map_or(0, Vec::len),
        }
    }

    // ── Post↔hashtag associations ─────────────────────────────────

    /// Associates a hashtag with a post.
    ///
    /// Returns false without mutating if the association already
    /// exists; tagging is idempotent as a whole.
    pub fn add_tag(&mut self, post: PostId, hashtag: HashtagId) -> bool {
        let inserted = self.post_tags.entry(post).or_default().insert(hashtag);
        if inserted {
            self.tagged_posts.entry(hashtag).or_default().insert(post);
            debug!(%post, %hashtag, "tag association created");
        }
        inserted
    }

    /// Hashtags carried by `post`.
    pub fn tags_of(&self, post: PostId) -> Vec<HashtagId> {
        self.post_tags
            .get(&post)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Posts carrying `hashtag`.
    pub fn posts_tagged(&self, hashtag: HashtagId) -> Vec<PostId> {
        self.tagged_posts
            .get(&hashtag)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total follow edge count.
    pub fn follow_count(&self) -> usize {
        self.follow_stamps.len()
    }

    /// Total like edge count.
    pub fn like_count(&self) -> usize {
        self.like_stamps.len()
    }

    /// Total comment count.
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}
