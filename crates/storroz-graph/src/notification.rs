//! Notification fan-out.
//!
//! The feed owns all Notification records. It observes edge-creation
//! events and produces one notification per event, targeted at the
//! affected user, suppressing self-directed activity. Each record
//! moves unread-to-read at most once.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use storroz_core::{
    CoreError, Notification, NotificationId, NotificationKind, Result, Subject, UserId,
};
use tracing::debug;

use crate::event::GraphEvent;

/// One page of a reverse-chronological notification listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    /// Pass back to continue the scan; `None` when exhausted.
    pub next_cursor: Option<NotificationId>,
}

/// Owns notification records and per-recipient feeds.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct NotificationFeed {
    records: HashMap<NotificationId, Notification>,
    /// Per recipient, notification ids in creation (= chronological)
    /// order. Listings walk this backwards.
    by_recipient: HashMap<UserId, Vec<NotificationId>>,
    next_id: u64,
}

impl NotificationFeed {
    /// Creates an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reacts to a graph event, producing a notification if the event
    /// kind fans out and the actor is not the recipient.
    pub fn observe(&mut self, event: &GraphEvent) -> Option<NotificationId> {
        let (recipient, actor, kind, subject, at) = match *event {
            GraphEvent::FollowCreated {
                follower,
                following,
                at,
            } => (
                following,
                follower,
                NotificationKind::Follow,
                Subject::User(follower),
                at,
            ),
            GraphEvent::LikeCreated {
                user,
                post,
                post_author,
                at,
            } => {
                if user == post_author {
                    debug!(%user, %post, "self-like, notification suppressed");
                    return None;
                }
                (
                    post_author,
                    user,
                    NotificationKind::Like,
                    Subject::Post(post),
                    at,
                )
            }
            GraphEvent::CommentCreated {
                id,
                author,
                post_author,
                ..
            } if author == post_author => {
                debug!(comment = %id, "self-comment, notification suppressed");
                return None;
            }
            GraphEvent::CommentCreated {
                id,
                author,
                post_author,
                at,
                ..
            } => (
                post_author,
                author,
                NotificationKind::Comment,
                Subject::Comment(id),
                at,
            ),
            _ => return None,
        };

        if recipient == actor {
            return None;
        }

        self.next_id += 1;
        let id = NotificationId(self.next_id);
        self.records.insert(
            id,
            Notification {
                id,
                recipient,
                actor,
                kind,
                subject,
                created_at: at,
                read: false,
            },
        );
        self.by_recipient.entry(recipient).or_default().push(id);

        debug!(notification = %id, %recipient, %actor, %kind, "notification created");
        Some(id)
    }

    /// Lists notifications for `user` newest-first.
    ///
    /// `cursor` continues a previous page: only ids strictly below it
    /// are returned. Ids are allocated monotonically, so descending
    /// id order is reverse-chronological order.
    pub fn list(
        &self,
        user: UserId,
        cursor: Option<NotificationId>,
        limit: usize,
    ) -> NotificationPage {
        let feed = self.by_recipient.get(&user);
        let mut items: Vec<Notification> = feed
            .map(|ids| {
                ids.iter()
                    .rev()
                    .filter(|id| cursor.map_or(true, |c| **id < c))
                    .take(limit)
                    .map(|id| self.records[id].clone())
                    .collect()
            })
            .unwrap_or_default();

        // More remain only if the page filled up and the oldest item
        // is not the head of the feed.
        let next_cursor = match items.last() {
            Some(last) if items.len() == limit => {
                let head = feed.and_then(|ids| ids.first());
                (head != Some(&last.id)).then_some(last.id)
            }
            _ => None,
        };

        NotificationPage { items, next_cursor }
    }

    /// Number of unread notifications for `user`.
    pub fn unread_count(&self, user: UserId) -> usize {
        self.by_recipient
            .get(&user)
            .map(|ids| ids.iter().filter(|id| !self.records[id].read).count())
            .unwrap_or(0)
    }

    /// Marks a notification read.
    ///
    /// Fails `NotFound` if missing, `Forbidden` unless `caller` is
    /// the recipient. Re-marking an already-read record is a no-op
    /// success.
    pub fn mark_read(&mut self, id: NotificationId, caller: UserId) -> Result<()> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("notification", id))?;

        if record.recipient != caller {
            return Err(CoreError::Forbidden(format!(
                "notification {} does not belong to user {}",
                id, caller
            )));
        }

        record.read = true;
        Ok(())
    }

    /// Total notification count.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no notifications exist.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
