//! The social service.
//!
//! Every core operation from the external contract lives here as an
//! async method. Mutations acquire shard locks for the entity ids
//! they touch (ascending shard order, bounded wait), validate every
//! invariant before mutating anything, commit the edge and its
//! notification together, and hand aggregate updates to the worker
//! queue.

use crate::config::ServiceConfig;
use chrono::Utc;
use std::sync::Arc;
use storroz_core::{
    Comment, CommentId, CoreError, HashtagId, NewPost, NewUser, NotificationId, Post, PostId,
    ProfileUpdate, Result, User, UserId,
};
use storroz_graph::{
    Engagement, EntityStore, FollowEntry, GraphEvent, NotificationFeed, NotificationPage,
    SearchCatalog, SearchHit, Snapshot, SocialGraph, TrendingAggregator, TrendingHashtag,
};
use tokio::sync::{mpsc, oneshot, Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Messages consumed by the aggregate worker.
enum WorkerMsg {
    Event(GraphEvent),
    /// Acknowledged once every message queued before it is applied.
    Flush(oneshot::Sender<()>),
}

struct Inner {
    config: ServiceConfig,
    /// Shard locks serializing mutations per entity id.
    shards: Vec<Mutex<()>>,
    entities: RwLock<EntityStore>,
    graph: RwLock<SocialGraph>,
    notifications: RwLock<NotificationFeed>,
    trending: RwLock<TrendingAggregator>,
    search: RwLock<SearchCatalog>,
}

impl Inner {
    fn new(config: ServiceConfig, snapshot: Snapshot) -> Self {
        // At least one shard, so the modulo in lock_shards is total.
        let shards = (0..config.shard_count.max(1)).map(|_| Mutex::new(())).collect();
        Self {
            config,
            shards,
            entities: RwLock::new(snapshot.entities),
            graph: RwLock::new(snapshot.graph),
            notifications: RwLock::new(snapshot.notifications),
            trending: RwLock::new(snapshot.trending),
            search: RwLock::new(snapshot.search),
        }
    }

    /// Acquires shard locks covering `ids`, ascending by shard index.
    ///
    /// Ids sharing a shard take one lock. A wait longer than the
    /// configured timeout fails the whole operation with `Busy`
    /// before anything is mutated.
    async fn lock_shards(&self, ids: &[u64]) -> Result<Vec<MutexGuard<'_, ()>>> {
        let mut indexes: Vec<usize> = ids
            .iter()
            .map(|id| (id % self.shards.len() as u64) as usize)
            .collect();
        indexes.sort_unstable();
        indexes.dedup();

        let mut guards = Vec::with_capacity(indexes.len());
        for index in indexes {
            let guard = timeout(self.config.lock_timeout, self.shards[index].lock())
                .await
                .map_err(|_| CoreError::Busy("shard lock timed out"))?;
            guards.push(guard);
        }
        Ok(guards)
    }

    /// Applies one event to the asynchronous aggregates. Append-only
    /// on both sides, so application order between events does not
    /// matter.
    async fn apply_aggregate(&self, event: &GraphEvent) {
        match event {
            GraphEvent::UserCreated { id, username } => {
                self.search.write().await.index_user(*id, username);
            }
            GraphEvent::PostCreated { id, content } => {
                self.search.write().await.index_post(*id, content);
            }
            GraphEvent::HashtagCreated { id, name } => {
                self.search.write().await.index_hashtag(*id, name);
            }
            GraphEvent::HashtagTagged { hashtag, at, .. } => {
                self.trending.write().await.record(*hashtag, *at);
            }
            // Edge events fan out synchronously in the notification
            // feed and carry nothing for the aggregates.
            _ => {}
        }
    }
}

/// The explicitly constructed core service.
///
/// Construct with [`SocialService::start`], share by reference (all
/// operations take `&self`), tear down with [`SocialService::shutdown`].
pub struct SocialService {
    inner: Arc<Inner>,
    aggregate_tx: mpsc::Sender<WorkerMsg>,
    worker: JoinHandle<()>,
}

impl SocialService {
    /// Starts an empty service.
    pub fn start(config: ServiceConfig) -> Self {
        Self::from_snapshot(Snapshot::default(), config)
    }

    /// Starts a service over previously persisted state.
    pub fn from_snapshot(snapshot: Snapshot, config: ServiceConfig) -> Self {
        let (aggregate_tx, mut rx) = mpsc::channel(config.aggregate_queue);
        let inner = Arc::new(Inner::new(config, snapshot));

        let worker_inner = inner.clone();
        let worker = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    WorkerMsg::Event(event) => worker_inner.apply_aggregate(&event).await,
                    WorkerMsg::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            debug!("aggregate worker stopped");
        });

        info!("social service started");
        Self {
            inner,
            aggregate_tx,
            worker,
        }
    }

    /// Stops the worker after it drains the queue.
    pub async fn shutdown(self) {
        drop(self.aggregate_tx);
        let _ = self.worker.await;
        info!("social service stopped");
    }

    /// Waits until every aggregate update queued so far is applied.
    /// Read-after-write on trending/search is exact afterwards.
    pub async fn quiesce(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.aggregate_tx.send(WorkerMsg::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Clones the complete current state for persistence.
    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            entities: self.inner.entities.read().await.clone(),
            graph: self.inner.graph.read().await.clone(),
            notifications: self.inner.notifications.read().await.clone(),
            trending: self.inner.trending.read().await.clone(),
            search: self.inner.search.read().await.clone(),
        }
    }

    /// Hands an event to the aggregate worker. A full queue degrades
    /// to inline application; events are never dropped.
    async fn dispatch_aggregate(&self, event: GraphEvent) {
        match self.aggregate_tx.try_send(WorkerMsg::Event(event)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(WorkerMsg::Event(event))) => {
                warn!("aggregate queue full, applying inline");
                self.inner.apply_aggregate(&event).await;
            }
            Err(_) => warn!("aggregate worker gone, event discarded"),
        }
    }

    // ── Entity operations ─────────────────────────────────────────

    /// Creates a user. Fails `Conflict` if the username or email is
    /// taken.
    pub async fn create_user(&self, new: NewUser) -> Result<UserId> {
        let username = new.username.clone();
        let id = self.inner.entities.write().await.create_user(new, Utc::now())?;
        self.dispatch_aggregate(GraphEvent::UserCreated { id, username })
            .await;
        Ok(id)
    }

    /// Gets a user record.
    pub async fn get_user(&self, id: UserId) -> Result<User> {
        self.inner.entities.read().await.get_user(id).cloned()
    }

    /// Updates bio, picture, and/or private flag.
    pub async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<()> {
        let _guards = self.inner.lock_shards(&[id.get()]).await?;
        self.inner.entities.write().await.update_profile(id, update)
    }

    /// Creates a post. Fails `NotFound` if the author is unknown.
    pub async fn create_post(&self, new: NewPost) -> Result<PostId> {
        let content = new.content.clone();
        let id = self.inner.entities.write().await.create_post(new, Utc::now())?;
        self.dispatch_aggregate(GraphEvent::PostCreated { id, content })
            .await;
        Ok(id)
    }

    /// Gets a post record.
    pub async fn get_post(&self, id: PostId) -> Result<Post> {
        self.inner.entities.read().await.get_post(id).cloned()
    }

    /// Updates a post's content and/or location. The search index is
    /// append-only per entity and is not re-tokenized.
    pub async fn update_post_content(
        &self,
        id: PostId,
        content: Option<String>,
        location: Option<String>,
    ) -> Result<()> {
        let _guards = self.inner.lock_shards(&[id.get()]).await?;
        self.inner
            .entities
            .write()
            .await
            .update_post_content(id, content, location)
    }

    // ── Follow edges ──────────────────────────────────────────────

    /// Creates a follow edge and notifies the followed user, as one
    /// unit.
    pub async fn add_follow(&self, follower: UserId, following: UserId) -> Result<()> {
        if follower == following {
            return Err(CoreError::InvalidArgument(format!(
                "user {} cannot follow themselves",
                follower
            )));
        }

        let _guards = self
            .inner
            .lock_shards(&[follower.get(), following.get()])
            .await?;

        {
            let entities = self.inner.entities.read().await;
            entities.get_user(follower)?;
            entities.get_user(following)?;
        }

        let at = Utc::now();
        self.inner.graph.write().await.add_follow(follower, following, at)?;
        self.inner
            .notifications
            .write()
            .await
            .observe(&GraphEvent::FollowCreated {
                follower,
                following,
                at,
            });
        Ok(())
    }

    /// Removes a follow edge. Fails `NotFound` if absent.
    pub async fn remove_follow(&self, follower: UserId, following: UserId) -> Result<()> {
        let _guards = self
            .inner
            .lock_shards(&[follower.get(), following.get()])
            .await?;
        self.inner.graph.write().await.remove_follow(follower, following)
    }

    /// Who follows `user`, with edge stamps.
    pub async fn followers_of(&self, user: UserId) -> Result<Vec<FollowEntry>> {
        let _guards = self.inner.lock_shards(&[user.get()]).await?;
        self.inner.entities.read().await.get_user(user)?;
        Ok(self.inner.graph.read().await.followers_of(user))
    }

    /// Who `user` follows, with edge stamps.
    pub async fn following_of(&self, user: UserId) -> Result<Vec<FollowEntry>> {
        let _guards = self.inner.lock_shards(&[user.get()]).await?;
        self.inner.entities.read().await.get_user(user)?;
        Ok(self.inner.graph.read().await.following_of(user))
    }

    // ── Like edges ────────────────────────────────────────────────

    /// Creates a like edge; the post author is notified unless they
    /// are the liker.
    pub async fn add_like(&self, user: UserId, post: PostId) -> Result<()> {
        let post_author = self.inner.entities.read().await.get_post(post)?.author;

        let _guards = self
            .inner
            .lock_shards(&[user.get(), post.get(), post_author.get()])
            .await?;

        {
            let entities = self.inner.entities.read().await;
            entities.get_user(user)?;
            entities.get_post(post)?;
        }

        let at = Utc::now();
        self.inner.graph.write().await.add_like(user, post, at)?;
        self.inner
            .notifications
            .write()
            .await
            .observe(&GraphEvent::LikeCreated {
                user,
                post,
                post_author,
                at,
            });
        Ok(())
    }

    /// Removes a like edge. Fails `NotFound` if absent.
    pub async fn remove_like(&self, user: UserId, post: PostId) -> Result<()> {
        let _guards = self.inner.lock_shards(&[user.get(), post.get()]).await?;
        self.inner.graph.write().await.remove_like(user, post)
    }

    // ── Comments ──────────────────────────────────────────────────

    /// Adds a comment and notifies the post author, as one unit.
    pub async fn add_comment(
        &self,
        author: UserId,
        post: PostId,
        content: String,
    ) -> Result<CommentId> {
        let post_author = self.inner.entities.read().await.get_post(post)?.author;

        let _guards = self
            .inner
            .lock_shards(&[author.get(), post.get(), post_author.get()])
            .await?;

        {
            let entities = self.inner.entities.read().await;
            entities.get_user(author)?;
            entities.get_post(post)?;
        }

        let at = Utc::now();
        let id = self
            .inner
            .graph
            .write()
            .await
            .add_comment(author, post, content, at);
        self.inner
            .notifications
            .write()
            .await
            .observe(&GraphEvent::CommentCreated {
                id,
                author,
                post,
                post_author,
                at,
            });
        Ok(id)
    }

    /// Comments on a post in chronological order.
    pub async fn list_comments(&self, post: PostId) -> Result<Vec<Comment>> {
        self.inner.entities.read().await.get_post(post)?;
        Ok(self
            .inner
            .graph
            .read()
            .await
            .comments_of(post)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Like and comment counts for a post.
    pub async fn post_engagement(&self, post: PostId) -> Result<Engagement> {
        self.inner.entities.read().await.get_post(post)?;
        Ok(self.inner.graph.read().await.engagement_of(post))
    }

    // ── Hashtag tagging ───────────────────────────────────────────

    /// Tags a post with hashtags by name.
    ///
    /// Names are normalized and deduplicated; missing hashtag records
    /// are created; already-present associations are silently skipped
    /// so the operation is idempotent as a whole. Returns the ids of
    /// every hashtag named, in first-occurrence order. Names that are
    /// empty after normalization are ignored.
    pub async fn tag_post(&self, post: PostId, names: &[String]) -> Result<Vec<HashtagId>> {
        let _guards = self.inner.lock_shards(&[post.get()]).await?;
        self.inner.entities.read().await.get_post(post)?;

        let at = Utc::now();
        let mut associated = Vec::new();

        for name in names {
            let interned = self.inner.entities.write().await.intern_hashtag(name);
            let (hashtag, created) = match interned {
                Ok(pair) => pair,
                // Normalizes to nothing; skip rather than fail the batch.
                Err(CoreError::InvalidArgument(_)) => continue,
                Err(other) => return Err(other),
            };

            if created {
                let normalized = self
                    .inner
                    .entities
                    .read()
                    .await
                    .get_hashtag(hashtag)?
                    .name
                    .clone();
                self.dispatch_aggregate(GraphEvent::HashtagCreated {
                    id: hashtag,
                    name: normalized,
                })
                .await;
            }

            if !associated.contains(&hashtag) {
                associated.push(hashtag);
            }

            if self.inner.graph.write().await.add_tag(post, hashtag) {
                self.dispatch_aggregate(GraphEvent::HashtagTagged {
                    post,
                    hashtag,
                    at,
                })
                .await;
            }
        }

        Ok(associated)
    }

    // ── Notifications ─────────────────────────────────────────────

    /// Lists notifications for `user` newest-first, from `cursor` if
    /// given.
    pub async fn list_notifications(
        &self,
        user: UserId,
        cursor: Option<NotificationId>,
        limit: usize,
    ) -> Result<NotificationPage> {
        let _guards = self.inner.lock_shards(&[user.get()]).await?;
        self.inner.entities.read().await.get_user(user)?;
        Ok(self.inner.notifications.read().await.list(user, cursor, limit))
    }

    /// Number of unread notifications for `user`.
    pub async fn unread_count(&self, user: UserId) -> Result<usize> {
        let _guards = self.inner.lock_shards(&[user.get()]).await?;
        self.inner.entities.read().await.get_user(user)?;
        Ok(self.inner.notifications.read().await.unread_count(user))
    }

    /// Marks a notification read. `NotFound` if missing, `Forbidden`
    /// unless `caller` is the recipient; idempotent once read.
    pub async fn mark_read(&self, id: NotificationId, caller: UserId) -> Result<()> {
        self.inner.notifications.write().await.mark_read(id, caller)
    }

    // ── Aggregate queries ─────────────────────────────────────────

    /// Top `k` trending hashtags over the live window.
    pub async fn trending(&self, k: usize) -> Vec<TrendingHashtag> {
        self.inner.trending.read().await.trending(k, Utc::now())
    }

    /// Searches usernames.
    pub async fn search_users(&self, query: &str) -> Result<Vec<SearchHit<UserId>>> {
        self.inner.search.read().await.search_users(query)
    }

    /// Searches post content.
    pub async fn search_posts(&self, query: &str) -> Result<Vec<SearchHit<PostId>>> {
        self.inner.search.read().await.search_posts(query)
    }

    /// Searches hashtag names.
    pub async fn search_hashtags(&self, query: &str) -> Result<Vec<SearchHit<HashtagId>>> {
        self.inner.search.read().await.search_hashtags(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn inner(shard_count: usize, lock_timeout: Duration) -> Inner {
        let config = ServiceConfig {
            shard_count,
            lock_timeout,
            ..Default::default()
        };
        Inner::new(config, Snapshot::default())
    }

    #[tokio::test]
    async fn test_contended_shard_lock_fails_busy() {
        let inner = inner(1, Duration::from_millis(10));

        let _held = inner.shards[0].lock().await;
        let err = inner.lock_shards(&[7]).await.unwrap_err();
        assert!(matches!(err, CoreError::Busy(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_uncontended_shard_lock_succeeds() {
        let inner = inner(4, Duration::from_millis(10));

        // Shard 3 is held; ids on shards 1 and 2 are unaffected.
        let _held = inner.shards[3].lock().await;
        let guards = inner.lock_shards(&[1, 2]).await.unwrap();
        assert_eq!(guards.len(), 2);
    }

    #[tokio::test]
    async fn test_same_shard_ids_take_one_lock() {
        let inner = inner(4, Duration::from_millis(10));

        // 1 and 5 share a shard; locking both must not self-deadlock.
        let guards = inner.lock_shards(&[1, 5, 2]).await.unwrap();
        assert_eq!(guards.len(), 2);
    }
}
