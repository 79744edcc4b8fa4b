//! End-to-end tests over the full service: entity creation, edge
//! mutation, fan-out, aggregates, and persistence.

use storroz_core::{CoreError, NewPost, NewUser, NotificationKind, PostKind, UserId};
use storroz_graph::SnapshotStore;
use storroz_service::{ServiceConfig, SocialService};

fn user(name: &str) -> NewUser {
    NewUser {
        username: name.to_string(),
        email: format!("{}@example.com", name),
        password_hash: "hash".to_string(),
    }
}

fn post(author: UserId, content: &str) -> NewPost {
    NewPost {
        author,
        kind: PostKind::Text,
        content: content.to_string(),
        location: None,
    }
}

#[tokio::test]
async fn duplicate_username_conflicts_and_first_wins() {
    let svc = SocialService::start(ServiceConfig::default());

    let ann = svc.create_user(user("ann")).await.unwrap();
    let mut dup = user("ann");
    dup.email = "second@example.com".to_string();

    let err = svc.create_user(dup).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert_eq!(svc.get_user(ann).await.unwrap().username, "ann");

    svc.shutdown().await;
}

#[tokio::test]
async fn self_follow_fails_invalid_argument() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();

    let err = svc.add_follow(ann, ann).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));

    svc.shutdown().await;
}

#[tokio::test]
async fn follow_edges_resolve_both_directions() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let bob = svc.create_user(user("bob")).await.unwrap();

    svc.add_follow(ann, bob).await.unwrap();
    assert_eq!(svc.followers_of(bob).await.unwrap()[0].user, ann);
    assert_eq!(svc.following_of(ann).await.unwrap()[0].user, bob);

    svc.remove_follow(ann, bob).await.unwrap();
    assert!(svc.followers_of(bob).await.unwrap().is_empty());
    assert!(svc.following_of(ann).await.unwrap().is_empty());

    svc.shutdown().await;
}

#[tokio::test]
async fn follow_unknown_user_fails_not_found() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();

    let err = svc.add_follow(ann, UserId(99)).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));

    svc.shutdown().await;
}

#[tokio::test]
async fn concurrent_duplicate_follow_exactly_one_succeeds() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let bob = svc.create_user(user("bob")).await.unwrap();

    let (first, second) = tokio::join!(svc.add_follow(ann, bob), svc.add_follow(ann, bob));

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(CoreError::Conflict(_)))));

    svc.shutdown().await;
}

#[tokio::test]
async fn follow_notifies_followee_as_one_unit() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let bob = svc.create_user(user("bob")).await.unwrap();

    svc.add_follow(ann, bob).await.unwrap();

    let page = svc.list_notifications(bob, None, 10).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].actor, ann);
    assert_eq!(page.items[0].kind, NotificationKind::Follow);
    assert_eq!(svc.unread_count(bob).await.unwrap(), 1);

    svc.shutdown().await;
}

#[tokio::test]
async fn own_post_activity_produces_no_notification() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let p = svc.create_post(post(ann, "my own post")).await.unwrap();

    svc.add_like(ann, p).await.unwrap();
    svc.add_comment(ann, p, "nice one, me".to_string())
        .await
        .unwrap();

    assert_eq!(svc.unread_count(ann).await.unwrap(), 0);
    assert!(svc
        .list_notifications(ann, None, 10)
        .await
        .unwrap()
        .items
        .is_empty());

    svc.shutdown().await;
}

#[tokio::test]
async fn like_and_comment_notify_post_author() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let bob = svc.create_user(user("bob")).await.unwrap();
    let p = svc.create_post(post(ann, "hello")).await.unwrap();

    svc.add_like(bob, p).await.unwrap();
    svc.add_comment(bob, p, "great".to_string()).await.unwrap();

    let page = svc.list_notifications(ann, None, 10).await.unwrap();
    let kinds: Vec<_> = page.items.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Comment, NotificationKind::Like]);

    svc.shutdown().await;
}

#[tokio::test]
async fn mark_read_guards_and_idempotence() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let bob = svc.create_user(user("bob")).await.unwrap();
    svc.add_follow(ann, bob).await.unwrap();

    let id = svc.list_notifications(bob, None, 1).await.unwrap().items[0].id;

    assert!(matches!(
        svc.mark_read(id, ann).await.unwrap_err(),
        CoreError::Forbidden(_)
    ));

    svc.mark_read(id, bob).await.unwrap();
    svc.mark_read(id, bob).await.unwrap();
    assert_eq!(svc.unread_count(bob).await.unwrap(), 0);

    svc.shutdown().await;
}

#[tokio::test]
async fn tagging_twice_keeps_one_association_per_hashtag() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let p = svc.create_post(post(ann, "ship it")).await.unwrap();

    let names = vec!["#Rust".to_string(), "rust".to_string(), "go".to_string()];
    let first = svc.tag_post(p, &names).await.unwrap();
    let second = svc.tag_post(p, &names).await.unwrap();

    // "#Rust" and "rust" intern to one hashtag.
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);

    // Repeat tagging did not inflate trending counts.
    svc.quiesce().await;
    let trending = svc.trending(10).await;
    assert!(trending.iter().all(|t| t.count == 1));

    svc.shutdown().await;
}

#[tokio::test]
async fn trending_ranks_by_count_then_recency() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();

    // Three posts tagged "go", then three tagged "rust": equal counts,
    // rust's last tag is more recent.
    for _ in 0..3 {
        let p = svc.create_post(post(ann, "about go")).await.unwrap();
        svc.tag_post(p, &["go".to_string()]).await.unwrap();
    }
    for _ in 0..3 {
        let p = svc.create_post(post(ann, "about rust")).await.unwrap();
        svc.tag_post(p, &["rust".to_string()]).await.unwrap();
    }
    svc.quiesce().await;

    let rust = svc.search_hashtags("rust").await.unwrap()[0].id;
    let go = svc.search_hashtags("go").await.unwrap()[0].id;

    let ranked = svc.trending(2).await;
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].hashtag, rust);
    assert_eq!(ranked[1].hashtag, go);
    assert_eq!(ranked[0].count, 3);
    assert_eq!(ranked[1].count, 3);

    svc.shutdown().await;
}

#[tokio::test]
async fn search_finds_posts_by_prefix() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let p = svc.create_post(post(ann, "Hello, World!")).await.unwrap();
    svc.quiesce().await;

    let hits = svc.search_posts("wor").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, p);

    assert!(matches!(
        svc.search_posts("").await.unwrap_err(),
        CoreError::InvalidArgument(_)
    ));

    svc.shutdown().await;
}

#[tokio::test]
async fn search_finds_users_and_hashtags() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("annabel")).await.unwrap();
    let p = svc
        .create_post(post(ann, "learning things"))
        .await
        .unwrap();
    svc.tag_post(p, &["RustLang".to_string()]).await.unwrap();
    svc.quiesce().await;

    assert_eq!(svc.search_users("anna").await.unwrap()[0].id, ann);
    assert_eq!(svc.search_hashtags("rustl").await.unwrap().len(), 1);

    svc.shutdown().await;
}

#[tokio::test]
async fn self_like_allowed_and_engagement_counts() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let bob = svc.create_user(user("bob")).await.unwrap();
    let p = svc.create_post(post(ann, "counting")).await.unwrap();

    svc.add_like(ann, p).await.unwrap();
    svc.add_like(bob, p).await.unwrap();
    svc.add_comment(bob, p, "one".to_string()).await.unwrap();

    let engagement = svc.post_engagement(p).await.unwrap();
    assert_eq!(engagement.likes, 2);
    assert_eq!(engagement.comments, 1);

    svc.remove_like(bob, p).await.unwrap();
    assert!(matches!(
        svc.remove_like(bob, p).await.unwrap_err(),
        CoreError::NotFound { .. }
    ));

    svc.shutdown().await;
}

#[tokio::test]
async fn comments_list_in_order() {
    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let bob = svc.create_user(user("bob")).await.unwrap();
    let p = svc.create_post(post(ann, "thread")).await.unwrap();

    svc.add_comment(bob, p, "first".to_string()).await.unwrap();
    svc.add_comment(ann, p, "second".to_string()).await.unwrap();

    let contents: Vec<_> = svc
        .list_comments(p)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.content)
        .collect();
    assert_eq!(contents, vec!["first", "second"]);

    svc.shutdown().await;
}

#[tokio::test]
async fn overflowing_aggregate_queue_applies_inline() {
    let config = ServiceConfig {
        aggregate_queue: 1,
        ..Default::default()
    };
    let svc = SocialService::start(config);
    let ann = svc.create_user(user("ann")).await.unwrap();

    // Far more events than the queue holds; none may be lost.
    for i in 0..50 {
        let p = svc
            .create_post(post(ann, &format!("burst post {}", i)))
            .await
            .unwrap();
        svc.tag_post(p, &["burst".to_string()]).await.unwrap();
    }
    svc.quiesce().await;

    assert_eq!(svc.search_posts("burst").await.unwrap().len(), 50);
    let trending = svc.trending(1).await;
    assert_eq!(trending[0].count, 50);

    svc.shutdown().await;
}

#[tokio::test]
async fn zero_shard_config_is_clamped_not_fatal() {
    let config = ServiceConfig {
        shard_count: 0,
        ..Default::default()
    };
    let svc = SocialService::start(config);

    let ann = svc.create_user(user("ann")).await.unwrap();
    let bob = svc.create_user(user("bob")).await.unwrap();
    svc.add_follow(ann, bob).await.unwrap();
    assert_eq!(svc.followers_of(bob).await.unwrap()[0].user, ann);

    svc.shutdown().await;
}

#[tokio::test]
async fn snapshot_round_trips_through_store() {
    let dir = tempfile::tempdir().unwrap();

    let svc = SocialService::start(ServiceConfig::default());
    let ann = svc.create_user(user("ann")).await.unwrap();
    let bob = svc.create_user(user("bob")).await.unwrap();
    let p = svc.create_post(post(ann, "persisted post")).await.unwrap();
    svc.add_follow(bob, ann).await.unwrap();
    svc.tag_post(p, &["keep".to_string()]).await.unwrap();
    svc.quiesce().await;

    let store = SnapshotStore::open(dir.path()).unwrap();
    store.save(&svc.snapshot().await).unwrap();
    svc.shutdown().await;

    let revived = SocialService::from_snapshot(
        store.load().unwrap().unwrap(),
        ServiceConfig::default(),
    );
    assert_eq!(revived.followers_of(ann).await.unwrap()[0].user, bob);
    assert_eq!(revived.search_posts("persisted").await.unwrap()[0].id, p);
    assert_eq!(revived.trending(1).await[0].count, 1);

    // The follow notification crossed the serialization boundary too.
    assert_eq!(revived.unread_count(ann).await.unwrap(), 1);
    let page = revived.list_notifications(ann, None, 10).await.unwrap();
    assert_eq!(page.items[0].kind, NotificationKind::Follow);

    // Id allocation continues after the sequence already handed out.
    let carol = revived.create_user(user("carol")).await.unwrap();
    assert_eq!(carol, UserId(3));

    revived.shutdown().await;
}
