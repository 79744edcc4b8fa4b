//! CLI command implementations.

use colored::Colorize;
use std::path::Path;
use storroz_core::{NewPost, NewUser, PostKind};
use storroz_graph::{Snapshot, SnapshotStore};
use storroz_service::{ServiceConfig, SocialService};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Loads a persisted snapshot, failing with a hint if none exists.
fn load_snapshot(db: &Path) -> Result<Snapshot> {
    let store = SnapshotStore::open(db)?;
    store.load()?.ok_or_else(|| {
        format!(
            "no snapshot at {}, run {} first",
            db.display(),
            "storroz seed".cyan()
        )
        .into()
    })
}

/// Seeds a small demo graph and persists it.
pub async fn seed(db: &Path) -> Result<()> {
    println!("{}", "Seeding demo graph...".cyan());

    let svc = SocialService::start(ServiceConfig::default());

    let mut users = Vec::new();
    for name in ["ann", "bob", "carol", "dave"] {
        users.push(
            svc.create_user(NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: "demo".to_string(),
            })
            .await?,
        );
    }

    // Everyone follows ann; ann follows bob back.
    for &user in &users[1..] {
        svc.add_follow(user, users[0]).await?;
    }
    svc.add_follow(users[0], users[1]).await?;

    let posts = [
        (users[0], "Hello, world! First post on storroz", vec!["hello", "storroz"]),
        (users[1], "Learning rust one borrow at a time", vec!["rust", "learning"]),
        (users[2], "Graphs all the way down", vec!["graphs", "rust"]),
        (users[3], "Trending things are trending", vec!["trending"]),
    ];
    for (author, content, tags) in posts {
        let post = svc
            .create_post(NewPost {
                author,
                kind: PostKind::Text,
                content: content.to_string(),
                location: None,
            })
            .await?;
        let names: Vec<String> = tags.into_iter().map(str::to_string).collect();
        svc.tag_post(post, &names).await?;
        for &liker in &users {
            if liker != author {
                svc.add_like(liker, post).await?;
            }
        }
    }

    svc.quiesce().await;
    let snapshot = svc.snapshot().await;
    SnapshotStore::open(db)?.save(&snapshot)?;

    println!(
        "{} Seeded {} users, {} posts, {} follow edges into {}",
        "✓".green(),
        snapshot.entities.user_count().to_string().cyan(),
        snapshot.entities.post_count().to_string().cyan(),
        snapshot.graph.follow_count().to_string().cyan(),
        db.display()
    );

    svc.shutdown().await;
    Ok(())
}

/// Searches users, posts, or hashtags in a persisted snapshot.
pub async fn search(db: &Path, kind: &str, query: &str, limit: usize) -> Result<()> {
    let svc = SocialService::from_snapshot(load_snapshot(db)?, ServiceConfig::default());

    match kind {
        "users" => {
            for hit in svc.search_users(query).await?.into_iter().take(limit) {
                let user = svc.get_user(hit.id).await?;
                println!("{}  {}", user.id.to_string().cyan(), user.username);
            }
        }
        "posts" => {
            for hit in svc.search_posts(query).await?.into_iter().take(limit) {
                let post = svc.get_post(hit.id).await?;
                println!("{}  {}", post.id.to_string().cyan(), post.content);
            }
        }
        "hashtags" => {
            for hit in svc.search_hashtags(query).await?.into_iter().take(limit) {
                println!("{}", hit.id.to_string().cyan());
            }
        }
        other => return Err(format!("unknown search kind '{}'", other).into()),
    }

    svc.shutdown().await;
    Ok(())
}

/// Prints the top trending hashtags from a persisted snapshot.
pub async fn trending(db: &Path, k: usize) -> Result<()> {
    let snapshot = load_snapshot(db)?;
    let svc = SocialService::from_snapshot(snapshot, ServiceConfig::default());

    let ranked = svc.trending(k).await;
    if ranked.is_empty() {
        println!("{}", "No hashtag activity in the current window".yellow());
    }
    for (rank, entry) in ranked.iter().enumerate() {
        println!(
            "{:>3}. hashtag {}  {} tags  (last {})",
            rank + 1,
            entry.hashtag.to_string().cyan(),
            entry.count.to_string().green(),
            entry.last_tagged_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    svc.shutdown().await;
    Ok(())
}

/// Prints counts for every table and index.
pub async fn stats(db: &Path) -> Result<()> {
    let snapshot = load_snapshot(db)?;
    let (user_tokens, post_tokens, hashtag_tokens) = snapshot.search.token_counts();

    let stats = serde_json::json!({
        "users": snapshot.entities.user_count(),
        "posts": snapshot.entities.post_count(),
        "hashtags": snapshot.entities.hashtag_count(),
        "followEdges": snapshot.graph.follow_count(),
        "likeEdges": snapshot.graph.like_count(),
        "comments": snapshot.graph.comment_count(),
        "notifications": snapshot.notifications.len(),
        "trackedHashtags": snapshot.trending.tracked_count(),
        "searchTokens": {
            "users": user_tokens,
            "posts": post_tokens,
            "hashtags": hashtag_tokens,
        },
    });
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
