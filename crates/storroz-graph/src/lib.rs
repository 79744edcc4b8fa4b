//! Storroz Graph - Social relationship management
//!
//! This crate holds the stateful heart of Storroz: the entity store,
//! the relationship graph, and the three subscribers that derive
//! state from graph events (notification fan-out, trending
//! aggregation, text search).
//!
//! # Architecture
//!
//! Everything here is a plain synchronous data structure. Each
//! structure enforces its own invariants (uniqueness, no self-follow,
//! at most one edge per pair) but knows nothing about locking; the
//! concurrency boundary lives in `storroz-service`, which owns these
//! structures behind locks and wires graph events to the subscribers.
//!
//! # Example
//!
//! ```no_run
//! use storroz_graph::{EntityStore, SocialGraph};
//! use storroz_core::{NewUser, UserId};
//! use chrono::Utc;
//!
//! let mut entities = EntityStore::new();
//! let mut graph = SocialGraph::new();
//!
//! let ann = entities.create_user(
//!     NewUser {
//!         username: "ann".into(),
//!         email: "ann@example.com".into(),
//!         password_hash: "…".into(),
//!     },
//!     Utc::now(),
//! ).unwrap();
//!
//! // Edges resolve in both directions.
//! let bob = UserId(2);
//! graph.add_follow(ann, bob, Utc::now()).unwrap();
//! assert!(graph.is_following(ann, bob));
//! ```

mod entities;
mod event;
mod graph;
mod notification;
mod search;
mod store;
mod trending;

pub use entities::EntityStore;
pub use event::GraphEvent;
pub use graph::{Engagement, FollowEntry, SocialGraph};
pub use notification::{NotificationFeed, NotificationPage};
pub use search::{SearchCatalog, SearchHit};
pub use store::{Snapshot, SnapshotStore, StoreError};
pub use trending::{TrendingAggregator, TrendingHashtag};
