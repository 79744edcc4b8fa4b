//! Storroz Service - the concurrency boundary over the core
//!
//! This crate wires the entity store, relationship graph, and the
//! three subscribers into one explicitly constructed service. It owns
//! every lock:
//!
//! - Mutations serialize per affected entity id through a table of
//!   shard locks, acquired in ascending shard order so two-lock
//!   operations cannot deadlock. Acquisition times out and surfaces
//!   as a retryable `Busy`.
//! - Notification fan-out runs synchronously inside the edge commit:
//!   no caller observes an edge without its notification, or a
//!   notification without its edge.
//! - Trending and search updates flow through a bounded queue to a
//!   worker task; when the queue is full the update applies inline
//!   instead of being dropped.
//!
//! Lifecycle is explicit: `SocialService::start` constructs,
//! `shutdown` drains the queue and stops the worker.

mod config;
mod service;

pub use config::ServiceConfig;
pub use service::SocialService;
