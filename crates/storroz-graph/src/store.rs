//! Snapshot persistence.
//!
//! The whole core state serializes as one bincode blob under a fixed
//! key. The design is storage-engine agnostic; sled is the engine of
//! convenience here, and nothing above this module depends on it.

use crate::{EntityStore, NotificationFeed, SearchCatalog, SocialGraph, TrendingAggregator};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

/// The complete core state: entity tables, edge indexes, and the
/// three derived aggregates.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub entities: EntityStore,
    pub graph: SocialGraph,
    pub notifications: NotificationFeed,
    pub trending: TrendingAggregator,
    pub search: SearchCatalog,
}

pub struct SnapshotStore {
    db: Db,
}

impl SnapshotStore {
    /// Opens or creates a snapshot store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Saves the entire state under a fixed key "snapshot".
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let bytes = bincode::serialize(snapshot)?;
        self.db.insert("snapshot", bytes)?;
        self.db.flush()?;
        Ok(())
    }

    /// Loads the state from the store.
    pub fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        if let Some(bytes) = self.db.get("snapshot")? {
            let snapshot: Snapshot = bincode::deserialize(&bytes)?;
            Ok(Some(snapshot))
        } else {
            Ok(None)
        }
    }

    /// Clears the stored state.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.db.remove("snapshot")?;
        self.db.flush()?;
        Ok(())
    }
}
