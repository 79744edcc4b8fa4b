//! Service configuration.

use std::time::Duration;

/// Tuning knobs for the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Number of shard locks mutations serialize through. Entity ids
    /// map to shards by modulo; ids on distinct shards mutate
    /// concurrently. A value of `0` is treated as `1`.
    pub shard_count: usize,
    /// How long a shard-lock acquisition may wait before the
    /// operation fails `Busy`.
    pub lock_timeout: Duration,
    /// Capacity of the queue feeding the trending/search worker.
    /// When full, updates apply inline on the caller instead.
    pub aggregate_queue: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            shard_count: 64,
            lock_timeout: Duration::from_millis(500),
            aggregate_queue: 256,
        }
    }
}
