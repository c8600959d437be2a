// src/selection/cursor.rs
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use uuid::Uuid;

/// Registry of round-robin cursors, one per load balancer.
///
/// A cursor is created lazily on the first claim for a balancer id and lives
/// until the balancer is deleted. Claims are per-balancer atomic increments;
/// two balancers never contend on the same counter.
#[derive(Debug, Default)]
pub struct CursorRegistry {
    cursors: DashMap<Uuid, AtomicUsize>,
}

impl CursorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the next cursor value for the given balancer. Each concurrent
    /// caller receives a distinct, monotonically increasing value.
    pub fn claim(&self, balancer_id: Uuid) -> usize {
        if let Some(counter) = self.cursors.get(&balancer_id) {
            return counter.fetch_add(1, Ordering::Relaxed);
        }
        self.cursors
            .entry(balancer_id)
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
    }

    /// Drops the cursor for a deleted balancer. A recreated balancer starts
    /// rotating from the beginning again.
    pub fn forget(&self, balancer_id: &Uuid) {
        self.cursors.remove(balancer_id);
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}
