// src/selection/round_robin.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::balancer::Instance;
use crate::selection::cursor::CursorRegistry;
use crate::selection::strategy::Strategy;

/// Rotates through the instance list using the balancer's registered cursor.
pub struct RoundRobin {
    cursors: Arc<CursorRegistry>,
}

impl RoundRobin {
    pub fn new(cursors: Arc<CursorRegistry>) -> Self {
        Self { cursors }
    }
}

impl Strategy for RoundRobin {
    fn select(
        &self,
        balancer_id: Uuid,
        instances: &[Arc<Instance>],
        _client_addr: &str,
    ) -> Option<Arc<Instance>> {
        if instances.is_empty() {
            return None;
        }
        // The cursor wraps against the length observed at call time, so the
        // rotation stays valid across instance additions and removals.
        let cursor = self.cursors.claim(balancer_id);
        Some(instances[cursor % instances.len()].clone())
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
