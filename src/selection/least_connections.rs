// src/selection/least_connections.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::balancer::Instance;
use crate::selection::strategy::Strategy;

/// Picks the instance with the fewest active connections. Ties go to the
/// earliest instance in list order, so repeated calls against unchanged
/// counts are deterministic.
pub struct LeastConnections;

impl Strategy for LeastConnections {
    fn select(
        &self,
        _balancer_id: Uuid,
        instances: &[Arc<Instance>],
        _client_addr: &str,
    ) -> Option<Arc<Instance>> {
        // Each count is a relaxed read; the counts may move while we scan,
        // which is acceptable for a best-effort load signal.
        instances
            .iter()
            .min_by_key(|instance| instance.active_connections())
            .cloned()
    }

    fn name(&self) -> &'static str {
        "least_conn"
    }
}
