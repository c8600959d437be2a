// src/selection/strategy.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::balancer::Instance;

/// A selection strategy picks one instance from a non-empty snapshot of a
/// balancer's instance list. Strategies never block and never perform I/O.
pub trait Strategy: Send + Sync {
    fn select(
        &self,
        balancer_id: Uuid,
        instances: &[Arc<Instance>],
        client_addr: &str,
    ) -> Option<Arc<Instance>>;

    fn name(&self) -> &'static str;
}
