// src/selection/engine.rs
use std::sync::Arc;

use tracing::{debug, warn};

use crate::balancer::{Algorithm, Instance, LoadBalancer};
use crate::metrics::MetricsCollector;
use crate::selection::cursor::CursorRegistry;
use crate::selection::ip_hash::IpHash;
use crate::selection::least_connections::LeastConnections;
use crate::selection::round_robin::RoundRobin;
use crate::selection::strategy::Strategy;

/// Chooses the backend instance that should receive the next request.
///
/// The engine is invoked once per inbound request for the lifetime of a
/// balancer. It only reads the balancer record; its sole observable side
/// effect is advancing the round-robin cursor held by the injected registry.
pub struct SelectionEngine {
    round_robin: RoundRobin,
    least_conn: LeastConnections,
    ip_hash: IpHash,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SelectionEngine {
    pub fn new(cursors: Arc<CursorRegistry>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self {
            round_robin: RoundRobin::new(cursors),
            least_conn: LeastConnections,
            ip_hash: IpHash,
            metrics,
        }
    }

    /// Returns the selected instance, or `None` when the balancer has no
    /// instances to offer. Callers surface `None` as "no available backend";
    /// it is never a fault.
    pub fn pick_instance(
        &self,
        balancer: &LoadBalancer,
        client_addr: &str,
    ) -> Option<Arc<Instance>> {
        let instances = balancer.instances();
        if instances.is_empty() {
            debug!(balancer = %balancer.name, "no instances to select from");
            if let Some(metrics) = &self.metrics {
                metrics.record_unavailable(&balancer.name);
            }
            return None;
        }

        let algorithm = balancer.algorithm();
        let selected = match &algorithm {
            Algorithm::RoundRobin => {
                self.round_robin.select(balancer.id, &instances, client_addr)
            }
            Algorithm::LeastConn => self.least_conn.select(balancer.id, &instances, client_addr),
            Algorithm::IpHash => self.ip_hash.select(balancer.id, &instances, client_addr),
            Algorithm::Other(name) => {
                // Documented fallback, not a failure: an unrecognized
                // algorithm deterministically routes to the first instance
                // and leaves the cursor untouched.
                warn!(
                    balancer = %balancer.name,
                    algorithm = %name,
                    "unrecognized algorithm, falling back to first instance"
                );
                instances.first().cloned()
            }
        };

        if let Some(instance) = &selected {
            debug!(
                balancer = %balancer.name,
                algorithm = %algorithm,
                instance = %instance.name,
                "selected instance"
            );
            if let Some(metrics) = &self.metrics {
                metrics.record_selection(&balancer.name, algorithm.as_str());
            }
        }

        selected
    }
}
