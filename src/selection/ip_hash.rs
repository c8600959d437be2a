// src/selection/ip_hash.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::balancer::Instance;
use crate::selection::strategy::Strategy;

/// Maps a client address onto a fixed instance by hashing the address bytes.
///
/// The hash is taken modulo the current list length, so the address-to-
/// instance mapping shifts when instances are added or removed. The same
/// address always lands on the same instance for an unchanged list.
pub struct IpHash;

fn hash_addr(client_addr: &str) -> usize {
    client_addr
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_add(usize::from(b)))
}

impl Strategy for IpHash {
    fn select(
        &self,
        _balancer_id: Uuid,
        instances: &[Arc<Instance>],
        client_addr: &str,
    ) -> Option<Arc<Instance>> {
        if instances.is_empty() {
            return None;
        }
        Some(instances[hash_addr(client_addr) % instances.len()].clone())
    }

    fn name(&self) -> &'static str {
        "ip_hash"
    }
}
