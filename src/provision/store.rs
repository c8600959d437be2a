// src/provision/store.rs
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::balancer::LoadBalancer;

/// In-memory home of load balancer records, keyed by name.
///
/// Durable persistence is deliberately absent; records live for the process
/// lifetime or until explicitly deleted.
#[derive(Default)]
pub struct BalancerStore {
    balancers: DashMap<String, Arc<LoadBalancer>>,
}

impl BalancerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the record unless its name is already taken.
    pub fn insert(&self, balancer: Arc<LoadBalancer>) -> bool {
        match self.balancers.entry(balancer.name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(balancer);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<LoadBalancer>> {
        self.balancers.get(name).map(|b| b.clone())
    }

    pub fn remove(&self, name: &str) -> Option<Arc<LoadBalancer>> {
        self.balancers.remove(name).map(|(_, balancer)| balancer)
    }

    /// All records, sorted by name for stable listings.
    pub fn all(&self) -> Vec<Arc<LoadBalancer>> {
        let mut balancers: Vec<_> = self
            .balancers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        balancers.sort_by(|a, b| a.name.cmp(&b.name));
        balancers
    }

    pub fn len(&self) -> usize {
        self.balancers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balancers.is_empty()
    }

    /// Total instances across every record.
    pub fn instance_total(&self) -> usize {
        self.balancers
            .iter()
            .map(|entry| entry.value().instance_count())
            .sum()
    }
}
