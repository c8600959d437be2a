// src/balancer/model.rs
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Selection algorithm attached to a load balancer.
///
/// Unrecognized strings are preserved in `Other` rather than rejected; the
/// selection engine treats them as a first-instance fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Algorithm {
    RoundRobin,
    LeastConn,
    IpHash,
    Other(String),
}

impl Algorithm {
    pub fn as_str(&self) -> &str {
        match self {
            Algorithm::RoundRobin => "round_robin",
            Algorithm::LeastConn => "least_conn",
            Algorithm::IpHash => "ip_hash",
            Algorithm::Other(name) => name,
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::RoundRobin
    }
}

impl From<&str> for Algorithm {
    fn from(value: &str) -> Self {
        match value {
            "round_robin" => Algorithm::RoundRobin,
            "least_conn" => Algorithm::LeastConn,
            "ip_hash" => Algorithm::IpHash,
            other => Algorithm::Other(other.to_string()),
        }
    }
}

impl From<String> for Algorithm {
    fn from(value: String) -> Self {
        Algorithm::from(value.as_str())
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single backend endpoint a load balancer may route to.
///
/// `active_connections` is owned by an external connection tracker; the
/// selection engine only reads it. `weight` is stored and reported but no
/// implemented algorithm consults it.
#[derive(Debug)]
pub struct Instance {
    pub name: String,
    pub url: String,
    pub weight: u32,
    active_connections: AtomicUsize,
}

impl Instance {
    pub fn new(name: impl Into<String>, url: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            weight,
            active_connections: AtomicUsize::new(0),
        }
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn increment_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Saturating decrement; the count never goes below zero even if the
    /// tracker reports a close it never reported an open for.
    pub fn decrement_connections(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn snapshot(&self) -> InstanceView {
        InstanceView {
            name: self.name.clone(),
            url: self.url.clone(),
            weight: self.weight,
            active_connections: self.active_connections(),
        }
    }
}

/// Serializable point-in-time view of an instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceView {
    pub name: String,
    pub url: String,
    pub weight: u32,
    pub active_connections: usize,
}

/// A named configuration pairing a selection algorithm with an ordered set
/// of backend instances.
///
/// The instance list and algorithm are swapped wholesale on mutation so the
/// selection path always reads a consistent snapshot without taking a lock.
#[derive(Debug)]
pub struct LoadBalancer {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    algorithm: ArcSwap<Algorithm>,
    instances: ArcSwap<Vec<Arc<Instance>>>,
}

impl LoadBalancer {
    pub fn new(name: impl Into<String>, algorithm: Algorithm, instances: Vec<Instance>) -> Self {
        let instances = instances.into_iter().map(Arc::new).collect::<Vec<_>>();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            algorithm: ArcSwap::from_pointee(algorithm),
            instances: ArcSwap::from_pointee(instances),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm.load().as_ref().clone()
    }

    pub fn set_algorithm(&self, algorithm: Algorithm) {
        self.algorithm.store(Arc::new(algorithm));
    }

    /// Snapshot of the current instance list.
    pub fn instances(&self) -> Arc<Vec<Arc<Instance>>> {
        self.instances.load_full()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.load().len()
    }

    pub fn add_instance(&self, instance: Instance) -> Arc<Instance> {
        let instance = Arc::new(instance);
        self.instances.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(instance.clone());
            next
        });
        instance
    }

    /// Removes the named instance. Returns false when no instance matched.
    pub fn remove_instance(&self, instance_name: &str) -> bool {
        let previous = self.instances.rcu(|current| {
            current
                .iter()
                .filter(|i| i.name != instance_name)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|i| i.name == instance_name)
    }

    pub fn view(&self) -> BalancerView {
        BalancerView {
            id: self.id,
            name: self.name.clone(),
            algorithm: self.algorithm().as_str().to_string(),
            created_at: self.created_at,
            instances: self.instances().iter().map(|i| i.snapshot()).collect(),
        }
    }
}

/// Serializable view of a load balancer record.
#[derive(Debug, Clone, Serialize)]
pub struct BalancerView {
    pub id: Uuid,
    pub name: String,
    pub algorithm: String,
    pub created_at: DateTime<Utc>,
    pub instances: Vec<InstanceView>,
}
