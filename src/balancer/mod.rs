// src/balancer/mod.rs
mod model;

pub use model::{Algorithm, BalancerView, Instance, InstanceView, LoadBalancer};
