// src/selection/mod.rs
mod cursor;
mod engine;
mod ip_hash;
mod least_connections;
mod round_robin;
mod strategy;

pub use cursor::CursorRegistry;
pub use engine::SelectionEngine;
pub use ip_hash::IpHash;
pub use least_connections::LeastConnections;
pub use round_robin::RoundRobin;
pub use strategy::Strategy;
