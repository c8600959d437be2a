// src/config/models.rs
use std::net::SocketAddr;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub provisioning: ProvisioningConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Upper bound on instances a single directive may synthesize.
    pub max_instances: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            metrics: MetricsConfig::default(),
            provisioning: ProvisioningConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9100,
            path: "/metrics".to_string(),
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self { max_instances: 16 }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        ensure!(
            self.metrics.path.starts_with('/'),
            "metrics path must start with '/': {}",
            self.metrics.path
        );
        ensure!(
            self.provisioning.max_instances > 0,
            "provisioning.max_instances must be at least 1"
        );
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address: {}", self.server.listen_addr))
    }
}
