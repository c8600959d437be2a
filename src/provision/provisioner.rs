// src/provision/provisioner.rs
use std::sync::Arc;

use tracing::info;
use url::Url;

use crate::balancer::{Algorithm, Instance, LoadBalancer};
use crate::config::ProvisioningConfig;
use crate::directive::Directive;
use crate::metrics::MetricsCollector;
use crate::provision::store::BalancerStore;
use crate::selection::CursorRegistry;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("directive is missing a load balancer name")]
    MissingName,

    #[error("directive for '{0}' has no usable instances")]
    NoInstances(String),

    #[error("load balancer '{0}' already exists")]
    AlreadyExists(String),

    #[error("load balancer '{0}' not found")]
    NotFound(String),

    #[error("instance '{instance}' not found on '{balancer}'")]
    InstanceNotFound { balancer: String, instance: String },

    #[error("invalid instance url '{url}': {source}")]
    InvalidInstanceUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("instance count {requested} exceeds the configured maximum of {max}")]
    TooManyInstances { requested: usize, max: usize },
}

/// Turns validated directives into load balancer records and applies the
/// external mutations a record admits: instance add/remove and algorithm
/// changes. The correctness checks the directive parser defers land here.
pub struct Provisioner {
    store: Arc<BalancerStore>,
    cursors: Arc<CursorRegistry>,
    config: ProvisioningConfig,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Provisioner {
    pub fn new(
        store: Arc<BalancerStore>,
        cursors: Arc<CursorRegistry>,
        config: ProvisioningConfig,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            store,
            cursors,
            config,
            metrics,
        }
    }

    /// Creates a load balancer from a parsed directive.
    pub fn apply(&self, directive: Directive) -> Result<Arc<LoadBalancer>, ProvisionError> {
        let result = self.apply_inner(directive);

        if let Some(metrics) = &self.metrics {
            let outcome = if result.is_ok() { "created" } else { "rejected" };
            metrics.record_provision(outcome);
            metrics.update_inventory(self.store.len(), self.store.instance_total());
        }

        result
    }

    fn apply_inner(&self, directive: Directive) -> Result<Arc<LoadBalancer>, ProvisionError> {
        let name = directive
            .criteria
            .name
            .filter(|n| !n.is_empty())
            .ok_or(ProvisionError::MissingName)?;

        let specs = directive.parameters.instances;
        if specs.is_empty() {
            return Err(ProvisionError::NoInstances(name));
        }
        if specs.len() > self.config.max_instances {
            return Err(ProvisionError::TooManyInstances {
                requested: specs.len(),
                max: self.config.max_instances,
            });
        }

        for spec in &specs {
            validate_url(&spec.url)?;
        }

        let instances = specs
            .into_iter()
            .map(|spec| Instance::new(spec.name, spec.url, spec.weight))
            .collect();
        let balancer = Arc::new(LoadBalancer::new(
            name.clone(),
            directive.parameters.algorithm,
            instances,
        ));

        if !self.store.insert(balancer.clone()) {
            return Err(ProvisionError::AlreadyExists(name));
        }

        info!(
            balancer = %balancer.name,
            id = %balancer.id,
            algorithm = %balancer.algorithm(),
            instances = balancer.instance_count(),
            "provisioned load balancer"
        );
        Ok(balancer)
    }

    pub fn get(&self, name: &str) -> Option<Arc<LoadBalancer>> {
        self.store.get(name)
    }

    pub fn list(&self) -> Vec<Arc<LoadBalancer>> {
        self.store.all()
    }

    /// Deletes a record and its round-robin cursor. A balancer recreated
    /// under the same name starts rotating from scratch.
    pub fn delete(&self, name: &str) -> Result<(), ProvisionError> {
        let balancer = self
            .store
            .remove(name)
            .ok_or_else(|| ProvisionError::NotFound(name.to_string()))?;
        self.cursors.forget(&balancer.id);

        if let Some(metrics) = &self.metrics {
            metrics.record_provision("deleted");
            metrics.update_inventory(self.store.len(), self.store.instance_total());
        }

        info!(balancer = %balancer.name, id = %balancer.id, "deleted load balancer");
        Ok(())
    }

    pub fn add_instance(
        &self,
        name: &str,
        url: String,
        instance_name: Option<String>,
        weight: Option<u32>,
    ) -> Result<Arc<Instance>, ProvisionError> {
        validate_url(&url)?;
        let balancer = self
            .store
            .get(name)
            .ok_or_else(|| ProvisionError::NotFound(name.to_string()))?;

        let instance_name =
            instance_name.unwrap_or_else(|| format!("instance{}", balancer.instance_count() + 1));
        let instance =
            balancer.add_instance(Instance::new(instance_name, url, weight.unwrap_or(1)));

        if let Some(metrics) = &self.metrics {
            metrics.update_inventory(self.store.len(), self.store.instance_total());
        }

        info!(balancer = %balancer.name, instance = %instance.name, "added instance");
        Ok(instance)
    }

    pub fn remove_instance(&self, name: &str, instance_name: &str) -> Result<(), ProvisionError> {
        let balancer = self
            .store
            .get(name)
            .ok_or_else(|| ProvisionError::NotFound(name.to_string()))?;

        if !balancer.remove_instance(instance_name) {
            return Err(ProvisionError::InstanceNotFound {
                balancer: name.to_string(),
                instance: instance_name.to_string(),
            });
        }

        if let Some(metrics) = &self.metrics {
            metrics.update_inventory(self.store.len(), self.store.instance_total());
        }

        info!(balancer = %balancer.name, instance = %instance_name, "removed instance");
        Ok(())
    }

    pub fn set_algorithm(&self, name: &str, algorithm: Algorithm) -> Result<(), ProvisionError> {
        let balancer = self
            .store
            .get(name)
            .ok_or_else(|| ProvisionError::NotFound(name.to_string()))?;

        info!(balancer = %balancer.name, algorithm = %algorithm, "changed algorithm");
        balancer.set_algorithm(algorithm);
        Ok(())
    }
}

fn validate_url(url: &str) -> Result<(), ProvisionError> {
    Url::parse(url).map_err(|source| ProvisionError::InvalidInstanceUrl {
        url: url.to_string(),
        source,
    })?;
    Ok(())
}
