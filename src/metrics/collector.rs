// src/metrics/collector.rs
use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(%e, "failed to encode metrics");
        }
        buffer
    }
}

pub struct MetricsCollector {
    // Selection metrics
    pub selections_total: IntCounterVec,
    pub selection_unavailable_total: IntCounterVec,

    // Intake and provisioning metrics
    pub directives_parsed_total: IntCounter,
    pub provision_total: IntCounterVec,

    // Inventory gauges
    pub balancers: IntGauge,
    pub instances: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let selections_total = IntCounterVec::new(
            Opts::new("lb_selections_total", "Total instance selections"),
            &["balancer", "algorithm"],
        )?;
        registry.register(Box::new(selections_total.clone()))?;

        let selection_unavailable_total = IntCounterVec::new(
            Opts::new(
                "lb_selection_unavailable_total",
                "Selections that found no available instance",
            ),
            &["balancer"],
        )?;
        registry.register(Box::new(selection_unavailable_total.clone()))?;

        let directives_parsed_total =
            IntCounter::new("lb_directives_parsed_total", "Total directive texts parsed")?;
        registry.register(Box::new(directives_parsed_total.clone()))?;

        let provision_total = IntCounterVec::new(
            Opts::new("lb_provision_total", "Provisioning operations by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(provision_total.clone()))?;

        let balancers = IntGauge::new("lb_balancers", "Number of load balancers")?;
        registry.register(Box::new(balancers.clone()))?;

        let instances = IntGauge::new("lb_instances", "Total instances across balancers")?;
        registry.register(Box::new(instances.clone()))?;

        Ok(Self {
            selections_total,
            selection_unavailable_total,
            directives_parsed_total,
            provision_total,
            balancers,
            instances,
        })
    }

    pub fn record_selection(&self, balancer: &str, algorithm: &str) {
        self.selections_total
            .with_label_values(&[balancer, algorithm])
            .inc();
    }

    pub fn record_unavailable(&self, balancer: &str) {
        self.selection_unavailable_total
            .with_label_values(&[balancer])
            .inc();
    }

    pub fn record_directive(&self) {
        self.directives_parsed_total.inc();
    }

    pub fn record_provision(&self, outcome: &str) {
        self.provision_total.with_label_values(&[outcome]).inc();
    }

    pub fn update_inventory(&self, balancers: usize, instances: usize) {
        self.balancers.set(balancers as i64);
        self.instances.set(instances as i64);
    }
}
